#![forbid(unsafe_code)]

pub mod cli;
pub mod config;
pub mod drilldown;
pub mod error;
pub mod logic;
pub mod models;
pub mod operators;
pub mod query;
pub mod saved;
pub mod service;
pub mod session;
pub mod sqlite;
pub mod utils;

pub use cli::app::{Cli, Command};
pub use error::{ReportError, ReportResult, ServiceError};
pub use query::{BoundQuery, BuildContext, BuildFailure, QueryDraft, QueryProblem};
pub use session::{ReportSession, SessionConfig};
