pub mod draft;
mod equality;
pub mod validate;

pub use draft::{BoundQuery, BuildContext, FilterEntry, FilterId, QueryDraft};
pub use validate::{BuildFailure, ColumnRole, QueryProblem, validate_query};
