//! Contract with the backend that executes and persists queries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ServiceError;
use crate::models::{ListOption, Query, SavedQuery, TableMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "OK")]
    Ok,
    Error,
}

/// Grid column returned with query results. `field` keys into each row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultColumn {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub field: String,
}

impl ResultColumn {
    #[must_use]
    pub fn new(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            id: field.clone(),
            name: field.clone(),
            field,
        }
    }
}

pub type ResultRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunQueryResponse {
    pub status: ResponseStatus,

    #[serde(default)]
    pub results: Vec<ResultRow>,

    #[serde(default)]
    pub columns: Vec<ResultColumn>,

    #[serde(default)]
    pub message: String,
}

impl RunQueryResponse {
    #[must_use]
    pub fn ok(results: Vec<ResultRow>, columns: Vec<ResultColumn>) -> Self {
        let message = format!("{} rows", results.len());
        Self {
            status: ResponseStatus::Ok,
            results,
            columns,
            message,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            results: Vec::new(),
            columns: Vec::new(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == ResponseStatus::Ok
    }

    /// Turns an `Error` status into a [`ServiceError`] carrying the message.
    pub fn into_result(self) -> Result<Self, ServiceError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(ServiceError::new(self.message))
        }
    }
}

/// Query execution and metadata lookups. Implementations perform blocking
/// calls.
pub trait ReportService {
    fn table_metadata(&self, database: &str, table: &str) -> Result<TableMetadata, ServiceError>;

    fn distinct_values(
        &self,
        database: &str,
        table: &str,
        column: &str,
    ) -> Result<Vec<ListOption>, ServiceError>;

    fn run_query(&self, query: &Query) -> Result<RunQueryResponse, ServiceError>;

    /// Runs the query without paging and returns the rows as CSV bytes.
    fn export_query(&self, query: &Query) -> Result<Vec<u8>, ServiceError>;
}

/// Persistence for named queries. Listings are scoped to one database and
/// to what the current user may see.
pub trait SavedQueryStore {
    fn list(&self, database: &str) -> Result<Vec<SavedQuery>, ServiceError>;

    fn get(&self, id: &str) -> Result<Option<SavedQuery>, ServiceError>;

    /// Stores a new query and returns it with its assigned id.
    fn create(&self, saved: &SavedQuery) -> Result<SavedQuery, ServiceError>;

    fn update(&self, saved: &SavedQuery) -> Result<SavedQuery, ServiceError>;

    fn delete(&self, id: &str) -> Result<(), ServiceError>;
}
