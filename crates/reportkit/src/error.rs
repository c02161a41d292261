use std::fmt::{Display, Formatter};

use crate::models::Operator;
use crate::query::{BuildFailure, FilterId};

/// Failure reported by the execution or persistence backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceError {
    message: String,
}

impl ServiceError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.message.trim().is_empty() {
            f.write_str("the report service returned an error")
        } else {
            f.write_str(&self.message)
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<anyhow::Error> for ServiceError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(format!("{error:#}"))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportError {
    Validation(BuildFailure),
    Service(ServiceError),
    UnknownFilter(FilterId),
    NoTableSelected,
    NoCurrentQuery,
    NotCrosstab,
    QueryNotLoadable {
        database: String,
        table: String,
        current_database: String,
        current_table: String,
    },
    MissingSavedQueryName,
    OperatorNotAllowed {
        column: String,
        operator: Operator,
    },
}

impl ReportError {
    /// Stable snake_case key used in CLI envelopes and logs.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::Service(_) => "service_error",
            Self::UnknownFilter(_) => "unknown_filter",
            Self::NoTableSelected => "no_table_selected",
            Self::NoCurrentQuery => "no_current_query",
            Self::NotCrosstab => "not_crosstab",
            Self::QueryNotLoadable { .. } => "query_not_loadable",
            Self::MissingSavedQueryName => "missing_saved_query_name",
            Self::OperatorNotAllowed { .. } => "operator_not_allowed",
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::QueryNotLoadable { .. }
                | Self::MissingSavedQueryName
                | Self::OperatorNotAllowed { .. }
        )
    }
}

impl Display for ReportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(failure) => write!(f, "{failure}"),
            Self::Service(error) => write!(f, "{error}"),
            Self::UnknownFilter(id) => write!(f, "no filter with id {id}"),
            Self::NoTableSelected => f.write_str("no database table is selected"),
            Self::NoCurrentQuery => f.write_str("no query has been run yet"),
            Self::NotCrosstab => f.write_str("drill-down requires a crosstab query"),
            Self::QueryNotLoadable {
                database,
                table,
                current_database,
                current_table,
            } => write!(
                f,
                "query targets {database}.{table} but {current_database}.{current_table} is selected"
            ),
            Self::MissingSavedQueryName => f.write_str("Please specify a name for this query."),
            Self::OperatorNotAllowed { column, operator } => write!(
                f,
                "operator `{}` is not available for column `{column}`",
                operator.label()
            ),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(failure) => Some(failure),
            Self::Service(error) => Some(error),
            _ => None,
        }
    }
}

impl From<BuildFailure> for ReportError {
    fn from(failure: BuildFailure) -> Self {
        Self::Validation(failure)
    }
}

impl From<ServiceError> for ReportError {
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
