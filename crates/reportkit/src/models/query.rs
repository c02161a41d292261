use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::filter::Filter;

pub const DEFAULT_PAGE_SIZE: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum QueryType {
    #[default]
    Raw,
    Crosstab,
}

impl Display for QueryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Raw => f.write_str("Raw"),
            Self::Crosstab => f.write_str("Crosstab"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
pub enum FilterLogicType {
    #[default]
    MatchAll,
    MatchAny,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CrosstabFunction {
    Count,
    Sum,
    Average,
    Min,
    Max,
    StdDevSample,
    StdDevPop,
}

impl CrosstabFunction {
    pub const ALL: [Self; 7] = [
        Self::Count,
        Self::Sum,
        Self::Average,
        Self::Min,
        Self::Max,
        Self::StdDevSample,
        Self::StdDevPop,
    ];

    /// Every function except Count aggregates a numeric subject column.
    #[must_use]
    pub const fn needs_numeric_subject(self) -> bool {
        !matches!(self, Self::Count)
    }
}

/// Subject variable meaning "all matching records" for Count.
pub const ALL_RECORDS_SUBJECT: &str = "*";

/// A detached query description, as posted to the execution service and
/// stored with saved queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(rename = "db", alias = "database")]
    pub database: String,
    pub table: String,
    pub query_type: QueryType,

    #[serde(default)]
    pub filters: Vec<Filter>,

    #[serde(default)]
    pub filter_logic_type: FilterLogicType,

    #[serde(default)]
    pub filter_logic_string: String,

    #[serde(default)]
    pub output_columns: Vec<String>,

    #[serde(default)]
    pub order_by: Vec<String>,

    #[serde(default)]
    pub group_by: Vec<String>,

    #[serde(default = "default_limit")]
    pub limit: u64,

    #[serde(default)]
    pub offset: u64,

    #[serde(default, with = "super::blank")]
    #[schemars(with = "String")]
    pub crosstab_function: Option<CrosstabFunction>,

    #[serde(default)]
    pub crosstab_subject_var: String,

    #[serde(default)]
    pub crosstab_row_var: String,

    #[serde(default)]
    pub crosstab_col_var: String,

    #[serde(rename = "isBoundToUI", default)]
    pub is_bound_to_ui: bool,
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Query {
    /// An empty raw query against `database.table`.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
            query_type: QueryType::Raw,
            filters: Vec::new(),
            filter_logic_type: FilterLogicType::MatchAll,
            filter_logic_string: String::new(),
            output_columns: Vec::new(),
            order_by: Vec::new(),
            group_by: Vec::new(),
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            crosstab_function: None,
            crosstab_subject_var: String::new(),
            crosstab_row_var: String::new(),
            crosstab_col_var: String::new(),
            is_bound_to_ui: false,
        }
    }

    #[must_use]
    pub fn targets(&self, database: &str, table: &str) -> bool {
        self.database == database && self.table == table
    }

    #[must_use]
    pub fn is_crosstab(&self) -> bool {
        self.query_type == QueryType::Crosstab
    }
}

#[must_use]
pub fn query_json_schema() -> Value {
    let schema = schemars::schema_for!(Query);
    match serde_json::to_value(schema) {
        Ok(value) => value,
        Err(error) => {
            panic!("failed to serialize generated query schema: {error}");
        }
    }
}
