mod blank;
pub mod column;
pub mod envelope;
pub mod filter;
pub mod query;
pub mod saved_query;

pub use column::{ColumnDescriptor, DataCategory, DataType, ListOption, TableMetadata};
pub use envelope::{
    COMMAND_ENVELOPE_SCHEMA_VERSION, CommandEnvelope, CommandEnvelopeFailure, CommandEnvelopeMeta,
};
pub use filter::{Filter, FilterIssue, FilterValue, Operator};
pub use query::{
    ALL_RECORDS_SUBJECT, CrosstabFunction, DEFAULT_PAGE_SIZE, FilterLogicType, Query, QueryType,
    query_json_schema,
};
pub use saved_query::SavedQuery;
