use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::config::RuntimePaths;
use crate::error::ReportError;
use crate::models::{CommandEnvelope, Query, TableMetadata};
use crate::query::validate_query;

use super::{emit, read_json_input, report_failure};

const COMMAND: &str = "validate";

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Query JSON file.
    #[arg(value_name = "QUERY")]
    pub query: PathBuf,

    /// Table metadata JSON file (`Name`, `ColumnDescriptors`).
    #[arg(long, value_name = "PATH")]
    pub table: PathBuf,
}

pub fn run(args: &ValidateArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    println!(
        "validate: start query={} table={}",
        args.query.display(),
        args.table.display()
    );

    let query: Query = read_json_input(runtime_paths, &args.query, "query")?;
    let table: TableMetadata = read_json_input(runtime_paths, &args.table, "table metadata")?;

    if let Err(failure) = validate_query(&query, &table) {
        eprintln!(
            "validate: failed problems={} next=fix_query",
            failure.problems().len()
        );
        return Err(report_failure(COMMAND, ReportError::Validation(failure)));
    }

    let envelope = CommandEnvelope::ok(
        COMMAND,
        json!({
            "valid": true,
            "db": query.database,
            "table": query.table,
            "query_type": query.query_type.to_string(),
            "filters": query.filters.len(),
        }),
    );
    emit(&envelope)
}
