use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use crate::config::RuntimePaths;
use crate::drilldown::{CrosstabCell, DrillDownRequest, derive_drill_down};
use crate::models::{CommandEnvelope, Query, TableMetadata};

use super::{emit, read_json_input, report_failure};

const COMMAND: &str = "drilldown";

#[derive(Debug, Clone, Args)]
pub struct DrillDownArgs {
    /// Executed crosstab query JSON file.
    #[arg(value_name = "QUERY")]
    pub query: PathBuf,

    #[arg(long, value_name = "PATH")]
    pub table: PathBuf,

    /// Value of the crosstab row variable in the clicked cell.
    #[arg(long, value_name = "VALUE")]
    pub row: String,

    /// Value of the crosstab column variable in the clicked cell.
    #[arg(long = "col", value_name = "VALUE")]
    pub col: String,

    /// Header naming a rolled-up row or column; defaults to the settings
    /// file's `rollUpMarker`, then `Roll Up`.
    #[arg(long, value_name = "TEXT")]
    pub roll_up_marker: Option<String>,
}

pub fn run(args: &DrillDownArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    println!(
        "drilldown: start query={} row={} col={}",
        args.query.display(),
        args.row,
        args.col
    );

    let query: Query = read_json_input(runtime_paths, &args.query, "query")?;
    let table: TableMetadata = read_json_input(runtime_paths, &args.table, "table metadata")?;
    let roll_up_marker = match &args.roll_up_marker {
        Some(marker) => marker.clone(),
        None => runtime_paths.load_settings()?.roll_up_marker().to_string(),
    };

    let request = DrillDownRequest::for_query(&query, CrosstabCell::new(&args.row, &args.col))
        .with_roll_up_marker(roll_up_marker);
    let derived = derive_drill_down(&query, &table, &request)
        .map_err(|error| report_failure(COMMAND, error))?;

    let added_filters = derived.filters.len() - query.filters.len();
    let data = serde_json::to_value(&derived).context("failed to encode derived query")?;
    let envelope = CommandEnvelope::ok(COMMAND, data)
        .with_meta("added_filters", json!(added_filters))
        .with_meta("row_var", json!(request.row_var))
        .with_meta("col_var", json!(request.col_var));
    emit(&envelope)
}
