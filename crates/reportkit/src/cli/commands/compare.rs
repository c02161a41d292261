use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::config::RuntimePaths;
use crate::models::{CommandEnvelope, Query};

use super::{emit, read_json_input};

#[derive(Debug, Clone, Args)]
pub struct CompareArgs {
    #[arg(value_name = "LEFT")]
    pub left: PathBuf,

    #[arg(value_name = "RIGHT")]
    pub right: PathBuf,
}

pub fn run(args: &CompareArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    println!(
        "compare: start left={} right={}",
        args.left.display(),
        args.right.display()
    );

    let left: Query = read_json_input(runtime_paths, &args.left, "query")?;
    let right: Query = read_json_input(runtime_paths, &args.right, "query")?;

    let equivalent = left.is_equivalent(&right);
    let mut envelope = CommandEnvelope::ok(
        "compare",
        json!({
            "equivalent": equivalent,
            "same_query_type": left.query_type == right.query_type,
            "same_target": left.targets(&right.database, &right.table),
            "logic_matches": left.logic_matches(&right),
        }),
    );
    if left.query_type != right.query_type {
        envelope = envelope.with_warning(
            "query_type_differs",
            format!("{} query compared with {} query", left.query_type, right.query_type),
        );
    }
    emit(&envelope)
}
