use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::models::{CommandEnvelope, query_json_schema};

#[derive(Debug, Clone, Args)]
pub struct SchemaArgs {
    /// Print the bare schema document instead of an envelope.
    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

pub fn run(args: &SchemaArgs) -> Result<()> {
    let schema = query_json_schema();
    if args.raw {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let envelope =
        CommandEnvelope::ok("schema", schema).with_meta("document", json!("reportkit.query"));
    super::emit(&envelope)
}
