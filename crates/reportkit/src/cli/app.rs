use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::commands::{
    compare::CompareArgs, drilldown::DrillDownArgs, operators::OperatorsArgs, saved::SavedArgs,
    schema::SchemaArgs, validate::ValidateArgs,
};

#[derive(Debug, Parser)]
#[command(
    name = "reportkit",
    version,
    about = "Build, check and derive ad-hoc report queries"
)]
pub struct Cli {
    #[command(flatten)]
    pub runtime: RuntimeArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    #[arg(long, global = true, value_name = "PATH")]
    pub home_dir: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub cwd: Option<PathBuf>,

    #[arg(long, global = true, value_name = "PATH")]
    pub out_dir: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check a query JSON file against a table metadata file.
    Validate(ValidateArgs),
    /// Report whether two query JSON files describe the same request.
    Compare(CompareArgs),
    /// Derive the raw query behind one crosstab cell.
    Drilldown(DrillDownArgs),
    /// List the filter operators offered for a column category.
    Operators(OperatorsArgs),
    /// Print the JSON schema of the query wire format.
    Schema(SchemaArgs),
    /// Manage saved queries in the local store.
    Saved(SavedArgs),
}
