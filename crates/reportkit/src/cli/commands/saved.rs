use std::path::PathBuf;

use anyhow::{Context, Error, Result};
use clap::{Args, Subcommand};
use serde_json::json;

use crate::config::RuntimePaths;
use crate::models::{CommandEnvelope, CommandEnvelopeFailure, Query, TableMetadata};
use crate::saved::{SaveRequest, ensure_loadable, persist, save_mode, to_saved_query};
use crate::sqlite::SqliteSavedQueryStore;

use super::{emit, read_json_input, report_failure};

#[derive(Debug, Clone, Args)]
pub struct SavedArgs {
    /// User the store acts for; defaults to the settings file's `user`,
    /// then `$USER`.
    #[arg(long, global = true, value_name = "NAME")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: SavedCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SavedCommand {
    List(SavedListArgs),
    Save(SavedSaveArgs),
    Delete(SavedDeleteArgs),
    Load(SavedLoadArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SavedListArgs {
    #[arg(long, value_name = "NAME")]
    pub db: String,
}

#[derive(Debug, Clone, Args)]
pub struct SavedSaveArgs {
    #[arg(value_name = "QUERY")]
    pub query: PathBuf,

    /// Metadata of the table the query targets; the query must validate
    /// against it before it is stored.
    #[arg(long, value_name = "PATH")]
    pub table: PathBuf,

    #[arg(long)]
    pub name: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value_t = false)]
    pub shared: bool,

    /// Update this saved query instead of creating a new one.
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct SavedDeleteArgs {
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Debug, Clone, Args)]
pub struct SavedLoadArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    /// Database currently selected.
    #[arg(long, value_name = "NAME")]
    pub db: String,

    /// Metadata of the currently selected table.
    #[arg(long, value_name = "PATH")]
    pub table: PathBuf,
}

pub fn run(args: &SavedArgs, runtime_paths: &RuntimePaths) -> Result<()> {
    let settings = runtime_paths.load_settings()?;
    let user = resolve_user(args.user.as_deref(), settings.user.as_deref());
    let store_path = runtime_paths.saved_queries_path();
    println!(
        "saved: start user={user} store={}",
        store_path.display()
    );
    let store = SqliteSavedQueryStore::open(&store_path, user)?;

    match &args.command {
        SavedCommand::List(list_args) => run_list(&store, list_args),
        SavedCommand::Save(save_args) => run_save(&store, save_args, runtime_paths),
        SavedCommand::Delete(delete_args) => run_delete(&store, delete_args),
        SavedCommand::Load(load_args) => run_load(&store, load_args, runtime_paths),
    }
}

fn resolve_user(explicit: Option<&str>, configured: Option<&str>) -> String {
    explicit
        .or(configured)
        .map(str::to_string)
        .or_else(|| std::env::var("USER").ok())
        .filter(|user| !user.trim().is_empty())
        .unwrap_or_else(|| "local".to_string())
}

fn run_list(store: &SqliteSavedQueryStore, args: &SavedListArgs) -> Result<()> {
    let queries = store
        .list_visible(&args.db)
        .map_err(|error| store_failure("saved.list", &error))?;
    let envelope = CommandEnvelope::ok(
        "saved.list",
        serde_json::to_value(&queries).context("failed to encode saved queries")?,
    )
    .with_meta("count", json!(queries.len()))
    .with_meta("db", json!(args.db));
    emit(&envelope)
}

fn run_save(
    store: &SqliteSavedQueryStore,
    args: &SavedSaveArgs,
    runtime_paths: &RuntimePaths,
) -> Result<()> {
    const COMMAND: &str = "saved.save";
    let query: Query = read_json_input(runtime_paths, &args.query, "query")?;
    let table: TableMetadata = read_json_input(runtime_paths, &args.table, "table metadata")?;

    let mut request = SaveRequest::new(&args.name)
        .with_description(&args.description)
        .shared(args.shared);
    if let Some(id) = &args.id {
        request = request.replacing(id);
    }

    let saved = to_saved_query(&query, &request).map_err(|error| report_failure(COMMAND, error))?;
    ensure_loadable(&saved, &query.database, &table)
        .map_err(|error| report_failure(COMMAND, error))?;
    let mode = save_mode(&saved);
    let stored = persist(store, &saved).map_err(|error| report_failure(COMMAND, error))?;

    let envelope = CommandEnvelope::ok(
        COMMAND,
        serde_json::to_value(&stored).context("failed to encode saved query")?,
    )
    .with_meta("mode", json!(mode.as_str()));
    emit(&envelope)
}

fn run_delete(store: &SqliteSavedQueryStore, args: &SavedDeleteArgs) -> Result<()> {
    store
        .remove(&args.id)
        .map_err(|error| store_failure("saved.delete", &error))?;
    emit(&CommandEnvelope::ok(
        "saved.delete",
        json!({ "deleted": args.id }),
    ))
}

fn run_load(
    store: &SqliteSavedQueryStore,
    args: &SavedLoadArgs,
    runtime_paths: &RuntimePaths,
) -> Result<()> {
    const COMMAND: &str = "saved.load";
    let table: TableMetadata = read_json_input(runtime_paths, &args.table, "table metadata")?;

    let Some(saved) = store
        .find(&args.id)
        .map_err(|error| store_failure(COMMAND, &error))?
    else {
        return Err(Error::new(CommandEnvelopeFailure::new(
            CommandEnvelope::error(COMMAND, "saved_query_not_found", "saved query not found")
                .with_error_details(json!({ "id": args.id })),
        )));
    };

    ensure_loadable(&saved, &args.db, &table).map_err(|error| report_failure(COMMAND, error))?;
    let envelope = CommandEnvelope::ok(
        COMMAND,
        serde_json::to_value(&saved).context("failed to encode saved query")?,
    );
    emit(&envelope)
}

fn store_failure(command: &str, error: &Error) -> Error {
    Error::new(CommandEnvelopeFailure::new(
        CommandEnvelope::error(command, "saved_query_store_failed", "saved query store failed")
            .with_error_details(json!({ "cause": format!("{error:#}") })),
    ))
}
