pub mod compare;
pub mod drilldown;
pub mod operators;
pub mod saved;
pub mod schema;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Error, Result};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::RuntimePaths;
use crate::error::ReportError;
use crate::models::{CommandEnvelope, CommandEnvelopeFailure};
use crate::query::BuildFailure;

/// Reads and decodes a JSON input file named on the command line.
pub(crate) fn read_json_input<T: DeserializeOwned>(
    runtime_paths: &RuntimePaths,
    path: &Path,
    what: &str,
) -> Result<T> {
    let resolved = runtime_paths.resolve_input(path)?;
    let raw = std::fs::read_to_string(&resolved)
        .with_context(|| format!("failed to read {what} file: {}", resolved.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to decode {what} json: {}", resolved.display()))
}

pub(crate) fn emit(envelope: &CommandEnvelope) -> Result<()> {
    let encoded = serde_json::to_string(envelope).map_err(|error| {
        Error::new(CommandEnvelopeFailure::new(
            CommandEnvelope::error(
                envelope.command.clone(),
                "response_encode_failed",
                "failed to encode command response",
            )
            .with_error_details(json!({ "cause": format!("{error:#}") })),
        ))
    })?;
    println!("{encoded}");
    Ok(())
}

pub(crate) fn problem_details(failure: &BuildFailure) -> Value {
    let problems: Vec<Value> = failure
        .problems()
        .iter()
        .map(|problem| {
            json!({
                "code": problem.code(),
                "message": problem.to_string(),
                "filter_index": problem.filter_index(),
            })
        })
        .collect();
    json!({ "problems": problems })
}

/// Maps a library error onto the envelope failure the binary reports.
pub(crate) fn report_failure(command: &str, error: ReportError) -> Error {
    let envelope = CommandEnvelope::error(command, error.code(), error.to_string());
    let envelope = match &error {
        ReportError::Validation(failure) => envelope.with_error_details(problem_details(failure)),
        _ => envelope,
    };
    if error.is_validation() {
        Error::new(CommandEnvelopeFailure::validation(envelope))
    } else {
        Error::new(CommandEnvelopeFailure::new(envelope))
    }
}
