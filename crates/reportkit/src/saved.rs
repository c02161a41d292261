//! Conversion between queries and their saved, named form.

use log::info;

use crate::error::{ReportError, ReportResult};
use crate::models::{Query, SavedQuery, TableMetadata};
use crate::query::validate_query;
use crate::service::SavedQueryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SaveMode {
    Create,
    Update,
}

impl SaveMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
        }
    }
}

/// Name and sharing details entered when saving a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveRequest {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub is_shared: bool,
}

impl SaveRequest {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn shared(mut self, is_shared: bool) -> Self {
        self.is_shared = is_shared;
        self
    }

    /// Targets an existing saved query instead of creating a new one.
    #[must_use]
    pub fn replacing(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// What the save dialog offers for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveTarget {
    CreateNew,
    EditExisting(SaveRequest),
}

impl SaveTarget {
    #[must_use]
    pub fn into_request(self) -> SaveRequest {
        match self {
            Self::CreateNew => SaveRequest::default(),
            Self::EditExisting(request) => request,
        }
    }
}

/// Wraps a snapshot of `query` in a saved-query envelope.
pub fn to_saved_query(query: &Query, request: &SaveRequest) -> ReportResult<SavedQuery> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ReportError::MissingSavedQueryName);
    }

    let mut snapshot = query.clone();
    snapshot.is_bound_to_ui = false;
    Ok(SavedQuery {
        id: request.id.clone(),
        name: name.to_string(),
        description: request.description.trim().to_string(),
        is_shared: request.is_shared,
        user_is_owner: true,
        query: snapshot,
    })
}

#[must_use]
pub fn save_mode(saved: &SavedQuery) -> SaveMode {
    if saved.is_persisted() {
        SaveMode::Update
    } else {
        SaveMode::Create
    }
}

/// A loaded saved query is offered for editing only while it still refers
/// to the selected database and table.
#[must_use]
pub fn save_target(loaded: Option<&SavedQuery>, database: &str, table: &str) -> SaveTarget {
    match loaded {
        Some(saved) if saved.is_persisted() && saved.query.targets(database, table) => {
            SaveTarget::EditExisting(SaveRequest {
                id: saved.id.clone(),
                name: saved.name.clone(),
                description: saved.description.clone(),
                is_shared: saved.is_shared,
            })
        }
        _ => SaveTarget::CreateNew,
    }
}

/// Refuses saved queries that target another table, then re-checks the
/// stored query against the table's current columns.
pub fn ensure_loadable(
    saved: &SavedQuery,
    database: &str,
    table: &TableMetadata,
) -> ReportResult<()> {
    if !saved.query.targets(database, &table.name) {
        return Err(ReportError::QueryNotLoadable {
            database: saved.query.database.clone(),
            table: saved.query.table.clone(),
            current_database: database.to_string(),
            current_table: table.name.clone(),
        });
    }
    validate_query(&saved.query, table)?;
    Ok(())
}

/// Creates or updates `saved` depending on whether it already has an id.
pub fn persist(store: &dyn SavedQueryStore, saved: &SavedQuery) -> ReportResult<SavedQuery> {
    let stored = match save_mode(saved) {
        SaveMode::Create => store.create(saved)?,
        SaveMode::Update => store.update(saved)?,
    };
    info!(
        "saved query stored id={} name={} shared={}",
        stored.id.as_deref().unwrap_or("-"),
        stored.name,
        stored.is_shared
    );
    Ok(stored)
}
