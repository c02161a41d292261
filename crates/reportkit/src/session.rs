//! The report screen's state: selected table, query draft, last query run
//! and loaded saved query.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::drilldown::{CrosstabCell, DrillDownRequest, ROLL_UP_MARKER, derive_drill_down};
use crate::error::{ReportError, ReportResult};
use crate::models::{DEFAULT_PAGE_SIZE, ListOption, Query, QueryType, SavedQuery, TableMetadata};
use crate::query::{BoundQuery, BuildContext, QueryDraft, validate_query};
use crate::saved::{SaveRequest, SaveTarget, persist, save_target, to_saved_query};
use crate::service::{ReportService, RunQueryResponse, SavedQueryStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Rows requested per batch; also the step of `load_next_batch`.
    pub page_size: u64,
    pub roll_up_marker: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            roll_up_marker: ROLL_UP_MARKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListOptionKey {
    pub database: String,
    pub table: String,
    pub column: String,
}

impl ListOptionKey {
    #[must_use]
    pub fn new(database: &str, table: &str, column: &str) -> Self {
        Self {
            database: database.to_string(),
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

/// Distinct values per column. Entries never expire during a session.
#[derive(Debug, Clone, Default)]
pub struct ListOptionCache {
    entries: HashMap<ListOptionKey, Vec<ListOption>>,
}

impl ListOptionCache {
    #[must_use]
    pub fn get(&self, key: &ListOptionKey) -> Option<&[ListOption]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn insert(&mut self, key: ListOptionKey, options: Vec<ListOption>) {
        self.entries.insert(key, options);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one query request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    pub query: Query,
    pub response: RunQueryResponse,
    /// A full raw batch came back, so another batch may exist.
    pub has_more_rows: bool,
}

pub struct ReportSession<S, Q> {
    service: S,
    store: Q,
    config: SessionConfig,
    database: Option<String>,
    table: Option<TableMetadata>,
    draft: QueryDraft,
    list_options: ListOptionCache,
    current_query: Option<Query>,
    saved_query: Option<SavedQuery>,
}

impl<S, Q> ReportSession<S, Q>
where
    S: ReportService,
    Q: SavedQueryStore,
{
    #[must_use]
    pub fn new(service: S, store: Q, config: SessionConfig) -> Self {
        Self {
            service,
            store,
            config,
            database: None,
            table: None,
            draft: QueryDraft::new(),
            list_options: ListOptionCache::default(),
            current_query: None,
            saved_query: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    #[must_use]
    pub fn store(&self) -> &Q {
        &self.store
    }

    #[must_use]
    pub fn draft(&self) -> &QueryDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut QueryDraft {
        &mut self.draft
    }

    #[must_use]
    pub fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    #[must_use]
    pub fn current_table(&self) -> Option<&TableMetadata> {
        self.table.as_ref()
    }

    #[must_use]
    pub fn current_query(&self) -> Option<&Query> {
        self.current_query.as_ref()
    }

    #[must_use]
    pub fn saved_query(&self) -> Option<&SavedQuery> {
        self.saved_query.as_ref()
    }

    #[must_use]
    pub fn list_option_cache(&self) -> &ListOptionCache {
        &self.list_options
    }

    fn selection(&self) -> ReportResult<(&str, &TableMetadata)> {
        match (self.database.as_deref(), self.table.as_ref()) {
            (Some(database), Some(table)) => Ok((database, table)),
            _ => Err(ReportError::NoTableSelected),
        }
    }

    /// Fetches the table's column metadata and starts a fresh draft for it.
    /// A loaded saved query no longer applies afterwards.
    pub fn select_table(&mut self, database: &str, table: &str) -> ReportResult<&TableMetadata> {
        let metadata = self.service.table_metadata(database, table)?;
        info!(
            "table selected db={database} table={table} columns={}",
            metadata.column_descriptors.len()
        );
        self.database = Some(database.to_string());
        self.draft = QueryDraft::new();
        self.current_query = None;
        self.saved_query = None;
        Ok(self.table.insert(metadata))
    }

    /// Distinct values of a column of the selected table, fetched once.
    pub fn distinct_values(&mut self, column: &str) -> ReportResult<Vec<ListOption>> {
        let (database, table) = self.selection()?;
        let key = ListOptionKey::new(database, &table.name, column);
        if let Some(options) = self.list_options.get(&key) {
            debug!("list options cache hit column={column}");
            return Ok(options.to_vec());
        }

        let options = self
            .service
            .distinct_values(&key.database, &key.table, column)?;
        self.list_options.insert(key, options.clone());
        Ok(options)
    }

    pub fn build(&self) -> ReportResult<BoundQuery<'_>> {
        let (database, table) = self.selection()?;
        let context = BuildContext::new(database, table).with_page_size(self.config.page_size);
        Ok(self.draft.build(context)?)
    }

    /// Builds the draft and detaches it from the session.
    pub fn snapshot(&self) -> ReportResult<Query> {
        Ok(self.build()?.unbound_clone())
    }

    /// Runs `query`, or a snapshot of the draft when none is given. Nothing
    /// is sent when the draft does not build or a given query does not
    /// validate against the selected table.
    pub fn run(&mut self, query: Option<Query>) -> ReportResult<QueryRun> {
        let query = match query {
            Some(query) => {
                self.check_against_selection(&query)?;
                query
            }
            None => self.snapshot()?,
        };
        if query.query_type == QueryType::Crosstab {
            self.warm_axis_options(&query);
        }

        self.current_query = Some(query.clone());
        self.execute(query)
    }

    /// Requests the rows after the current batch.
    pub fn load_next_batch(&mut self) -> ReportResult<QueryRun> {
        let page_size = self.config.page_size;
        let query = self
            .current_query
            .as_mut()
            .ok_or(ReportError::NoCurrentQuery)?;
        query.offset += page_size;
        let query = query.clone();
        debug!("loading next batch offset={}", query.offset);
        self.execute(query)
    }

    fn execute(&self, query: Query) -> ReportResult<QueryRun> {
        let response = self
            .service
            .run_query(&query)
            .and_then(RunQueryResponse::into_result)
            .inspect_err(|error| warn!("query failed table={}: {error}", query.table))?;
        let has_more_rows = query.query_type == QueryType::Raw
            && u64::try_from(response.results.len()).unwrap_or(u64::MAX) >= self.config.page_size;
        Ok(QueryRun {
            query,
            response,
            has_more_rows,
        })
    }

    fn warm_axis_options(&mut self, query: &Query) {
        let on_selection = self
            .selection()
            .is_ok_and(|(database, table)| query.targets(database, &table.name));
        if !on_selection {
            return;
        }
        for column in [query.crosstab_row_var.clone(), query.crosstab_col_var.clone()] {
            if let Err(error) = self.distinct_values(&column) {
                warn!("could not load list options column={column}: {error}");
            }
        }
    }

    /// Snapshots the draft and asks the service for CSV output.
    pub fn export(&mut self) -> ReportResult<Vec<u8>> {
        let query = self.snapshot()?;
        self.current_query = Some(query.clone());
        Ok(self.service.export_query(&query)?)
    }

    /// Derives the detail query for one cell of the current crosstab.
    pub fn drill_down(&self, cell: CrosstabCell) -> ReportResult<Query> {
        let query = self
            .current_query
            .as_ref()
            .ok_or(ReportError::NoCurrentQuery)?;
        let (_, table) = self.selection()?;
        let request = DrillDownRequest::for_query(query, cell)
            .with_roll_up_marker(self.config.roll_up_marker.clone());
        derive_drill_down(query, table, &request)
    }

    /// Populates the draft from `query`. Refused, leaving the draft as it
    /// was, when the query targets another table or no longer validates.
    pub fn load_query(&mut self, query: &Query) -> ReportResult<()> {
        self.check_against_selection(query)?;
        self.draft.load(query);
        Ok(())
    }

    fn check_against_selection(&self, query: &Query) -> ReportResult<()> {
        let (database, table) = self.selection()?;
        if !query.targets(database, &table.name) {
            return Err(ReportError::QueryNotLoadable {
                database: query.database.clone(),
                table: query.table.clone(),
                current_database: database.to_string(),
                current_table: table.name.clone(),
            });
        }
        validate_query(query, table).inspect_err(|failure| {
            debug!("query rejected table={}: {failure}", table.name);
        })?;
        Ok(())
    }

    #[must_use]
    pub fn save_target(&self) -> SaveTarget {
        match self.selection() {
            Ok((database, table)) => save_target(self.saved_query.as_ref(), database, &table.name),
            Err(_) => SaveTarget::CreateNew,
        }
    }

    /// Saves a snapshot of the draft under `request`'s name.
    pub fn save_query(&mut self, request: &SaveRequest) -> ReportResult<SavedQuery> {
        if request.name.trim().is_empty() {
            return Err(ReportError::MissingSavedQueryName);
        }
        let query = self.snapshot()?;
        let saved = to_saved_query(&query, request)?;
        let stored = persist(&self.store, &saved)?;
        self.saved_query = Some(stored.clone());
        Ok(stored)
    }

    /// Saved queries of the selected database visible to the user.
    pub fn list_saved_queries(&self) -> ReportResult<Vec<SavedQuery>> {
        let database = self
            .database
            .as_deref()
            .ok_or(ReportError::NoTableSelected)?;
        Ok(self.store.list(database)?)
    }

    /// Switches to the saved query's table, loads it and runs it.
    pub fn open_saved_query(&mut self, saved: SavedQuery) -> ReportResult<QueryRun> {
        let (database, table) = (saved.query.database.clone(), saved.query.table.clone());
        self.select_table(&database, &table)?;
        self.load_query(&saved.query)?;
        self.saved_query = Some(saved);
        self.run(None)
    }

    pub fn delete_saved_query(&mut self, id: &str) -> ReportResult<()> {
        self.store.delete(id)?;
        if self
            .saved_query
            .as_ref()
            .is_some_and(|saved| saved.id.as_deref() == Some(id))
        {
            self.saved_query = None;
        }
        info!("saved query deleted id={id}");
        Ok(())
    }
}
