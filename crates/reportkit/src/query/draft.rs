use std::fmt::{Display, Formatter};

use log::debug;

use crate::error::{ReportError, ReportResult};
use crate::models::{
    CrosstabFunction, DEFAULT_PAGE_SIZE, Filter, FilterLogicType, FilterValue, Operator, Query,
    QueryType, TableMetadata,
};
use crate::operators::{default_operator, operator_allowed};

use super::validate::{BuildFailure, QueryParts, collect_problems};

/// Stable handle for a filter row; survives removal of other rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(u64);

impl FilterId {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl Display for FilterId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "filter-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEntry {
    pub id: FilterId,
    pub filter: Filter,
}

/// Mutable query selections, edited one change at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDraft {
    query_type: QueryType,
    filters: Vec<FilterEntry>,
    next_filter_id: u64,
    filter_logic_type: FilterLogicType,
    filter_logic_string: String,
    output_columns: Vec<String>,
    order_by: Vec<String>,
    crosstab_function: Option<CrosstabFunction>,
    crosstab_subject_var: String,
    crosstab_row_var: String,
    crosstab_col_var: String,
}

/// Where a draft is built against.
#[derive(Debug, Clone, Copy)]
pub struct BuildContext<'a> {
    pub database: &'a str,
    pub table: &'a TableMetadata,
    pub page_size: u64,
}

impl<'a> BuildContext<'a> {
    #[must_use]
    pub fn new(database: &'a str, table: &'a TableMetadata) -> Self {
        Self {
            database,
            table,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }
}

impl QueryDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every selection with those of `query`. Filters get fresh ids.
    pub fn load(&mut self, query: &Query) {
        *self = Self::default();
        self.query_type = query.query_type;
        for filter in &query.filters {
            self.add_filter(filter.clone());
        }
        self.filter_logic_type = query.filter_logic_type;
        self.filter_logic_string = query.filter_logic_string.clone();
        self.output_columns = query.output_columns.clone();
        self.order_by = query.order_by.clone();
        self.crosstab_function = query.crosstab_function;
        self.crosstab_subject_var = query.crosstab_subject_var.clone();
        self.crosstab_row_var = query.crosstab_row_var.clone();
        self.crosstab_col_var = query.crosstab_col_var.clone();
    }

    #[must_use]
    pub fn from_query(query: &Query) -> Self {
        let mut draft = Self::default();
        draft.load(query);
        draft
    }

    pub fn add_filter(&mut self, filter: Filter) -> FilterId {
        let id = FilterId(self.next_filter_id);
        self.next_filter_id += 1;
        self.filters.push(FilterEntry { id, filter });
        id
    }

    /// Adds an empty filter row, as the "add filter" control does.
    pub fn add_blank_filter(&mut self) -> FilterId {
        self.add_filter(Filter {
            column: String::new(),
            operator: None,
            value: FilterValue::Null,
        })
    }

    pub fn remove_filter(&mut self, id: FilterId) -> ReportResult<Filter> {
        let position = self
            .filters
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(ReportError::UnknownFilter(id))?;
        Ok(self.filters.remove(position).filter)
    }

    pub fn filter(&self, id: FilterId) -> ReportResult<&Filter> {
        self.filters
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.filter)
            .ok_or(ReportError::UnknownFilter(id))
    }

    fn filter_mut(&mut self, id: FilterId) -> ReportResult<&mut Filter> {
        self.filters
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.filter)
            .ok_or(ReportError::UnknownFilter(id))
    }

    #[must_use]
    pub fn filters(&self) -> &[FilterEntry] {
        &self.filters
    }

    /// Points a filter at another column. The operator resets to the first
    /// one the column allows and the value is cleared.
    pub fn set_filter_column(
        &mut self,
        id: FilterId,
        column: impl Into<String>,
        table: &TableMetadata,
    ) -> ReportResult<()> {
        let column = column.into();
        let operator = table
            .column(&column)
            .map(|descriptor| default_operator(descriptor.category()));
        let filter = self.filter_mut(id)?;
        filter.column = column;
        filter.operator = operator;
        filter.value = FilterValue::Null;
        Ok(())
    }

    pub fn set_filter_operator(
        &mut self,
        id: FilterId,
        operator: Operator,
        table: &TableMetadata,
    ) -> ReportResult<()> {
        let filter = self.filter_mut(id)?;
        let allowed = table
            .column(&filter.column)
            .is_none_or(|descriptor| operator_allowed(descriptor.category(), operator));
        if !allowed {
            return Err(ReportError::OperatorNotAllowed {
                column: filter.column.clone(),
                operator,
            });
        }
        filter.operator = Some(operator);
        Ok(())
    }

    pub fn set_filter_value(&mut self, id: FilterId, value: FilterValue) -> ReportResult<()> {
        self.filter_mut(id)?.value = value;
        Ok(())
    }

    #[must_use]
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    pub fn set_query_type(&mut self, query_type: QueryType) {
        self.query_type = query_type;
    }

    #[must_use]
    pub fn filter_logic_type(&self) -> FilterLogicType {
        self.filter_logic_type
    }

    #[must_use]
    pub fn filter_logic_string(&self) -> &str {
        &self.filter_logic_string
    }

    pub fn set_filter_logic(&mut self, logic_type: FilterLogicType, logic: impl Into<String>) {
        self.filter_logic_type = logic_type;
        self.filter_logic_string = logic.into().trim().to_string();
    }

    #[must_use]
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    pub fn set_output_columns<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_columns = columns.into_iter().map(Into::into).collect();
    }

    #[must_use]
    pub fn order_by(&self) -> &[String] {
        &self.order_by
    }

    pub fn set_order_by<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.order_by = columns.into_iter().map(Into::into).collect();
    }

    #[must_use]
    pub fn crosstab_function(&self) -> Option<CrosstabFunction> {
        self.crosstab_function
    }

    /// Selects the aggregate. Switching to Count, or away from it, clears a
    /// subject that no longer fits.
    pub fn set_crosstab_function(&mut self, function: Option<CrosstabFunction>) {
        let counts_records = |function: Option<CrosstabFunction>| {
            function.is_some_and(|function| !function.needs_numeric_subject())
        };
        if counts_records(self.crosstab_function) != counts_records(function) {
            self.crosstab_subject_var.clear();
        }
        self.crosstab_function = function;
    }

    pub fn set_crosstab_subject_var(&mut self, column: impl Into<String>) {
        self.crosstab_subject_var = column.into();
    }

    pub fn set_crosstab_row_var(&mut self, column: impl Into<String>) {
        self.crosstab_row_var = column.into();
    }

    pub fn set_crosstab_col_var(&mut self, column: impl Into<String>) {
        self.crosstab_col_var = column.into();
    }

    fn parts(&self) -> QueryParts<'_> {
        QueryParts {
            query_type: self.query_type,
            filters: self.filters.iter().map(|entry| &entry.filter).collect(),
            filter_logic_type: self.filter_logic_type,
            filter_logic_string: &self.filter_logic_string,
            output_columns: &self.output_columns,
            order_by: &self.order_by,
            crosstab_function: self.crosstab_function,
            crosstab_subject_var: &self.crosstab_subject_var,
            crosstab_row_var: &self.crosstab_row_var,
            crosstab_col_var: &self.crosstab_col_var,
        }
    }

    /// Validates every filter and the query shape, collecting all problems.
    /// The returned query reads the draft live until it is snapshotted with
    /// [`BoundQuery::unbound_clone`].
    pub fn build<'a>(&'a self, context: BuildContext<'a>) -> Result<BoundQuery<'a>, BuildFailure> {
        let problems = collect_problems(&self.parts(), context.table, false);
        if !problems.is_empty() {
            debug!(
                "query build failed table={} problems={}",
                context.table.name,
                problems.len()
            );
            return Err(BuildFailure::new(problems));
        }

        Ok(BoundQuery {
            draft: self,
            database: context.database,
            table: context.table,
            limit: context.page_size,
        })
    }
}

/// A validated query that borrows the draft it was built from.
#[derive(Debug, Clone, Copy)]
pub struct BoundQuery<'a> {
    draft: &'a QueryDraft,
    database: &'a str,
    table: &'a TableMetadata,
    limit: u64,
}

impl<'a> BoundQuery<'a> {
    #[must_use]
    pub fn database(&self) -> &'a str {
        self.database
    }

    #[must_use]
    pub fn table(&self) -> &'a TableMetadata {
        self.table
    }

    #[must_use]
    pub fn query_type(&self) -> QueryType {
        self.draft.query_type
    }

    pub fn filters(&self) -> impl Iterator<Item = &'a Filter> + 'a {
        self.draft.filters.iter().map(|entry| &entry.filter)
    }

    #[must_use]
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Freshly built queries always start at the first row.
    #[must_use]
    pub fn offset(&self) -> u64 {
        0
    }

    #[must_use]
    pub fn is_bound_to_ui(&self) -> bool {
        true
    }

    /// Detached snapshot of the query, safe to send, cache and persist.
    #[must_use]
    pub fn unbound_clone(&self) -> Query {
        let draft = self.draft;
        Query {
            database: self.database.to_string(),
            table: self.table.name.clone(),
            query_type: draft.query_type,
            filters: self.filters().map(Filter::summary).collect(),
            filter_logic_type: draft.filter_logic_type,
            filter_logic_string: draft.filter_logic_string.clone(),
            output_columns: draft.output_columns.clone(),
            order_by: draft.order_by.clone(),
            group_by: Vec::new(),
            limit: self.limit,
            offset: self.offset(),
            crosstab_function: draft.crosstab_function,
            crosstab_subject_var: draft.crosstab_subject_var.clone(),
            crosstab_row_var: draft.crosstab_row_var.clone(),
            crosstab_col_var: draft.crosstab_col_var.clone(),
            is_bound_to_ui: false,
        }
    }

    #[must_use]
    pub fn is_equivalent(&self, other: &Query) -> bool {
        self.unbound_clone().is_equivalent(other)
    }
}
