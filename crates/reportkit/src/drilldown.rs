//! Derives the raw "detail rows" query behind one crosstab cell.

use log::debug;
use serde_json::Value;

use crate::error::{ReportError, ReportResult};
use crate::logic::{Connective, build_logic_string};
use crate::models::{Filter, FilterLogicType, Query, QueryType, TableMetadata};
use crate::service::RunQueryResponse;

/// Axis value the backend emits for subtotal rows and columns.
pub const ROLL_UP_MARKER: &str = "Roll Up";

/// Axis values of a clicked crosstab cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosstabCell {
    pub row_value: String,
    pub col_value: String,
}

impl CrosstabCell {
    #[must_use]
    pub fn new(row_value: impl Into<String>, col_value: impl Into<String>) -> Self {
        Self {
            row_value: row_value.into(),
            col_value: col_value.into(),
        }
    }

    /// Resolves a click on the crosstab grid. The column value is the field
    /// of the clicked grid column; the row value is read from the row under
    /// `row_var`. Cell 0 holds the row label and is not drillable.
    #[must_use]
    pub fn from_results(
        response: &RunQueryResponse,
        row: usize,
        cell: usize,
        row_var: &str,
    ) -> Option<Self> {
        if cell == 0 {
            return None;
        }
        let col_value = response.columns.get(cell)?.field.clone();
        let row_value = match response.results.get(row)?.get(row_var)? {
            Value::String(text) => text.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Some(Self {
            row_value,
            col_value,
        })
    }
}

/// Everything needed to derive a drill-down besides the original query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDownRequest {
    pub row_var: String,
    pub col_var: String,
    pub cell: CrosstabCell,
    pub roll_up_marker: String,
}

impl DrillDownRequest {
    #[must_use]
    pub fn new(row_var: impl Into<String>, col_var: impl Into<String>, cell: CrosstabCell) -> Self {
        Self {
            row_var: row_var.into(),
            col_var: col_var.into(),
            cell,
            roll_up_marker: ROLL_UP_MARKER.to_string(),
        }
    }

    /// Uses the crosstab variables of `query` as the axes.
    #[must_use]
    pub fn for_query(query: &Query, cell: CrosstabCell) -> Self {
        Self::new(
            query.crosstab_row_var.clone(),
            query.crosstab_col_var.clone(),
            cell,
        )
    }

    #[must_use]
    pub fn with_roll_up_marker(mut self, marker: impl Into<String>) -> Self {
        self.roll_up_marker = marker.into();
        self
    }

    fn pins(&self, value: &str) -> bool {
        value != self.roll_up_marker
    }
}

/// Builds a raw query returning the records rolled into one crosstab cell.
///
/// The original filters are kept and expressed as an explicit logic
/// string, then an `Equals` filter is appended for the column axis and the
/// row axis (in that order) unless the clicked value is the roll-up marker.
/// Every table column is selected for output and paging restarts at 0.
pub fn derive_drill_down(
    original: &Query,
    table: &TableMetadata,
    request: &DrillDownRequest,
) -> ReportResult<Query> {
    if !original.is_crosstab() {
        return Err(ReportError::NotCrosstab);
    }

    let mut derived = original.clone();
    derived.query_type = QueryType::Raw;
    derived.offset = 0;
    derived.is_bound_to_ui = false;
    derived.output_columns = table.column_names();

    let original_count = derived.filters.len();
    let base_logic = match derived.filter_logic_type {
        FilterLogicType::MatchAll => build_logic_string(original_count, Connective::And),
        FilterLogicType::MatchAny => build_logic_string(original_count, Connective::Or),
        FilterLogicType::Custom => {
            let custom = derived.filter_logic_string.trim();
            if custom.is_empty() {
                String::new()
            } else {
                format!("({custom})")
            }
        }
    };

    let axes = [
        (&request.col_var, &request.cell.col_value),
        (&request.row_var, &request.cell.row_value),
    ];
    let mut conjuncts = Vec::new();
    for (var, value) in axes {
        if !request.pins(value) {
            continue;
        }
        derived.filters.push(Filter::equals(var.as_str(), value.as_str()));
        conjuncts.push(derived.filters.len().to_string());
    }

    let mut logic = base_logic;
    for index in conjuncts {
        if logic.is_empty() {
            logic = index;
        } else {
            logic = format!("{logic} AND {index}");
        }
    }

    if derived.filters.is_empty() {
        derived.filter_logic_type = FilterLogicType::MatchAll;
        derived.filter_logic_string = String::new();
    } else {
        derived.filter_logic_type = FilterLogicType::Custom;
        derived.filter_logic_string = logic;
    }

    debug!(
        "drill-down derived table={} filters={} logic={}",
        derived.table,
        derived.filters.len(),
        derived.filter_logic_string
    );
    Ok(derived)
}
