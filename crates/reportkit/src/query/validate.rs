use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::logic::{LogicError, parse_logic};
use crate::models::{
    ALL_RECORDS_SUBJECT, CrosstabFunction, Filter, FilterIssue, FilterLogicType,
    Operator, Query, QueryType, TableMetadata,
};
use crate::operators::operator_allowed;

/// Which selection a column name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Output,
    Sort,
    CrosstabSubject,
    CrosstabRow,
    CrosstabColumn,
}

impl ColumnRole {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Output => "Result",
            Self::Sort => "Sort",
            Self::CrosstabSubject => "Crosstab variable",
            Self::CrosstabRow => "Crosstab row",
            Self::CrosstabColumn => "Crosstab column",
        }
    }
}

/// One reason a query cannot be sent to the execution service.
/// Filter indices are 1-based, as the user sees them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryProblem {
    Filter {
        index: usize,
        issue: FilterIssue,
    },
    UnknownFilterColumn {
        index: usize,
        column: String,
    },
    OperatorNotAllowed {
        index: usize,
        column: String,
        operator: Operator,
    },
    MissingOutputColumns,
    MissingLogicString,
    InvalidLogicString(LogicError),
    MissingCrosstabFunction,
    MissingCrosstabSubjectVar,
    MissingCrosstabRowVar,
    MissingCrosstabColumnVar,
    UnknownColumn {
        role: ColumnRole,
        column: String,
    },
    ColumnNotSortable {
        column: String,
    },
}

impl QueryProblem {
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Filter { issue, .. } => issue.code(),
            Self::UnknownFilterColumn { .. } => "unknown_filter_column",
            Self::OperatorNotAllowed { .. } => "operator_not_allowed",
            Self::MissingOutputColumns => "missing_output_columns",
            Self::MissingLogicString => "missing_logic_string",
            Self::InvalidLogicString(_) => "invalid_logic_string",
            Self::MissingCrosstabFunction => "missing_crosstab_function",
            Self::MissingCrosstabSubjectVar => "missing_crosstab_subject_var",
            Self::MissingCrosstabRowVar => "missing_crosstab_row_var",
            Self::MissingCrosstabColumnVar => "missing_crosstab_column_var",
            Self::UnknownColumn { .. } => "unknown_column",
            Self::ColumnNotSortable { .. } => "column_not_sortable",
        }
    }

    /// 1-based index of the offending filter, if the problem is about one.
    #[must_use]
    pub const fn filter_index(&self) -> Option<usize> {
        match self {
            Self::Filter { index, .. }
            | Self::UnknownFilterColumn { index, .. }
            | Self::OperatorNotAllowed { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl Display for QueryProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Filter { index, issue } => {
                write!(f, "Please correct or remove filter #{index}: {issue}")
            }
            Self::UnknownFilterColumn { index, column } => write!(
                f,
                "Please correct or remove filter #{index}: column `{column}` is not in this table."
            ),
            Self::OperatorNotAllowed {
                index,
                column,
                operator,
            } => write!(
                f,
                "Please correct or remove filter #{index}: `{}` cannot be used with column `{column}`.",
                operator.label()
            ),
            Self::MissingOutputColumns => f.write_str("Please select one or more result columns."),
            Self::MissingLogicString => f.write_str("Custom logic expression is missing."),
            Self::InvalidLogicString(error) => {
                write!(f, "Custom logic expression is invalid: {error}.")
            }
            Self::MissingCrosstabFunction => f.write_str("Please select a crosstab function."),
            Self::MissingCrosstabSubjectVar => f.write_str("Please select a crosstab variable."),
            Self::MissingCrosstabRowVar => {
                f.write_str("Please select a row variable for the crosstab query.")
            }
            Self::MissingCrosstabColumnVar => {
                f.write_str("Please select a column variable for the crosstab query.")
            }
            Self::UnknownColumn { role, column } => write!(
                f,
                "{} column `{column}` is not in this table.",
                role.label()
            ),
            Self::ColumnNotSortable { column } => {
                write!(f, "Results cannot be sorted by column `{column}`.")
            }
        }
    }
}

/// Every problem found while building or checking a query, in the order
/// they were found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFailure {
    problems: Vec<QueryProblem>,
}

impl BuildFailure {
    #[must_use]
    pub fn new(problems: Vec<QueryProblem>) -> Self {
        Self { problems }
    }

    #[must_use]
    pub fn problems(&self) -> &[QueryProblem] {
        &self.problems
    }

    #[must_use]
    pub fn into_problems(self) -> Vec<QueryProblem> {
        self.problems
    }

    #[must_use]
    pub fn contains(&self, problem: &QueryProblem) -> bool {
        self.problems.contains(problem)
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.problems.iter().map(ToString::to_string).collect()
    }
}

impl Display for BuildFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Please correct the following items:")?;
        for problem in &self.problems {
            write!(f, "\n- {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildFailure {}

/// Borrowed view of the fields validation looks at, shared by drafts and
/// detached queries.
pub(crate) struct QueryParts<'a> {
    pub query_type: QueryType,
    pub filters: Vec<&'a Filter>,
    pub filter_logic_type: FilterLogicType,
    pub filter_logic_string: &'a str,
    pub output_columns: &'a [String],
    pub order_by: &'a [String],
    pub crosstab_function: Option<CrosstabFunction>,
    pub crosstab_subject_var: &'a str,
    pub crosstab_row_var: &'a str,
    pub crosstab_col_var: &'a str,
}

impl<'a> QueryParts<'a> {
    pub(crate) fn of_query(query: &'a Query) -> Self {
        Self {
            query_type: query.query_type,
            filters: query.filters.iter().collect(),
            filter_logic_type: query.filter_logic_type,
            filter_logic_string: &query.filter_logic_string,
            output_columns: &query.output_columns,
            order_by: &query.order_by,
            crosstab_function: query.crosstab_function,
            crosstab_subject_var: &query.crosstab_subject_var,
            crosstab_row_var: &query.crosstab_row_var,
            crosstab_col_var: &query.crosstab_col_var,
        }
    }
}

/// Checks an existing query (for example one loaded from storage) against
/// the table it targets. Besides the build rules, selected columns that the
/// table does not have, and sort columns it cannot order by, are reported.
pub fn validate_query(query: &Query, table: &TableMetadata) -> Result<(), BuildFailure> {
    let problems = collect_problems(&QueryParts::of_query(query), table, true);
    if problems.is_empty() {
        Ok(())
    } else {
        Err(BuildFailure::new(problems))
    }
}

pub(crate) fn collect_problems(
    parts: &QueryParts<'_>,
    table: &TableMetadata,
    check_columns: bool,
) -> Vec<QueryProblem> {
    let mut problems = Vec::new();

    for (position, filter) in parts.filters.iter().enumerate() {
        if let Some(problem) = filter_problem(position + 1, filter, table) {
            problems.push(problem);
        }
    }

    match parts.query_type {
        QueryType::Raw => raw_problems(parts, &mut problems),
        QueryType::Crosstab => crosstab_problems(parts, &mut problems),
    }

    if check_columns {
        column_problems(parts, table, &mut problems);
    }

    problems
}

fn filter_problem(index: usize, filter: &Filter, table: &TableMetadata) -> Option<QueryProblem> {
    if filter.column.trim().is_empty() {
        return Some(QueryProblem::Filter {
            index,
            issue: FilterIssue::MissingColumn,
        });
    }
    let Some(column) = table.column(&filter.column) else {
        return Some(QueryProblem::UnknownFilterColumn {
            index,
            column: filter.column.clone(),
        });
    };

    let category = column.category();
    if let Err(issue) = filter.validate(category) {
        return Some(QueryProblem::Filter { index, issue });
    }

    match filter.operator {
        Some(operator) if !operator_allowed(category, operator) => {
            Some(QueryProblem::OperatorNotAllowed {
                index,
                column: filter.column.clone(),
                operator,
            })
        }
        _ => None,
    }
}

fn raw_problems(parts: &QueryParts<'_>, problems: &mut Vec<QueryProblem>) {
    if parts.output_columns.is_empty() {
        problems.push(QueryProblem::MissingOutputColumns);
    }
    if parts.filter_logic_type != FilterLogicType::Custom {
        return;
    }

    let logic = parts.filter_logic_string.trim();
    if logic.is_empty() {
        problems.push(QueryProblem::MissingLogicString);
    } else if let Err(error) = parse_logic(logic, parts.filters.len()) {
        problems.push(QueryProblem::InvalidLogicString(error));
    }
}

fn crosstab_problems(parts: &QueryParts<'_>, problems: &mut Vec<QueryProblem>) {
    if parts.crosstab_function.is_none() {
        problems.push(QueryProblem::MissingCrosstabFunction);
    }
    if parts.crosstab_subject_var.trim().is_empty() {
        problems.push(QueryProblem::MissingCrosstabSubjectVar);
    }
    if parts.crosstab_row_var.trim().is_empty() {
        problems.push(QueryProblem::MissingCrosstabRowVar);
    }
    if parts.crosstab_col_var.trim().is_empty() {
        problems.push(QueryProblem::MissingCrosstabColumnVar);
    }
}

fn column_problems(
    parts: &QueryParts<'_>,
    table: &TableMetadata,
    problems: &mut Vec<QueryProblem>,
) {
    let mut check = |role: ColumnRole, column: &str| {
        if !column.trim().is_empty() && !table.has_column(column) {
            problems.push(QueryProblem::UnknownColumn {
                role,
                column: column.to_string(),
            });
        }
    };

    match parts.query_type {
        QueryType::Raw => {
            for column in parts.output_columns {
                check(ColumnRole::Output, column);
            }
            for column in parts.order_by {
                check(ColumnRole::Sort, column);
            }
            for column in parts.order_by {
                if table.column(column).is_some_and(|found| !found.can_sort()) {
                    problems.push(QueryProblem::ColumnNotSortable {
                        column: column.clone(),
                    });
                }
            }
        }
        QueryType::Crosstab => {
            let counts_records = parts.crosstab_function == Some(CrosstabFunction::Count)
                && parts.crosstab_subject_var == ALL_RECORDS_SUBJECT;
            if !counts_records {
                check(ColumnRole::CrosstabSubject, parts.crosstab_subject_var);
            }
            check(ColumnRole::CrosstabRow, parts.crosstab_row_var);
            check(ColumnRole::CrosstabColumn, parts.crosstab_col_var);
        }
    }
}
