//! Operator sets and value controls per column data category, and the
//! column choices a table's descriptor flags allow.

use serde::Serialize;

use crate::models::{
    ALL_RECORDS_SUBJECT, ColumnDescriptor, CrosstabFunction, DataCategory, ListOption, Operator,
    TableMetadata,
};

const TEXT_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::DoesNotEqual,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::IsNull,
    Operator::IsNotNull,
];

const ENUMERABLE_TEXT_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::DoesNotEqual,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::Contains,
    Operator::DoesNotContain,
    Operator::IsNull,
    Operator::IsNotNull,
    Operator::IsAnyOf,
];

const ORDERED_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::DoesNotEqual,
    Operator::GreaterThan,
    Operator::GreaterThanOrEqualTo,
    Operator::LessThan,
    Operator::LessThanOrEqualTo,
    Operator::IsNull,
    Operator::IsNotNull,
];

const BOOLEAN_OPERATORS: &[Operator] = &[
    Operator::Equals,
    Operator::DoesNotEqual,
    Operator::IsNull,
    Operator::IsNotNull,
];

/// Control used to edit a filter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueInput {
    None,
    FreeText,
    SingleSelect,
    MultiSelect,
    DatePicker,
    BooleanSelect,
}

impl ValueInput {
    /// Whether the control is populated from the column's distinct values.
    #[must_use]
    pub const fn needs_distinct_values(self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect)
    }
}

#[must_use]
pub fn operators_for_category(category: DataCategory) -> &'static [Operator] {
    match category {
        DataCategory::Text => TEXT_OPERATORS,
        DataCategory::EnumerableText => ENUMERABLE_TEXT_OPERATORS,
        DataCategory::Integer | DataCategory::Float | DataCategory::Date => ORDERED_OPERATORS,
        DataCategory::Boolean => BOOLEAN_OPERATORS,
    }
}

#[must_use]
pub fn operators_for(column: &ColumnDescriptor) -> &'static [Operator] {
    operators_for_category(column.category())
}

#[must_use]
pub fn operator_allowed(category: DataCategory, operator: Operator) -> bool {
    operators_for_category(category).contains(&operator)
}

/// The first operator offered for a column, selected when the column changes.
#[must_use]
pub fn default_operator(category: DataCategory) -> Operator {
    operators_for_category(category)
        .first()
        .copied()
        .unwrap_or(Operator::Equals)
}

#[must_use]
pub fn value_input_for(category: DataCategory, operator: Operator) -> ValueInput {
    if operator.is_null_test() {
        return ValueInput::None;
    }
    if operator == Operator::IsAnyOf {
        return ValueInput::MultiSelect;
    }

    match category {
        DataCategory::EnumerableText
            if matches!(operator, Operator::Equals | Operator::DoesNotEqual) =>
        {
            ValueInput::SingleSelect
        }
        DataCategory::Boolean => ValueInput::BooleanSelect,
        DataCategory::Date => ValueInput::DatePicker,
        _ => ValueInput::FreeText,
    }
}

/// Fixed choices offered by the boolean value control.
#[must_use]
pub fn boolean_options() -> Vec<ListOption> {
    vec![ListOption::new("True", "true"), ListOption::new("False", "false")]
}

/// Subject-variable choices for a crosstab function: Count aggregates
/// whole records, every other function needs an aggregable column.
#[must_use]
pub fn crosstab_subject_options(
    function: CrosstabFunction,
    table: &TableMetadata,
) -> Vec<ListOption> {
    if !function.needs_numeric_subject() {
        return vec![ListOption::new("All Matching Records", ALL_RECORDS_SUBJECT)];
    }

    column_options(table.aggregate_columns())
}

fn column_options<'a>(columns: impl Iterator<Item = &'a ColumnDescriptor>) -> Vec<ListOption> {
    columns
        .map(|column| ListOption::new(column.label(), column.name.clone()))
        .collect()
}

/// Columns a raw query may return.
#[must_use]
pub fn output_column_options(table: &TableMetadata) -> Vec<ListOption> {
    column_options(table.output_columns())
}

/// Columns a raw query may be ordered by.
#[must_use]
pub fn sort_column_options(table: &TableMetadata) -> Vec<ListOption> {
    column_options(table.sort_columns())
}

/// Row and column variable choices for a crosstab.
#[must_use]
pub fn crosstab_axis_options(table: &TableMetadata) -> Vec<ListOption> {
    column_options(table.grouping_columns())
}
