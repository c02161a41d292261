use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::column::DataCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Operator {
    Equals,
    DoesNotEqual,
    StartsWith,
    EndsWith,
    Contains,
    DoesNotContain,
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,
    IsNull,
    IsNotNull,
    IsAnyOf,
}

impl Operator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::DoesNotEqual => "DoesNotEqual",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::Contains => "Contains",
            Self::DoesNotContain => "DoesNotContain",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEqualTo => "GreaterThanOrEqualTo",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqualTo => "LessThanOrEqualTo",
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
            Self::IsAnyOf => "IsAnyOf",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Equals => "Equals",
            Self::DoesNotEqual => "Does Not Equal",
            Self::StartsWith => "Starts With",
            Self::EndsWith => "Ends With",
            Self::Contains => "Contains",
            Self::DoesNotContain => "Does Not Contain",
            Self::GreaterThan => "Greater Than",
            Self::GreaterThanOrEqualTo => "Greater Than Or Equal To",
            Self::LessThan => "Less Than",
            Self::LessThanOrEqualTo => "Less Than Or Equal To",
            Self::IsNull => "Is Null",
            Self::IsNotNull => "Is Not Null",
            Self::IsAnyOf => "Is Any Of",
        }
    }

    #[must_use]
    pub const fn is_null_test(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operand of a filter as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FilterValue {
    #[default]
    Null,
    Bool(bool),
    Number(#[schemars(with = "f64")] serde_json::Number),
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::List(values) => values.is_empty(),
            Self::Text(text) => text.trim().is_empty(),
            Self::Bool(_) | Self::Number(_) => false,
        }
    }

    /// Text form of the value; lists are joined with commas.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::Text(text) => text.clone(),
            Self::List(values) => values.join(","),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterIssue {
    MissingColumn,
    MissingOperator,
    MissingValue,
    InvalidInteger,
    InvalidFloat,
}

impl FilterIssue {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::MissingColumn => "missing_column",
            Self::MissingOperator => "missing_operator",
            Self::MissingValue => "missing_value",
            Self::InvalidInteger => "invalid_integer",
            Self::InvalidFloat => "invalid_float",
        }
    }
}

impl Display for FilterIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            Self::MissingColumn => "You did not specify which column to filter on.",
            Self::MissingOperator => "Filter has no operator.",
            Self::MissingValue => "Filter has no value.",
            Self::InvalidInteger => "Invalid integer. The value should be a whole number.",
            Self::InvalidFloat => "Invalid decimal number.",
        };
        f.write_str(message)
    }
}

impl std::error::Error for FilterIssue {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Filter {
    pub column: String,

    #[serde(default, with = "super::blank")]
    #[schemars(with = "String")]
    pub operator: Option<Operator>,

    #[serde(default)]
    pub value: FilterValue,
}

impl Filter {
    #[must_use]
    pub fn new(column: impl Into<String>, operator: Operator, value: FilterValue) -> Self {
        Self {
            column: column.into(),
            operator: Some(operator),
            value,
        }
    }

    #[must_use]
    pub fn equals(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(column, Operator::Equals, FilterValue::text(value))
    }

    /// Plain `{column, operator, value}` copy of this filter.
    #[must_use]
    pub fn summary(&self) -> Filter {
        self.clone()
    }

    /// Checks the filter against the data category of its column.
    pub fn validate(&self, category: DataCategory) -> Result<(), FilterIssue> {
        if self.column.trim().is_empty() {
            return Err(FilterIssue::MissingColumn);
        }
        let Some(operator) = self.operator else {
            return Err(FilterIssue::MissingOperator);
        };
        if operator.is_null_test() {
            return Ok(());
        }

        if self.value.is_empty() && !category.supplies_own_value() {
            return Err(FilterIssue::MissingValue);
        }

        let operands = self.operands(operator);
        match category {
            DataCategory::Integer => {
                if operands.iter().all(|operand| is_whole_number(operand)) {
                    Ok(())
                } else {
                    Err(FilterIssue::InvalidInteger)
                }
            }
            DataCategory::Float => {
                if operands.iter().all(|operand| is_decimal_number(operand)) {
                    Ok(())
                } else {
                    Err(FilterIssue::InvalidFloat)
                }
            }
            _ => Ok(()),
        }
    }

    fn operands(&self, operator: Operator) -> Vec<String> {
        let rendered = self.value.render();
        if operator == Operator::IsAnyOf {
            rendered.split(',').map(ToString::to_string).collect()
        } else {
            vec![rendered]
        }
    }
}

fn is_whole_number(operand: &str) -> bool {
    let trimmed = operand.trim();
    trimmed
        .parse::<i64>()
        .is_ok_and(|parsed| parsed.to_string() == trimmed)
}

fn is_decimal_number(operand: &str) -> bool {
    operand
        .trim()
        .parse::<f64>()
        .is_ok_and(|parsed| parsed.is_finite())
}
