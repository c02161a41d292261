use anyhow::Result;
use clap::{Args, ValueEnum};
use serde_json::{Value, json};

use crate::models::{CommandEnvelope, CrosstabFunction, DataCategory, TableMetadata};
use crate::operators::{crosstab_subject_options, operators_for_category, value_input_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    Text,
    EnumerableText,
    Integer,
    Float,
    Boolean,
    Date,
}

impl From<CategoryArg> for DataCategory {
    fn from(category: CategoryArg) -> Self {
        match category {
            CategoryArg::Text => Self::Text,
            CategoryArg::EnumerableText => Self::EnumerableText,
            CategoryArg::Integer => Self::Integer,
            CategoryArg::Float => Self::Float,
            CategoryArg::Boolean => Self::Boolean,
            CategoryArg::Date => Self::Date,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct OperatorsArgs {
    #[arg(value_enum, value_name = "CATEGORY")]
    pub category: CategoryArg,
}

pub fn run(args: &OperatorsArgs) -> Result<()> {
    let category = DataCategory::from(args.category);
    println!("operators: start category={category:?}");

    let operators: Vec<Value> = operators_for_category(category)
        .iter()
        .map(|operator| {
            json!({
                "operator": operator.as_str(),
                "label": operator.label(),
                "value_input": value_input_for(category, *operator),
            })
        })
        .collect();

    // Count's subject is table independent; the numeric functions list
    // aggregable columns once a table is known.
    let empty_table = TableMetadata::new("", Vec::new());
    let crosstab_functions: Vec<Value> = CrosstabFunction::ALL
        .iter()
        .map(|function| {
            json!({
                "function": function,
                "needs_numeric_subject": function.needs_numeric_subject(),
                "fixed_subjects": crosstab_subject_options(*function, &empty_table),
            })
        })
        .collect();

    let envelope = CommandEnvelope::ok(
        "operators",
        json!({
            "category": category,
            "operators": operators,
        }),
    )
    .with_meta("crosstab_functions", json!(crosstab_functions));
    super::emit(&envelope)
}
