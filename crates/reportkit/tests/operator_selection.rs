mod common;

use reportkit::models::{ColumnDescriptor, CrosstabFunction, DataCategory, DataType, Operator};
use reportkit::operators::{
    ValueInput, boolean_options, crosstab_axis_options, crosstab_subject_options,
    default_operator, operator_allowed, operators_for, operators_for_category,
    output_column_options, sort_column_options, value_input_for,
};

use common::employees_table;

#[test]
fn is_any_of_is_offered_only_for_enumerable_text() {
    assert!(operator_allowed(
        DataCategory::EnumerableText,
        Operator::IsAnyOf
    ));
    for category in [
        DataCategory::Text,
        DataCategory::Integer,
        DataCategory::Float,
        DataCategory::Boolean,
        DataCategory::Date,
    ] {
        assert!(
            !operator_allowed(category, Operator::IsAnyOf),
            "IsAnyOf should not be offered for {category:?}"
        );
    }
}

#[test]
fn ordered_categories_get_comparisons_but_not_text_matching() {
    for category in [DataCategory::Integer, DataCategory::Float, DataCategory::Date] {
        let operators = operators_for_category(category);
        assert!(operators.contains(&Operator::GreaterThanOrEqualTo));
        assert!(operators.contains(&Operator::LessThan));
        assert!(!operators.contains(&Operator::Contains));
        assert!(!operators.contains(&Operator::StartsWith));
    }
}

#[test]
fn boolean_columns_only_compare_for_equality_or_null() {
    assert_eq!(
        operators_for_category(DataCategory::Boolean),
        &[
            Operator::Equals,
            Operator::DoesNotEqual,
            Operator::IsNull,
            Operator::IsNotNull,
        ]
    );
}

#[test]
fn every_category_starts_on_equals() {
    for category in [
        DataCategory::Text,
        DataCategory::EnumerableText,
        DataCategory::Integer,
        DataCategory::Float,
        DataCategory::Boolean,
        DataCategory::Date,
    ] {
        assert_eq!(default_operator(category), Operator::Equals);
    }
}

#[test]
fn column_descriptors_pick_their_category_operators() {
    let table = employees_table();
    let state = table.column("State").expect("State column should exist");
    let name = table.column("Name").expect("Name column should exist");

    assert_eq!(state.category(), DataCategory::EnumerableText);
    assert!(operators_for(state).contains(&Operator::IsAnyOf));
    assert_eq!(name.category(), DataCategory::Text);
    assert!(!operators_for(name).contains(&Operator::IsAnyOf));
}

#[test]
fn value_controls_follow_category_and_operator() {
    assert_eq!(
        value_input_for(DataCategory::Text, Operator::IsNull),
        ValueInput::None
    );
    assert_eq!(
        value_input_for(DataCategory::EnumerableText, Operator::IsAnyOf),
        ValueInput::MultiSelect
    );
    assert_eq!(
        value_input_for(DataCategory::EnumerableText, Operator::Equals),
        ValueInput::SingleSelect
    );
    assert_eq!(
        value_input_for(DataCategory::EnumerableText, Operator::Contains),
        ValueInput::FreeText
    );
    assert_eq!(
        value_input_for(DataCategory::Boolean, Operator::DoesNotEqual),
        ValueInput::BooleanSelect
    );
    assert_eq!(
        value_input_for(DataCategory::Date, Operator::GreaterThan),
        ValueInput::DatePicker
    );
    assert!(ValueInput::MultiSelect.needs_distinct_values());
    assert!(!ValueInput::FreeText.needs_distinct_values());
}

#[test]
fn boolean_control_offers_true_then_false() {
    let values: Vec<String> = boolean_options()
        .into_iter()
        .map(|option| option.value)
        .collect();
    assert_eq!(values, vec!["true".to_string(), "false".to_string()]);
}

#[test]
fn count_aggregates_all_records_while_other_functions_need_numbers() {
    let table = employees_table();

    let count = crosstab_subject_options(CrosstabFunction::Count, &table);
    assert_eq!(count.len(), 1);
    assert_eq!(count[0].value, "*");

    let average: Vec<String> = crosstab_subject_options(CrosstabFunction::Average, &table)
        .into_iter()
        .map(|option| option.value)
        .collect();
    assert_eq!(average, vec!["Age".to_string(), "Salary".to_string()]);
}

#[test]
fn column_choices_follow_descriptor_flags() {
    let mut table = employees_table();
    table.column_descriptors.extend([
        ColumnDescriptor::new("Notes", DataType::Text).with_flags(false, true),
        ColumnDescriptor::new("Badge", DataType::Integer).with_flags(true, false),
        ColumnDescriptor::new("Ssn", DataType::Text).hidden_from_results(),
    ]);
    let values = |options: Vec<reportkit::models::ListOption>| -> Vec<String> {
        options.into_iter().map(|option| option.value).collect()
    };

    let output = values(output_column_options(&table));
    assert!(output.contains(&"Notes".to_string()));
    assert!(output.contains(&"Badge".to_string()));
    assert!(!output.contains(&"Ssn".to_string()));

    let sort = values(sort_column_options(&table));
    assert!(sort.contains(&"Badge".to_string()));
    assert!(!sort.contains(&"Notes".to_string()));
    assert!(!sort.contains(&"Ssn".to_string()));

    let axes = values(crosstab_axis_options(&table));
    assert!(axes.contains(&"Notes".to_string()));
    assert!(!axes.contains(&"Badge".to_string()));
    assert!(!axes.contains(&"Ssn".to_string()));

    let org = crosstab_axis_options(&table)
        .into_iter()
        .find(|option| option.value == "OrgName")
        .expect("OrgName should be groupable");
    assert_eq!(org.label, "Organization");
}

#[test]
fn descriptor_flags_default_to_shown_but_unsorted() {
    let column: ColumnDescriptor = serde_json::from_value(serde_json::json!({
        "Name": "Age",
        "UIDataType": 1
    }))
    .expect("descriptor should decode");

    assert!(column.display_in_results);
    assert!(!column.can_sort());
    assert!(!column.can_group());
}
