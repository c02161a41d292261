mod common;

use reportkit::ReportError;
use reportkit::drilldown::{CrosstabCell, DrillDownRequest, ROLL_UP_MARKER, derive_drill_down};
use reportkit::logic::validate_logic;
use reportkit::models::{Filter, FilterLogicType, FilterValue, Operator, QueryType};
use reportkit::service::{ResultColumn, ResultRow, RunQueryResponse};
use serde_json::json;

use common::{crosstab_query, employees_table, raw_query};

fn drill(row: &str, col: &str) -> reportkit::models::Query {
    let original = crosstab_query();
    let request = DrillDownRequest::for_query(&original, CrosstabCell::new(row, col));
    derive_drill_down(&original, &employees_table(), &request).expect("drill-down should derive")
}

#[test]
fn clicked_cell_adds_column_then_row_filter() {
    let derived = drill("CA", "Simpsons");

    assert_eq!(derived.query_type, QueryType::Raw);
    assert_eq!(derived.filter_logic_type, FilterLogicType::Custom);
    assert_eq!(
        derived.filters,
        vec![
            Filter::new("OnLeave", Operator::DoesNotEqual, FilterValue::text("true")),
            Filter::new("OrgName", Operator::Equals, FilterValue::text("Simpsons")),
            Filter::new("State", Operator::Equals, FilterValue::text("CA")),
        ]
    );
    assert_eq!(derived.filter_logic_string, "(1) AND 2 AND 3");
    assert_eq!(validate_logic(&derived.filter_logic_string, 3), Ok(()));
}

#[test]
fn derived_query_selects_every_column_from_the_start() {
    let mut original = crosstab_query();
    original.offset = 150;
    original.is_bound_to_ui = true;
    let request = DrillDownRequest::for_query(&original, CrosstabCell::new("CA", "Simpsons"));

    let derived =
        derive_drill_down(&original, &employees_table(), &request).expect("should derive");

    assert_eq!(derived.offset, 0);
    assert!(!derived.is_bound_to_ui);
    assert_eq!(
        derived.output_columns,
        vec!["Name", "OrgName", "State", "Age", "Salary", "OnLeave", "HireDate"]
    );
    assert_eq!(derived.database, original.database);
    assert_eq!(derived.table, original.table);
}

#[test]
fn roll_up_column_adds_only_the_row_filter() {
    let derived = drill("CA", ROLL_UP_MARKER);

    assert_eq!(derived.filters.len(), 2);
    assert_eq!(derived.filters[1], Filter::equals("State", "CA"));
    assert_eq!(derived.filter_logic_string, "(1) AND 2");
}

#[test]
fn roll_up_on_both_axes_keeps_only_the_original_filters() {
    let derived = drill(ROLL_UP_MARKER, ROLL_UP_MARKER);

    assert_eq!(derived.filters.len(), 1);
    assert_eq!(derived.filter_logic_type, FilterLogicType::Custom);
    assert_eq!(derived.filter_logic_string, "(1)");
}

#[test]
fn crosstab_without_filters_gets_plain_conjuncts() {
    let mut original = crosstab_query();
    original.filters.clear();
    let request = DrillDownRequest::for_query(&original, CrosstabCell::new("NV", "Burns"));

    let derived =
        derive_drill_down(&original, &employees_table(), &request).expect("should derive");

    assert_eq!(derived.filter_logic_string, "1 AND 2");

    let total = DrillDownRequest::for_query(
        &original,
        CrosstabCell::new(ROLL_UP_MARKER, ROLL_UP_MARKER),
    );
    let derived = derive_drill_down(&original, &employees_table(), &total).expect("should derive");
    assert!(derived.filters.is_empty());
    assert_eq!(derived.filter_logic_type, FilterLogicType::MatchAll);
    assert_eq!(derived.filter_logic_string, "");
}

#[test]
fn match_any_and_custom_logic_are_wrapped() {
    let mut any = crosstab_query();
    any.filters.push(Filter::equals("State", "NV"));
    any.filter_logic_type = FilterLogicType::MatchAny;
    let request = DrillDownRequest::for_query(&any, CrosstabCell::new("CA", "Simpsons"));
    let derived = derive_drill_down(&any, &employees_table(), &request).expect("should derive");
    assert_eq!(derived.filter_logic_string, "(1 OR 2) AND 3 AND 4");

    let mut custom = any.clone();
    custom.filter_logic_type = FilterLogicType::Custom;
    custom.filter_logic_string = "1 OR 2".to_string();
    let derived = derive_drill_down(&custom, &employees_table(), &request).expect("should derive");
    assert_eq!(derived.filter_logic_string, "(1 OR 2) AND 3 AND 4");
    assert_eq!(validate_logic(&derived.filter_logic_string, 4), Ok(()));
}

#[test]
fn custom_roll_up_marker_is_honored() {
    let original = crosstab_query();
    let request = DrillDownRequest::for_query(&original, CrosstabCell::new("CA", "Total"))
        .with_roll_up_marker("Total");

    let derived =
        derive_drill_down(&original, &employees_table(), &request).expect("should derive");

    assert_eq!(derived.filters.len(), 2);
    assert_eq!(derived.filters[1].column, "State");
}

#[test]
fn raw_queries_cannot_be_drilled() {
    let original = raw_query();
    let request = DrillDownRequest::new("State", "OrgName", CrosstabCell::new("CA", "Simpsons"));

    match derive_drill_down(&original, &employees_table(), &request) {
        Err(ReportError::NotCrosstab) => {}
        other => panic!("expected not-crosstab refusal, got {other:?}"),
    }
}

#[test]
fn cells_resolve_from_crosstab_results() {
    let mut row = ResultRow::new();
    row.insert("State".to_string(), json!("CA"));
    row.insert("Simpsons".to_string(), json!(4));
    let mut null_row = ResultRow::new();
    null_row.insert("State".to_string(), json!(null));
    let response = RunQueryResponse::ok(
        vec![row, null_row],
        vec![ResultColumn::new("State"), ResultColumn::new("Simpsons")],
    );

    assert_eq!(CrosstabCell::from_results(&response, 0, 0, "State"), None);
    assert_eq!(
        CrosstabCell::from_results(&response, 0, 1, "State"),
        Some(CrosstabCell::new("CA", "Simpsons"))
    );
    assert_eq!(
        CrosstabCell::from_results(&response, 1, 1, "State"),
        Some(CrosstabCell::new("", "Simpsons"))
    );
    assert_eq!(CrosstabCell::from_results(&response, 5, 1, "State"), None);
}
