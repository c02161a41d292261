#![allow(dead_code)]

use std::cell::RefCell;

use reportkit::ServiceError;
use reportkit::models::{
    ColumnDescriptor, CrosstabFunction, DataType, Filter, FilterValue, ListOption, Operator,
    Query, QueryType, SavedQuery, TableMetadata,
};
use reportkit::service::{
    ReportService, ResultColumn, ResultRow, RunQueryResponse, SavedQueryStore,
};
use serde_json::json;

pub const DATABASE: &str = "hr";
pub const TABLE: &str = "employees";

pub fn employees_table() -> TableMetadata {
    TableMetadata::new(
        TABLE,
        vec![
            ColumnDescriptor::new("Name", DataType::Text),
            ColumnDescriptor::new("OrgName", DataType::Text)
                .with_display_name("Organization")
                .enumerable(),
            ColumnDescriptor::new("State", DataType::Text).enumerable(),
            ColumnDescriptor::new("Age", DataType::Integer),
            ColumnDescriptor::new("Salary", DataType::Float),
            ColumnDescriptor::new("OnLeave", DataType::Boolean),
            ColumnDescriptor::new("HireDate", DataType::Date),
        ],
    )
}

pub fn raw_query() -> Query {
    let mut query = Query::new(DATABASE, TABLE);
    query.output_columns = vec!["Name".to_string(), "State".to_string()];
    query.filters = vec![Filter::new("Age", Operator::GreaterThan, FilterValue::text("30"))];
    query
}

/// The crosstab the drill-down scenarios start from.
pub fn crosstab_query() -> Query {
    let mut query = Query::new(DATABASE, TABLE);
    query.query_type = QueryType::Crosstab;
    query.filters = vec![Filter::new(
        "OnLeave",
        Operator::DoesNotEqual,
        FilterValue::text("true"),
    )];
    query.crosstab_function = Some(CrosstabFunction::Count);
    query.crosstab_subject_var = "*".to_string();
    query.crosstab_row_var = "State".to_string();
    query.crosstab_col_var = "OrgName".to_string();
    query
}

pub fn rows(count: usize) -> Vec<ResultRow> {
    (0..count)
        .map(|index| {
            let mut row = ResultRow::new();
            row.insert("Name".to_string(), json!(format!("person-{index}")));
            row
        })
        .collect()
}

/// Service double that records every request it receives.
#[derive(Default)]
pub struct FakeService {
    pub table: Option<TableMetadata>,
    pub rows_per_run: usize,
    pub failure: Option<String>,
    pub run_calls: RefCell<Vec<Query>>,
    pub distinct_calls: RefCell<Vec<(String, String, String)>>,
    pub export_calls: RefCell<Vec<Query>>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            table: Some(employees_table()),
            rows_per_run: 3,
            ..Self::default()
        }
    }

    pub fn with_rows_per_run(mut self, rows_per_run: usize) -> Self {
        self.rows_per_run = rows_per_run;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    pub fn run_count(&self) -> usize {
        self.run_calls.borrow().len()
    }

    pub fn last_run(&self) -> Option<Query> {
        self.run_calls.borrow().last().cloned()
    }
}

impl ReportService for FakeService {
    fn table_metadata(&self, _database: &str, table: &str) -> Result<TableMetadata, ServiceError> {
        self.table
            .clone()
            .filter(|metadata| metadata.name == table)
            .ok_or_else(|| ServiceError::new(format!("unknown table {table}")))
    }

    fn distinct_values(
        &self,
        database: &str,
        table: &str,
        column: &str,
    ) -> Result<Vec<ListOption>, ServiceError> {
        self.distinct_calls.borrow_mut().push((
            database.to_string(),
            table.to_string(),
            column.to_string(),
        ));
        Ok(vec![
            ListOption::new(format!("{column} A"), "a"),
            ListOption::new(format!("{column} B"), "b"),
        ])
    }

    fn run_query(&self, query: &Query) -> Result<RunQueryResponse, ServiceError> {
        self.run_calls.borrow_mut().push(query.clone());
        if let Some(message) = &self.failure {
            return Ok(RunQueryResponse::error(message.clone()));
        }
        Ok(RunQueryResponse::ok(
            rows(self.rows_per_run),
            vec![ResultColumn::new("Name")],
        ))
    }

    fn export_query(&self, query: &Query) -> Result<Vec<u8>, ServiceError> {
        self.export_calls.borrow_mut().push(query.clone());
        Ok(b"Name\nperson-0\n".to_vec())
    }
}

/// In-memory saved-query store acting as the owning user.
#[derive(Default)]
pub struct MemoryStore {
    pub saved: RefCell<Vec<SavedQuery>>,
    next_id: RefCell<u64>,
}

impl MemoryStore {
    pub fn with(saved: Vec<SavedQuery>) -> Self {
        Self {
            saved: RefCell::new(saved),
            next_id: RefCell::new(100),
        }
    }
}

impl SavedQueryStore for MemoryStore {
    fn list(&self, database: &str) -> Result<Vec<SavedQuery>, ServiceError> {
        Ok(self
            .saved
            .borrow()
            .iter()
            .filter(|saved| saved.query.database == database)
            .cloned()
            .collect())
    }

    fn get(&self, id: &str) -> Result<Option<SavedQuery>, ServiceError> {
        Ok(self
            .saved
            .borrow()
            .iter()
            .find(|saved| saved.id.as_deref() == Some(id))
            .cloned())
    }

    fn create(&self, saved: &SavedQuery) -> Result<SavedQuery, ServiceError> {
        let mut next_id = self.next_id.borrow_mut();
        *next_id += 1;
        let mut stored = saved.clone();
        stored.id = Some(format!("sq-{next_id}"));
        self.saved.borrow_mut().push(stored.clone());
        Ok(stored)
    }

    fn update(&self, saved: &SavedQuery) -> Result<SavedQuery, ServiceError> {
        let mut all = self.saved.borrow_mut();
        let existing = all
            .iter_mut()
            .find(|existing| existing.id == saved.id)
            .ok_or_else(|| ServiceError::new("no such saved query"))?;
        *existing = saved.clone();
        Ok(saved.clone())
    }

    fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let mut all = self.saved.borrow_mut();
        let before = all.len();
        all.retain(|saved| saved.id.as_deref() != Some(id));
        if all.len() == before {
            return Err(ServiceError::new("no such saved query"));
        }
        Ok(())
    }
}

pub fn saved(id: &str, name: &str, query: Query) -> SavedQuery {
    SavedQuery {
        id: Some(id.to_string()),
        name: name.to_string(),
        description: String::new(),
        is_shared: false,
        user_is_owner: true,
        query,
    }
}
