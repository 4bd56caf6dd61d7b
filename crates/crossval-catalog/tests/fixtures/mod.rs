//! Test fixtures for connector integration tests
//!
//! A small HR dataset present in two "databases": the legacy source and a
//! migrated target where a few columns were renamed or widened.

use chrono::NaiveDateTime;
use crossval_catalog::{MemoryConnector, MemoryConnectorBuilder};
use crossval_core::{ColumnSchema, Row, TableSchema, Value};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Source employees table
pub fn source_employees_schema() -> TableSchema {
    TableSchema::from_columns(vec![
        ColumnSchema::new("emp_id", "integer").with_nullable(false),
        ColumnSchema::new("emp_name", "varchar(50)").with_nullable(false),
        ColumnSchema::new("salary", "numeric(10,2)"),
        ColumnSchema::new("hired_at", "timestamp"),
        ColumnSchema::new("dept", "varchar(20)"),
    ])
    .unwrap()
}

/// Target employees table: `emp_name` renamed to `full_name`, widened types
pub fn target_employees_schema() -> TableSchema {
    TableSchema::from_columns(vec![
        ColumnSchema::new("emp_id", "bigint").with_nullable(false),
        ColumnSchema::new("full_name", "text").with_nullable(false),
        ColumnSchema::new("salary", "numeric(10,2)"),
        ColumnSchema::new("hired_at", "timestamptz"),
        ColumnSchema::new("dept", "varchar(40)"),
    ])
    .unwrap()
}

fn decimal(s: &str) -> Value {
    Value::Decimal(Decimal::from_str(s).unwrap())
}

fn employee(id: i64, name_col: &str, name: &str, salary: &str, hired: &str, dept: &str) -> Row {
    let mut row = Row::new();
    row.insert("emp_id".to_string(), Value::Int(id));
    row.insert(name_col.to_string(), Value::text(name));
    row.insert("salary".to_string(), decimal(salary));
    let hired = NaiveDateTime::parse_from_str(hired, "%Y-%m-%d %H:%M:%S").unwrap();
    row.insert("hired_at".to_string(), Value::Timestamp(hired));
    row.insert("dept".to_string(), Value::text(dept));
    row
}

/// Source side rows
pub fn source_rows() -> Vec<Row> {
    vec![
        employee(1, "emp_name", "Ada", "5000.00", "2020-01-01 09:00:00", "IT"),
        employee(2, "emp_name", "Grace", "6100.50", "2019-03-15 08:30:00", "IT"),
        employee(3, "emp_name", "Linus", "4200.00", "2021-07-01 10:00:00", "OPS"),
    ]
}

/// Target side rows: salary of 2 drifted by 0.50, hire date of 3 by 12 hours
pub fn target_rows() -> Vec<Row> {
    vec![
        employee(1, "full_name", "ada ", "5000.00", "2020-01-01 09:00:00", "IT"),
        employee(2, "full_name", "Grace", "6101.00", "2019-03-15 08:30:00", "IT"),
        employee(3, "full_name", "Linus", "4200.00", "2021-07-01 22:00:00", "OPS"),
    ]
}

/// Source connector holding `hr.employees`
pub fn source_connector() -> MemoryConnector {
    MemoryConnectorBuilder::new()
        .with_name("legacy")
        .with_table("hr.employees", source_employees_schema(), source_rows())
        .with_view("hr.employees", "dept = 'IT'", source_rows().into_iter().take(2).collect())
        .build()
}

/// Target connector holding `hr.employees`
pub fn target_connector() -> MemoryConnector {
    MemoryConnectorBuilder::new()
        .with_name("migrated")
        .with_table("hr.employees", target_employees_schema(), target_rows())
        .with_view("hr.employees", "dept = 'IT'", target_rows().into_iter().take(2).collect())
        .build()
}
