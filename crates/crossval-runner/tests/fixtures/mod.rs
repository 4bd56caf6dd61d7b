//! Shared fixtures for runner tests: two memory databases and a suite

use crossval_catalog::{MemoryConnector, MemoryConnectorBuilder};
use crossval_core::{ColumnSchema, Row, TableSchema, Value};
use crossval_runner::{DatabaseRef, StaticProvider};
use std::sync::Arc;

pub fn dev() -> DatabaseRef {
    DatabaseRef::new("HR", "DEV")
}

pub fn qa() -> DatabaseRef {
    DatabaseRef::new("HR", "QA")
}

fn row(id: i64, name: &str, amount: i64, status: &str) -> Row {
    let mut row = Row::new();
    row.insert("id".to_string(), Value::Int(id));
    row.insert("name".to_string(), Value::text(name));
    row.insert("amount".to_string(), Value::Int(amount));
    row.insert("status".to_string(), Value::text(status));
    row
}

fn orders_schema(name_type: &str) -> TableSchema {
    TableSchema::from_columns(vec![
        ColumnSchema::new("id", "integer").with_nullable(false),
        ColumnSchema::new("name", name_type),
        ColumnSchema::new("amount", "integer"),
        ColumnSchema::new("status", "varchar(10)"),
    ])
    .unwrap()
}

/// DEV: 100 orders, 80 active
pub fn dev_connector() -> MemoryConnector {
    let rows = vec![row(1, "a", 10, "ACTIVE"), row(2, "b", 20, "ACTIVE"), row(3, "c", 30, "CLOSED")];
    MemoryConnectorBuilder::new()
        .with_table("sales.orders", orders_schema("varchar(20)"), rows)
        .with_row_count("sales.orders", None, 100)
        .with_row_count("sales.orders", Some("status = 'ACTIVE'"), 80)
        .build()
}

/// QA: 103 orders, 80 active, one amount drifted
pub fn qa_connector() -> MemoryConnector {
    let rows = vec![row(1, "a", 10, "ACTIVE"), row(2, "b", 21, "ACTIVE"), row(3, "c", 30, "CLOSED")];
    MemoryConnectorBuilder::new()
        .with_table("sales.orders", orders_schema("text"), rows)
        .with_row_count("sales.orders", None, 103)
        .with_row_count("sales.orders", Some("status = 'ACTIVE'"), 80)
        .build()
}

pub fn provider() -> StaticProvider {
    StaticProvider::new()
        .with_connector(dev(), Arc::new(dev_connector()))
        .with_connector(qa(), Arc::new(qa_connector()))
}

pub const SUITE: &str = r#"
name = "orders migration"

[[test]]
id = "SCHEMA_001"
name = "Orders schema"
category = "SCHEMA_VALIDATION"
source = { application = "HR", environment = "DEV" }
target = { application = "HR", environment = "QA" }
parameters = "source_table=sales.orders;target_table=sales.orders"

[[test]]
id = "COUNT_001"
name = "Orders count within 5%"
category = "ROW_COUNT_VALIDATION"
source = { application = "HR", environment = "DEV" }
target = { application = "HR", environment = "QA" }
source_table = "sales.orders"
target_table = "sales.orders"
parameters = "tolerance=5%"

[[test]]
id = "COUNT_NEG_001"
name = "Exact count fails as expected"
category = "ROW_COUNT_VALIDATION"
expected = "FAIL"
source = { application = "HR", environment = "DEV" }
target = { application = "HR", environment = "QA" }
parameters = "source_table=sales.orders,target_table=sales.orders"

[[test]]
id = "COUNT_WHERE_001"
name = "Active orders match"
category = "ROW_COUNT_VALIDATION"
source = { application = "HR", environment = "DEV" }
target = { application = "HR", environment = "QA" }
parameters = "source_table=sales.orders;target_table=sales.orders;source_where=WHERE status = 'ACTIVE';target_where=status = 'ACTIVE'"

[[test]]
id = "COLUMN_001"
name = "Order amounts"
category = "COL_COL_VALIDATION"
source = { application = "HR", environment = "DEV" }
target = { application = "HR", environment = "QA" }
parameters = "source_table=sales.orders;target_table=sales.orders;key_column=id;compare_columns=name|amount"

[[test]]
id = "SMOKE_001"
name = "Smoke"
category = "SMOKE_TEST"
source = { application = "HR", environment = "DEV" }
target = { application = "HR", environment = "QA" }

[[test]]
id = "OFF_001"
name = "Disabled"
category = "SCHEMA_VALIDATION"
enabled = false
source = { application = "HR", environment = "DEV" }
target = { application = "HR", environment = "QA" }
parameters = "source_table=sales.orders;target_table=sales.orders"
"#;
