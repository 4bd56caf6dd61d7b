//! In-memory connector for tests and dry runs
//!
//! Tables are held in memory and served without touching a database.
//! Filters are not evaluated: a filtered count or sample is answered from a
//! view registered for that exact filter text (or a count override).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use crossval_catalog::{MemoryConnectorBuilder, Connector, TableRef};
//! use crossval_core::{ColumnSchema, TableSchema};
//!
//! let schema = TableSchema::from_columns(vec![
//!     ColumnSchema::new("id", "integer"),
//!     ColumnSchema::new("name", "text"),
//! ])?;
//! let connector = MemoryConnectorBuilder::new()
//!     .with_table("hr.employees", schema, rows)
//!     .with_view("hr.employees", "status = 'A'", active_rows)
//!     .build();
//!
//! let count = connector.get_row_count(&TableRef::parse("hr.employees")?, None).await?;
//! ```

use crate::connector::{Connector, ConnectorError, SampleQuery, TableRef};
use crossval_core::value::parse_datetime;
use crossval_core::{ColumnSchema, Row, TableSchema, Value};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// One stored table
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    pub schema: TableSchema,
    pub rows: Vec<Row>,

    /// Filter text to the rows that filter selects
    pub views: HashMap<String, Vec<Row>>,

    /// Filter text (empty for none) to a reported row count
    pub row_counts: HashMap<String, u64>,
}

impl MemoryTable {
    pub fn new(schema: TableSchema, rows: Vec<Row>) -> Self {
        Self {
            schema,
            rows,
            views: HashMap::new(),
            row_counts: HashMap::new(),
        }
    }

    fn rows_for(&self, table: &TableRef, filter: Option<&str>) -> Result<&[Row], ConnectorError> {
        match filter {
            None => Ok(&self.rows),
            Some(f) => self
                .views
                .get(&filter_key(Some(f)))
                .map(Vec::as_slice)
                .ok_or_else(|| {
                    ConnectorError::Unsupported(format!(
                        "no view registered for filter '{}' on {}",
                        f, table
                    ))
                }),
        }
    }
}

fn filter_key(filter: Option<&str>) -> String {
    filter
        .map(|f| f.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

/// Sort order for sampled values: numbers numerically, instants
/// chronologically, everything else by text, NULLs last
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    if let (Some(x), Some(y)) = (a.as_decimal(), b.as_decimal()) {
        return x.cmp(&y);
    }
    if a.is_temporal() || b.is_temporal() {
        if let (Some(x), Some(y)) = (a.as_datetime(), b.as_datetime()) {
            return x.cmp(&y);
        }
    }
    a.to_string().cmp(&b.to_string())
}

/// In-memory connector
///
/// Cloning shares the stored tables.
pub struct MemoryConnector {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,

    /// Errors to return for specific tables
    errors: Arc<RwLock<HashMap<String, ConnectorError>>>,

    /// Fail every operation as if the server were unreachable
    fail_connection: bool,

    /// Simulated query latency (milliseconds)
    latency_ms: u64,

    connector_name: String,
}

impl MemoryConnector {
    /// Create a connector with no tables
    pub fn new() -> Self {
        MemoryConnectorBuilder::new().build()
    }

    /// Add or replace a table
    pub async fn add_table(&self, table: &str, memory_table: MemoryTable) {
        self.tables.write().await.insert(table.to_string(), memory_table);
    }

    /// Configure an error to be returned for a specific table
    pub async fn add_error_for_table(&self, table: &str, error: ConnectorError) {
        self.errors.write().await.insert(table.to_string(), error);
    }

    /// Get the number of stored tables
    pub async fn table_count(&self) -> usize {
        self.tables.read().await.len()
    }

    /// Get all stored table names
    pub async fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Load tables from a JSON fixture file
    pub fn from_fixture_file(path: &std::path::Path) -> Result<Self, ConnectorError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConnectorError::Config(format!("cannot read fixture {}: {}", path.display(), e)))?;
        Self::from_fixture_json(&contents)
    }

    /// Load tables from JSON fixture text
    ///
    /// ```json
    /// { "tables": { "hr.employees": {
    ///     "columns": [{ "name": "id", "type": "integer", "nullable": false }],
    ///     "rows": [{ "id": 1 }],
    ///     "views": { "id > 0": [{ "id": 1 }] },
    ///     "row_counts": { "": 1000 }
    /// } } }
    /// ```
    pub fn from_fixture_json(json: &str) -> Result<Self, ConnectorError> {
        let fixture: Fixture = serde_json::from_str(json)
            .map_err(|e| ConnectorError::Config(format!("invalid fixture: {}", e)))?;

        let mut builder = MemoryConnectorBuilder::new().with_name("Memory (fixture)");
        for (name, table) in fixture.tables {
            let columns = table
                .columns
                .into_iter()
                .map(|c| {
                    ColumnSchema::new(c.name, &c.data_type)
                        .with_nullable(c.nullable)
                })
                .collect();
            let schema = TableSchema::from_columns(columns)
                .map_err(|e| ConnectorError::Config(format!("table {}: {}", name, e)))?;

            let mut memory_table = MemoryTable::new(schema.clone(), convert_rows(&schema, table.rows));
            for (filter, rows) in table.views {
                memory_table
                    .views
                    .insert(filter_key(Some(&filter)), convert_rows(&schema, rows));
            }
            for (filter, count) in table.row_counts {
                let key = if filter.trim().is_empty() { None } else { Some(filter.as_str()) };
                memory_table.row_counts.insert(filter_key(key), count);
            }
            builder = builder.with_memory_table(&name, memory_table);
        }

        Ok(builder.build())
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }

    /// Common preamble for every table operation
    async fn check(&self, table: &TableRef) -> Result<(), ConnectorError> {
        self.simulate_latency().await;

        if self.fail_connection {
            return Err(ConnectorError::Connection(
                "Simulated connection failure".to_string(),
            ));
        }

        if let Some(error) = self.errors.read().await.get(&table.fqn()) {
            return Err(error.clone());
        }

        Ok(())
    }

    async fn read_table<T>(
        &self,
        table: &TableRef,
        f: impl FnOnce(&MemoryTable) -> Result<T, ConnectorError>,
    ) -> Result<T, ConnectorError> {
        self.check(table).await?;
        let tables = self.tables.read().await;
        let stored = tables
            .get(&table.fqn())
            .ok_or_else(|| ConnectorError::SchemaNotFound(table.fqn()))?;
        f(stored)
    }
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryConnector {
    fn clone(&self) -> Self {
        Self {
            tables: Arc::clone(&self.tables),
            errors: Arc::clone(&self.errors),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            connector_name: self.connector_name.clone(),
        }
    }
}

#[async_trait::async_trait]
impl Connector for MemoryConnector {
    fn name(&self) -> &str {
        &self.connector_name
    }

    async fn get_table_schema(&self, table: &TableRef) -> Result<TableSchema, ConnectorError> {
        self.read_table(table, |t| Ok(t.schema.clone())).await
    }

    async fn get_row_count(&self, table: &TableRef, filter: Option<&str>) -> Result<u64, ConnectorError> {
        self.read_table(table, |t| {
            if let Some(count) = t.row_counts.get(&filter_key(filter)) {
                return Ok(*count);
            }
            Ok(t.rows_for(table, filter)?.len() as u64)
        })
        .await
    }

    async fn get_sample_data(&self, table: &TableRef, query: &SampleQuery) -> Result<Vec<Row>, ConnectorError> {
        self.read_table(table, |t| {
            let unknown = |column: &str| {
                ConnectorError::Query(format!("column \"{}\" does not exist in {}", column, table))
            };

            let mut rows: Vec<&Row> = t.rows_for(table, query.filter.as_deref())?.iter().collect();

            if let Some(order_by) = &query.order_by {
                if t.schema.find_column(order_by).is_none() {
                    return Err(unknown(order_by));
                }
                rows.sort_by(|a, b| {
                    compare_values(
                        a.get(order_by).unwrap_or(&Value::Null),
                        b.get(order_by).unwrap_or(&Value::Null),
                    )
                });
            }

            if let Some(missing) = query.columns.iter().find(|c| t.schema.find_column(c).is_none()) {
                return Err(unknown(missing));
            }

            let sample = rows
                .into_iter()
                .take(query.limit)
                .map(|row| {
                    if query.columns.is_empty() {
                        row.clone()
                    } else {
                        query
                            .columns
                            .iter()
                            .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
                            .collect()
                    }
                })
                .collect();
            Ok(sample)
        })
        .await
    }

    async fn test_connection(&self) -> Result<(), ConnectorError> {
        self.simulate_latency().await;

        if self.fail_connection {
            Err(ConnectorError::Connection(
                "Simulated connection failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Builder for creating a MemoryConnector with predefined tables
pub struct MemoryConnectorBuilder {
    tables: HashMap<String, MemoryTable>,
    errors: HashMap<String, ConnectorError>,
    fail_connection: bool,
    latency_ms: u64,
    connector_name: String,
}

impl MemoryConnectorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            errors: HashMap::new(),
            fail_connection: false,
            latency_ms: 0,
            connector_name: "Memory".to_string(),
        }
    }

    /// Add a table with its rows
    pub fn with_table(self, table: &str, schema: TableSchema, rows: Vec<Row>) -> Self {
        self.with_memory_table(table, MemoryTable::new(schema, rows))
    }

    /// Add a fully specified table
    pub fn with_memory_table(mut self, table: &str, memory_table: MemoryTable) -> Self {
        self.tables.insert(table.to_string(), memory_table);
        self
    }

    /// Register the rows a filter selects on an already added table
    pub fn with_view(mut self, table: &str, filter: &str, rows: Vec<Row>) -> Self {
        if let Some(t) = self.tables.get_mut(table) {
            t.views.insert(filter_key(Some(filter)), rows);
        }
        self
    }

    /// Report a fixed row count for a table and filter
    pub fn with_row_count(mut self, table: &str, filter: Option<&str>, count: u64) -> Self {
        if let Some(t) = self.tables.get_mut(table) {
            t.row_counts.insert(filter_key(filter), count);
        }
        self
    }

    /// Add an error for a specific table
    pub fn with_error(mut self, table: &str, error: ConnectorError) -> Self {
        self.errors.insert(table.to_string(), error);
        self
    }

    /// Configure connection failure
    pub fn with_connection_failure(mut self) -> Self {
        self.fail_connection = true;
        self
    }

    /// Configure latency
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Set connector name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.connector_name = name.into();
        self
    }

    /// Build the MemoryConnector
    pub fn build(self) -> MemoryConnector {
        MemoryConnector {
            tables: Arc::new(RwLock::new(self.tables)),
            errors: Arc::new(RwLock::new(self.errors)),
            fail_connection: self.fail_connection,
            latency_ms: self.latency_ms,
            connector_name: self.connector_name,
        }
    }
}

impl Default for MemoryConnectorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct Fixture {
    #[serde(default)]
    tables: IndexMap<String, FixtureTable>,
}

#[derive(Debug, Deserialize)]
struct FixtureTable {
    columns: Vec<FixtureColumn>,
    #[serde(default)]
    rows: Vec<IndexMap<String, serde_json::Value>>,
    #[serde(default)]
    views: HashMap<String, Vec<IndexMap<String, serde_json::Value>>>,
    #[serde(default)]
    row_counts: HashMap<String, u64>,
}

#[derive(Debug, Deserialize)]
struct FixtureColumn {
    name: String,
    #[serde(rename = "type")]
    data_type: String,
    #[serde(default = "default_nullable")]
    nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// Convert fixture rows, reading date and timestamp text by column type
fn convert_rows(schema: &TableSchema, rows: Vec<IndexMap<String, serde_json::Value>>) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(name, value)| {
                    let value = json_to_value(value);
                    let data_type = schema.find_column(&name).map(|c| c.data_type.as_str());
                    (name, typed_value(value, data_type))
                })
                .collect()
        })
        .collect()
}

fn typed_value(value: Value, data_type: Option<&str>) -> Value {
    let Value::Text(text) = &value else {
        return value;
    };
    match data_type {
        Some("DATE") => match parse_datetime(text) {
            Some(ts) => Value::Date(ts.date()),
            None => value,
        },
        Some(t) if t.starts_with("TIMESTAMP") => match parse_datetime(text) {
            Some(ts) => Value::Timestamp(ts),
            None => value,
        },
        _ => value,
    }
}

fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Ok(d) = n.to_string().parse::<Decimal>() {
                Value::Decimal(d)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::Text(s),
        other => Value::Text(other.to_string()),
    }
}
