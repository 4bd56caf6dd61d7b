//! Connector trait for fetching schemas, counts and sample rows

use crossval_core::{Row, TableSchema};
use std::fmt;

/// Identifies a table, optionally schema-qualified (`hr.employees`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Schema name, if given
    pub schema: Option<String>,

    /// Table name
    pub table: String,
}

fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl TableRef {
    /// Create an unqualified table reference
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
        }
    }

    /// Create a schema-qualified table reference
    pub fn qualified(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            table: table.into(),
        }
    }

    /// Parse `table` or `schema.table`, rejecting anything that is not a
    /// plain identifier
    pub fn parse(raw: &str) -> Result<Self, ConnectorError> {
        let raw = raw.trim();
        let invalid = || ConnectorError::InvalidIdentifier(raw.to_string());

        let parts: Vec<&str> = raw.split('.').collect();
        if !parts.iter().all(|p| is_identifier(p)) {
            return Err(invalid());
        }

        match parts.as_slice() {
            [table] => Ok(Self::new(*table)),
            [schema, table] => Ok(Self::qualified(*schema, *table)),
            _ => Err(invalid()),
        }
    }

    /// Schema name, or `default` when unqualified
    pub fn schema_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.schema.as_deref().unwrap_or(default)
    }

    /// Get the dotted name
    pub fn fqn(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.table),
            None => self.table.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fqn())
    }
}

/// What to fetch for a column comparison sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleQuery {
    /// Columns to select; empty selects all
    pub columns: Vec<String>,

    /// Raw filter fragment, without the `WHERE` keyword
    pub filter: Option<String>,

    /// Column to order by, so both sides sample the same keys
    pub order_by: Option<String>,

    /// Maximum rows to return
    pub limit: usize,
}

impl SampleQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            columns: Vec::new(),
            filter: None,
            order_by: None,
            limit,
        }
    }

    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }
}

/// Errors that can occur when talking to a database
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectorError {
    #[error("Table not found: {0}")]
    SchemaNotFound(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Capability set the comparators need from a database
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    /// Get the connector name (e.g., "PostgreSQL")
    fn name(&self) -> &str;

    /// Fetch column definitions for a table
    ///
    /// Fails with [`ConnectorError::SchemaNotFound`] when the table does
    /// not exist.
    async fn get_table_schema(&self, table: &TableRef) -> Result<TableSchema, ConnectorError>;

    /// Count rows, optionally restricted by a raw filter fragment
    async fn get_row_count(&self, table: &TableRef, filter: Option<&str>) -> Result<u64, ConnectorError>;

    /// Fetch a bounded, ordered sample of rows
    async fn get_sample_data(&self, table: &TableRef, query: &SampleQuery) -> Result<Vec<Row>, ConnectorError>;

    /// Test the connection
    async fn test_connection(&self) -> Result<(), ConnectorError>;
}
