//! Table schema types and data type normalization

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Collapse vendor spellings of a data type into one canonical upper-case name.
///
/// Returns the base type name and the length parameter when the raw type
/// carries a single `(n)` suffix (e.g. `varchar(255)`). Multi-argument
/// suffixes such as `numeric(10,2)` are kept on the base name.
pub fn normalize_type(raw: &str) -> (String, Option<u32>) {
    let upper = raw.trim().to_uppercase();
    let upper = upper.split_whitespace().collect::<Vec<_>>().join(" ");

    let (base, length) = match (upper.find('('), upper.rfind(')')) {
        (Some(open), Some(close)) if close > open => {
            let args = upper[open + 1..close].trim();
            let head = upper[..open].trim().to_string();
            if args.contains(',') {
                (format!("{}({})", canonical_name(&head), args.replace(' ', "")), None)
            } else {
                match args.parse::<u32>() {
                    Ok(n) => (head, Some(n)),
                    Err(_) => (upper.clone(), None),
                }
            }
        }
        _ => (upper.clone(), None),
    };

    (canonical_name(&base), length)
}

fn canonical_name(base: &str) -> String {
    let name = match base {
        "CHARACTER VARYING" | "VARCHAR2" | "NVARCHAR" | "NVARCHAR2" => "VARCHAR",
        "CHARACTER" | "BPCHAR" | "NCHAR" => "CHAR",
        "INT" | "INT4" => "INTEGER",
        "INT8" => "BIGINT",
        "INT2" => "SMALLINT",
        "BOOL" => "BOOLEAN",
        "TIMESTAMP WITHOUT TIME ZONE" => "TIMESTAMP",
        "TIMESTAMP WITH TIME ZONE" => "TIMESTAMPTZ",
        "FLOAT8" => "DOUBLE PRECISION",
        "FLOAT4" => "REAL",
        other => other,
    };
    name.to_string()
}

/// A column in a table schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column name
    pub name: String,

    /// Normalized upper-case data type
    pub data_type: String,

    /// Whether the column accepts NULL
    pub nullable: bool,

    /// Declared maximum length for character types
    pub max_length: Option<u32>,
}

impl ColumnSchema {
    /// Create a nullable column, normalizing the raw data type
    pub fn new(name: impl Into<String>, raw_type: &str) -> Self {
        let (data_type, max_length) = normalize_type(raw_type);
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            max_length,
        }
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set maximum length
    pub fn with_max_length(mut self, max_length: Option<u32>) -> Self {
        self.max_length = max_length;
        self
    }

    /// Type rendered with its length, e.g. `VARCHAR(50)`
    pub fn display_type(&self) -> String {
        match self.max_length {
            Some(len) => format!("{}({})", self.data_type, len),
            None => self.data_type.clone(),
        }
    }
}

/// Errors raised while assembling a table schema
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),
}

/// An ordered set of uniquely named columns
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSchema {
    columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema from columns, rejecting duplicate names
    pub fn from_columns(columns: Vec<ColumnSchema>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn(column.name.clone()));
            }
        }
        Ok(Self { columns })
    }

    /// Append a column, rejecting duplicate names
    pub fn push(&mut self, column: ColumnSchema) -> Result<(), SchemaError> {
        if self.find_column(&column.name).is_some() {
            return Err(SchemaError::DuplicateColumn(column.name));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Columns in declaration order
    pub fn columns(&self) -> &[ColumnSchema] {
        &self.columns
    }

    /// Find a column by name
    pub fn find_column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
