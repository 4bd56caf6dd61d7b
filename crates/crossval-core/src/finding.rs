//! Finding codes and severities
//!
//! IMPORTANT: Finding codes are versioned and stable.
//! NEVER rename or remove codes - report consumers match on them.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Finding code registry (v1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    // Schema comparison
    /// Source columns with no counterpart in the target
    SchemaMissingInTarget,

    /// Target columns with no counterpart in the source
    SchemaMissingInSource,

    /// Data type changed to a type outside the compatibility table
    SchemaTypeIncompatible,

    /// Data type changed along a known-compatible path
    SchemaTypeCompatible,

    /// Declared maximum length changed
    SchemaLengthChange,

    /// Nullability changed
    SchemaNullabilityChange,

    // Row counts
    /// Row counts differ beyond tolerance
    RowCountMismatch,

    // Column values
    /// Key present on only one side
    KeyMismatch,

    /// Row has a NULL key value
    KeyNull,

    /// Key value occurs more than once on one side
    KeyDuplicate,

    /// Key or compare column not present in sampled rows
    ColumnMissing,

    /// Cell values differ beyond tolerance
    ValueMismatch,

    /// Values could not be coerced to a common kind
    ComparisonError,

    /// Validation parameters are unusable for this comparison
    InvalidSpec,
}

impl FindingCode {
    /// Get the finding code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaMissingInTarget => "SCHEMA_MISSING_IN_TARGET",
            Self::SchemaMissingInSource => "SCHEMA_MISSING_IN_SOURCE",
            Self::SchemaTypeIncompatible => "SCHEMA_TYPE_INCOMPATIBLE",
            Self::SchemaTypeCompatible => "SCHEMA_TYPE_COMPATIBLE",
            Self::SchemaLengthChange => "SCHEMA_LENGTH_CHANGE",
            Self::SchemaNullabilityChange => "SCHEMA_NULLABILITY_CHANGE",
            Self::RowCountMismatch => "ROW_COUNT_MISMATCH",
            Self::KeyMismatch => "KEY_MISMATCH",
            Self::KeyNull => "KEY_NULL",
            Self::KeyDuplicate => "KEY_DUPLICATE",
            Self::ColumnMissing => "COLUMN_MISSING",
            Self::ValueMismatch => "VALUE_MISMATCH",
            Self::ComparisonError => "COMPARISON_ERROR",
            Self::InvalidSpec => "INVALID_SPEC",
        }
    }
}

impl std::fmt::Display for FindingCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Finding severity
///
/// Hard findings always fail the check. Soft findings are reported but
/// never fail it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Soft,
    Hard,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soft => write!(f, "soft"),
            Self::Hard => write!(f, "hard"),
        }
    }
}

/// A single difference found by a comparator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Stable finding code
    pub code: FindingCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Column the finding refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,

    /// Row key the finding refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_key: Option<String>,

    /// Source-side value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_value: Option<String>,

    /// Target-side value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_value: Option<String>,
}

impl Finding {
    /// Create a new finding with minimal fields
    pub fn new(code: FindingCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            column: None,
            row_key: None,
            source_value: None,
            target_value: None,
        }
    }

    /// Create a hard finding
    pub fn hard(code: FindingCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Hard, message)
    }

    /// Create a soft finding
    pub fn soft(code: FindingCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Soft, message)
    }

    /// Set the column
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set the row key
    pub fn with_row_key(mut self, row_key: impl Into<String>) -> Self {
        self.row_key = Some(row_key.into());
        self
    }

    /// Set source/target values
    pub fn with_values(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        self.source_value = Some(source.into());
        self.target_value = Some(target.into());
        self
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}
