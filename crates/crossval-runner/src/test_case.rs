//! Test case model

use crossval_core::{ComparisonKind, ValidationSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a test case validates
///
/// Unrecognized labels are kept verbatim so they can be reported as skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TestCategory {
    SchemaValidation,
    RowCountValidation,
    ColumnValidation,
    Other(String),
}

impl TestCategory {
    /// Stable label as written in suites and reports
    pub fn as_str(&self) -> &str {
        match self {
            Self::SchemaValidation => "SCHEMA_VALIDATION",
            Self::RowCountValidation => "ROW_COUNT_VALIDATION",
            Self::ColumnValidation => "COL_COL_VALIDATION",
            Self::Other(label) => label,
        }
    }

    /// Comparison this category runs, if it is implemented
    pub fn comparison_kind(&self) -> Option<ComparisonKind> {
        match self {
            Self::SchemaValidation => Some(ComparisonKind::Schema),
            Self::RowCountValidation => Some(ComparisonKind::RowCount),
            Self::ColumnValidation => Some(ComparisonKind::ColumnValues),
            Self::Other(_) => None,
        }
    }

    /// Case-insensitive match against a category label
    pub fn matches(&self, label: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(label.trim())
    }
}

impl From<String> for TestCategory {
    fn from(label: String) -> Self {
        match label.trim().to_uppercase().as_str() {
            "SCHEMA_VALIDATION" => Self::SchemaValidation,
            "ROW_COUNT_VALIDATION" => Self::RowCountValidation,
            "COL_COL_VALIDATION" | "COLUMN_VALIDATION" => Self::ColumnValidation,
            _ => Self::Other(label),
        }
    }
}

impl From<TestCategory> for String {
    fn from(category: TestCategory) -> Self {
        category.as_str().to_string()
    }
}

impl fmt::Display for TestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Expected functional result of a test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectedResult {
    #[default]
    Pass,
    Fail,
}

impl ExpectedResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
        }
    }
}

impl fmt::Display for ExpectedResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which configured database a side of the test talks to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseRef {
    pub application: String,
    pub environment: String,
}

impl DatabaseRef {
    pub fn new(application: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            environment: environment.into(),
        }
    }
}

impl fmt::Display for DatabaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.environment, self.application)
    }
}

fn default_enabled() -> bool {
    true
}

/// One row of a test suite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub name: String,
    pub category: TestCategory,
    pub source: DatabaseRef,
    pub target: DatabaseRef,

    #[serde(default)]
    pub expected: ExpectedResult,

    /// Raw `key=value` parameter string
    #[serde(default)]
    pub parameters: String,

    /// Fallback for `source_table` when the parameters omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,

    /// Fallback for `target_table` when the parameters omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_table: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl TestCase {
    /// Parse the parameter string, filling tables from the suite columns
    pub fn spec(&self) -> ValidationSpec {
        let mut spec = ValidationSpec::parse(&self.parameters);

        if spec.source_table.is_empty() {
            if let Some(table) = &self.source_table {
                spec.source_table = table.trim().to_string();
            }
        }
        if spec.target_table.is_empty() {
            if let Some(table) = &self.target_table {
                spec.target_table = table.trim().to_string();
            }
        }

        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(parameters: &str) -> TestCase {
        TestCase {
            id: "T1".to_string(),
            name: "test".to_string(),
            category: TestCategory::RowCountValidation,
            source: DatabaseRef::new("HR", "DEV"),
            target: DatabaseRef::new("HR", "QA"),
            expected: ExpectedResult::Pass,
            parameters: parameters.to_string(),
            source_table: Some("hr.employees".to_string()),
            target_table: Some("dw.employees".to_string()),
            priority: None,
            tags: Vec::new(),
            description: None,
            enabled: true,
        }
    }

    #[test]
    fn category_labels() {
        assert_eq!(TestCategory::from("schema_validation".to_string()), TestCategory::SchemaValidation);
        assert_eq!(TestCategory::from("COL_COL_VALIDATION".to_string()), TestCategory::ColumnValidation);
        assert_eq!(
            TestCategory::from("SMOKE".to_string()),
            TestCategory::Other("SMOKE".to_string())
        );
        assert_eq!(TestCategory::ColumnValidation.to_string(), "COL_COL_VALIDATION");
        assert!(TestCategory::RowCountValidation.matches(" row_count_validation "));
        assert_eq!(TestCategory::Other("SMOKE".to_string()).comparison_kind(), None);
    }

    #[test]
    fn table_columns_fill_missing_parameters() {
        let spec = case("tolerance=5%").spec();
        assert_eq!(spec.source_table, "hr.employees");
        assert_eq!(spec.target_table, "dw.employees");

        let explicit = case("source_table=hr.staff;target_table=dw.staff").spec();
        assert_eq!(explicit.source_table, "hr.staff");
        assert_eq!(explicit.target_table, "dw.staff");
    }

    #[test]
    fn expected_result_labels() {
        assert_eq!(ExpectedResult::default(), ExpectedResult::Pass);
        assert_eq!(ExpectedResult::Fail.to_string(), "FAIL");
        assert_eq!(DatabaseRef::new("HR", "DEV").to_string(), "DEV/HR");
    }
}
