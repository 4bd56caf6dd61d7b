//! Test suite files
//!
//! A suite is a TOML document with one `[[test]]` table per case:
//!
//! ```toml
//! name = "HR migration"
//!
//! [[test]]
//! id = "CROSS_DB_COUNT_001"
//! name = "Active employee count"
//! category = "ROW_COUNT_VALIDATION"
//! expected = "PASS"
//! source = { application = "HR", environment = "DEV" }
//! target = { application = "HR", environment = "QA" }
//! parameters = "source_table=hr.employees;target_table=hr.employees;tolerance=1%"
//! ```

use crate::test_case::TestCase;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered collection of test cases
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestSuite {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, rename = "test")]
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    /// Load a suite from a TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, SuiteError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SuiteError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&contents)
    }

    /// Parse a suite from TOML text
    ///
    /// Test ids must be unique.
    pub fn from_toml(toml: &str) -> Result<Self, SuiteError> {
        let suite: TestSuite = toml::from_str(toml)
            .map_err(|e| SuiteError::ParseError(e.to_string()))?;

        let mut seen = HashSet::new();
        for case in &suite.tests {
            if case.id.trim().is_empty() {
                return Err(SuiteError::ParseError(format!("test '{}' has an empty id", case.name)));
            }
            if !seen.insert(case.id.as_str()) {
                return Err(SuiteError::DuplicateId(case.id.clone()));
            }
        }

        Ok(suite)
    }

    /// Cases with `enabled = true`
    pub fn enabled(&self) -> impl Iterator<Item = &TestCase> {
        self.tests.iter().filter(|case| case.enabled)
    }

    /// Keep only cases of one category label
    pub fn retain_category(&mut self, label: &str) {
        self.tests.retain(|case| case.category.matches(label));
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// Suite loading errors
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Duplicate test id: {0}")]
    DuplicateId(String),
}
