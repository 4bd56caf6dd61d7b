//! Unified comparator output

use serde::{Deserialize, Serialize};
use crate::finding::{Finding, Severity};

/// Outcome of a single validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Result of one comparator invocation
///
/// Status is derived from the findings: `FAILED` iff at least one hard
/// finding exists. Fields are read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    status: ValidationStatus,
    hard_findings: Vec<Finding>,
    soft_findings: Vec<Finding>,
    summary: String,
}

impl ValidationResult {
    /// Build a result from findings of mixed severity
    pub fn from_findings(findings: Vec<Finding>, summary: impl Into<String>) -> Self {
        let (hard_findings, soft_findings): (Vec<_>, Vec<_>) = findings
            .into_iter()
            .partition(|f| f.severity == Severity::Hard);

        let status = if hard_findings.is_empty() {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };

        Self {
            status,
            hard_findings,
            soft_findings,
            summary: summary.into(),
        }
    }

    /// A passing result with no findings
    pub fn passed(summary: impl Into<String>) -> Self {
        Self::from_findings(Vec::new(), summary)
    }

    /// A result for a check that was not executed
    pub fn skipped(summary: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Skipped,
            hard_findings: Vec::new(),
            soft_findings: Vec::new(),
            summary: summary.into(),
        }
    }

    pub fn status(&self) -> ValidationStatus {
        self.status
    }

    pub fn hard_findings(&self) -> &[Finding] {
        &self.hard_findings
    }

    pub fn soft_findings(&self) -> &[Finding] {
        &self.soft_findings
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn is_passed(&self) -> bool {
        self.status == ValidationStatus::Passed
    }

    pub fn is_failed(&self) -> bool {
        self.status == ValidationStatus::Failed
    }
}
