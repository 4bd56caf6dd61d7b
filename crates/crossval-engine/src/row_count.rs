//! Row count comparison

use crate::tolerance::{count_within, percent_difference};
use crossval_core::{Finding, FindingCode, ValidationResult, ValidationSpec};

/// Compare two row counts under `spec.row_count_rule()`
///
/// Counts are expected to already reflect each side's filter. A mismatch
/// produces a single hard finding.
pub fn compare_row_counts(source_count: u64, target_count: u64, spec: &ValidationSpec) -> ValidationResult {
    let rule = spec.row_count_rule();
    let diff = source_count.abs_diff(target_count);
    let percent = percent_difference(source_count, target_count);
    let filtered = if spec.source_where.is_some() || spec.target_where.is_some() {
        " (with WHERE clauses)"
    } else {
        ""
    };

    let summary = format!(
        "Source: {}, Target: {}{}, difference {} ({:.2}%), tolerance {}",
        source_count, target_count, filtered, diff, percent, rule
    );

    if count_within(source_count, target_count, &rule) {
        tracing::debug!(source_count, target_count, %rule, "row counts within tolerance");
        return ValidationResult::passed(summary);
    }

    tracing::debug!(source_count, target_count, %rule, "row counts differ beyond tolerance");
    let finding = Finding::hard(
        FindingCode::RowCountMismatch,
        format!(
            "Row count mismatch{} - Source: {}, Target: {} (difference {}, {:.2}%, tolerance {})",
            filtered, source_count, target_count, diff, percent, rule
        ),
    )
    .with_values(source_count.to_string(), target_count.to_string());

    ValidationResult::from_findings(vec![finding], summary)
}
