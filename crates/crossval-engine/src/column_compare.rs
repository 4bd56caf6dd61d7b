//! Column value comparison over key-matched sample rows
//!
//! Source rows are renamed through the column mappings, both sides are
//! indexed by the key column, and each compared column of each matched
//! row is checked with the tolerance engine. Every violation is a hard
//! finding; the comparison never stops early.

use crate::tolerance::{date_within, decimal_equal, numeric_within, string_equal};
use crossval_core::{
    DecimalPrecision, Finding, FindingCode, Row, ValidationResult, ValidationSpec, Value,
};
use indexmap::{IndexMap, IndexSet};

/// Two cell values could not be brought to a common kind
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComparisonError {
    #[error("cannot compare {kind} value '{left}' with '{right}'")]
    Incompatible {
        kind: &'static str,
        left: String,
        right: String,
    },
}

/// Verdict for one pair of cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellVerdict {
    Equal,
    /// NULL against a value, accepted because NULLs are allowed
    NullTolerated,
    Mismatch,
}

/// Compare one pair of cells, choosing the check by value kind
///
/// Order: NULLs, dates and timestamps, numbers, booleans, then strings.
/// Text on one side is coerced to the kind of the other side.
pub fn compare_values(
    source: &Value,
    target: &Value,
    spec: &ValidationSpec,
) -> Result<CellVerdict, ComparisonError> {
    let verdict = |equal: bool| if equal { CellVerdict::Equal } else { CellVerdict::Mismatch };
    let incompatible = |kind: &'static str| ComparisonError::Incompatible {
        kind,
        left: source.to_string(),
        right: target.to_string(),
    };

    match (source.is_null(), target.is_null()) {
        (true, true) => return Ok(CellVerdict::Equal),
        (true, false) | (false, true) if spec.allow_nulls => return Ok(CellVerdict::NullTolerated),
        (true, false) | (false, true) => return Ok(CellVerdict::Mismatch),
        (false, false) => {}
    }

    if source.is_temporal() || target.is_temporal() {
        let (Some(a), Some(b)) = (source.as_datetime(), target.as_datetime()) else {
            return Err(incompatible("date"));
        };
        return Ok(verdict(date_within(a, b, &spec.date_tolerance)));
    }

    let is_bool = |v: &Value| matches!(v, Value::Bool(_));
    if (source.is_numeric() || target.is_numeric()) && !is_bool(source) && !is_bool(target) {
        let (Some(a), Some(b)) = (source.as_decimal(), target.as_decimal()) else {
            return Err(incompatible("numeric"));
        };
        let equal = match spec.decimal_precision {
            DecimalPrecision::Digits(_) if source.is_fractional() || target.is_fractional() => {
                decimal_equal(a, b, spec.decimal_precision)
            }
            _ => numeric_within(a, b, &spec.column_rule()),
        };
        return Ok(verdict(equal));
    }

    if is_bool(source) || is_bool(target) {
        let (Some(a), Some(b)) = (source.as_bool(), target.as_bool()) else {
            return Err(incompatible("boolean"));
        };
        return Ok(verdict(a == b));
    }

    Ok(verdict(string_equal(
        &source.to_string(),
        &target.to_string(),
        spec.case_sensitive,
        spec.trim_spaces,
    )))
}

/// Rows of one side indexed by canonical key
struct KeyedRows<'a> {
    rows: IndexMap<String, &'a Row>,
    columns: IndexSet<String>,
}

impl<'a> KeyedRows<'a> {
    fn index(rows: &'a [Row], key: &str, side: &str, findings: &mut Vec<Finding>) -> Self {
        let mut indexed: IndexMap<String, &'a Row> = IndexMap::new();
        let mut columns = IndexSet::new();
        let mut null_keys = 0usize;

        for row in rows {
            columns.extend(row.keys().cloned());
            let Some(value) = row.get(key) else {
                continue;
            };
            match value.join_key() {
                None => null_keys += 1,
                Some(k) if indexed.contains_key(&k) => {
                    findings.push(
                        Finding::hard(
                            FindingCode::KeyDuplicate,
                            format!("Key '{}' occurs more than once in {}", k, side),
                        )
                        .with_column(key)
                        .with_row_key(k),
                    );
                }
                Some(k) => {
                    indexed.insert(k, row);
                }
            }
        }

        if null_keys > 0 {
            findings.push(
                Finding::hard(
                    FindingCode::KeyNull,
                    format!("{} {} row(s) have a NULL key '{}'", null_keys, side, key),
                )
                .with_column(key),
            );
        }

        Self { rows: indexed, columns }
    }

    fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }

    fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Rename source row columns to their target-side names
fn rename_rows(rows: &[Row], spec: &ValidationSpec) -> Vec<Row> {
    if spec.column_mappings.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .map(|row| {
            row.iter()
                .map(|(name, value)| (spec.target_name(name).to_string(), value.clone()))
                .collect()
        })
        .collect()
}

/// Compare sampled source and target rows column by column
pub fn compare_columns(source_rows: &[Row], target_rows: &[Row], spec: &ValidationSpec) -> ValidationResult {
    let Some(key_column) = spec.key_column.as_deref() else {
        return ValidationResult::from_findings(
            vec![Finding::hard(
                FindingCode::InvalidSpec,
                "Column comparison requires a key_column parameter",
            )],
            "no comparison performed",
        );
    };
    let key = spec.target_name(key_column).to_string();

    let mut findings = Vec::new();
    let source_rows = rename_rows(source_rows, spec);
    let source = KeyedRows::index(&source_rows, &key, "source", &mut findings);
    let target = KeyedRows::index(target_rows, &key, "target", &mut findings);

    for (side, rows) in [("source", &source), ("target", &target)] {
        if !rows.is_empty() && !rows.has_column(&key) {
            findings.push(
                Finding::hard(
                    FindingCode::ColumnMissing,
                    format!("Key column '{}' not present in {} rows", key, side),
                )
                .with_column(key.as_str()),
            );
        }
    }
    if findings.iter().any(|f| f.code == FindingCode::ColumnMissing) {
        return ValidationResult::from_findings(findings, "key column missing; no rows compared");
    }

    // Requested columns, or every non-key column present on both sides
    let requested: Vec<String> = if spec.compare_columns.is_empty() {
        source
            .columns
            .iter()
            .filter(|c| **c != key && target.has_column(c))
            .cloned()
            .collect()
    } else {
        let names: IndexSet<String> = spec
            .compare_columns
            .iter()
            .map(|c| spec.target_name(c).to_string())
            .filter(|c| *c != key)
            .collect();
        names.into_iter().collect()
    };

    let mut compared = Vec::new();
    let mut tracked = Vec::new();
    for column in requested {
        if spec.is_excluded(&column) || spec.is_expected_different(&column) {
            tracked.push(column);
            continue;
        }
        let missing: Vec<&str> = [("source", &source), ("target", &target)]
            .into_iter()
            .filter(|(_, rows)| !rows.is_empty() && !rows.has_column(&column))
            .map(|(side, _)| side)
            .collect();
        if missing.is_empty() {
            compared.push(column);
        } else {
            findings.push(
                Finding::hard(
                    FindingCode::ColumnMissing,
                    format!("Column '{}' not present in {} rows", column, missing.join(" and ")),
                )
                .with_column(column.as_str()),
            );
        }
    }

    for (k, _) in source.rows.iter().filter(|(k, _)| !target.rows.contains_key(*k)) {
        findings.push(
            Finding::hard(FindingCode::KeyMismatch, format!("Key '{}' present in source only", k))
                .with_column(key.as_str())
                .with_row_key(k.as_str()),
        );
    }
    for (k, _) in target.rows.iter().filter(|(k, _)| !source.rows.contains_key(*k)) {
        findings.push(
            Finding::hard(FindingCode::KeyMismatch, format!("Key '{}' present in target only", k))
                .with_column(key.as_str())
                .with_row_key(k.as_str()),
        );
    }

    let mut matched = 0usize;
    let mut mismatches = 0usize;
    for (k, source_row) in &source.rows {
        let Some(target_row) = target.rows.get(k) else {
            continue;
        };
        matched += 1;

        for column in &compared {
            let source_value = source_row.get(column).unwrap_or(&Value::Null);
            let target_value = target_row.get(column).unwrap_or(&Value::Null);

            match compare_values(source_value, target_value, spec) {
                Ok(CellVerdict::Equal) | Ok(CellVerdict::NullTolerated) => {}
                Ok(CellVerdict::Mismatch) => {
                    mismatches += 1;
                    findings.push(
                        Finding::hard(
                            FindingCode::ValueMismatch,
                            format!(
                                "Key {}: column '{}' differs: {} != {}",
                                k, column, source_value, target_value
                            ),
                        )
                        .with_column(column.as_str())
                        .with_row_key(k.as_str())
                        .with_values(source_value.to_string(), target_value.to_string()),
                    );
                }
                Err(e) => {
                    mismatches += 1;
                    findings.push(
                        Finding::hard(
                            FindingCode::ComparisonError,
                            format!("Key {}: column '{}': {}", k, column, e),
                        )
                        .with_column(column.as_str())
                        .with_row_key(k.as_str())
                        .with_values(source_value.to_string(), target_value.to_string()),
                    );
                }
            }
        }
    }

    let mut summary = format!(
        "{} keys matched ({} source, {} target rows); {} columns compared",
        matched,
        source_rows.len(),
        target_rows.len(),
        compared.len()
    );
    if !tracked.is_empty() {
        summary.push_str(&format!("; tracked but not compared: {}", tracked.join(", ")));
    }
    summary.push_str(&format!("; {} cell mismatches", mismatches));

    tracing::debug!(matched, mismatches, columns = compared.len(), "column comparison finished");

    ValidationResult::from_findings(findings, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crossval_core::ValidationStatus;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn row(cells: &[(&str, Value)]) -> Row {
        cells
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn dec(s: &str) -> Value {
        Value::Decimal(Decimal::from_str(s).unwrap())
    }

    fn codes(result: &ValidationResult) -> Vec<FindingCode> {
        result.hard_findings().iter().map(|f| f.code).collect()
    }

    #[test]
    fn matching_rows_pass() {
        let rows = vec![
            row(&[("id", Value::Int(1)), ("name", "Ada".into()), ("salary", dec("100.00"))]),
            row(&[("id", Value::Int(2)), ("name", "Bob".into()), ("salary", dec("200.00"))]),
        ];
        let spec = ValidationSpec::parse("key_column=id");

        let result = compare_columns(&rows, &rows, &spec);
        assert_eq!(result.status(), ValidationStatus::Passed);
        assert!(result.summary().starts_with("2 keys matched"));
        assert!(result.summary().contains("2 columns compared"));
    }

    #[test]
    fn expected_different_columns_never_fail() {
        let source = vec![row(&[("id", Value::Int(1)), ("salary", dec("10")), ("bonus", dec("1"))])];
        let target = vec![row(&[("id", Value::Int(1)), ("salary", dec("10")), ("bonus", dec("999"))])];
        let spec = ValidationSpec::parse("key_column=id;compare_columns=salary|bonus;expect_cols=bonus");

        let result = compare_columns(&source, &target, &spec);
        assert!(result.is_passed());
        assert!(result.summary().contains("tracked but not compared: bonus"));
    }

    #[test]
    fn excluded_columns_never_fail() {
        let source = vec![row(&[("id", Value::Int(1)), ("loaded_at", "x".into())])];
        let target = vec![row(&[("id", Value::Int(1)), ("loaded_at", "y".into())])];
        let spec = ValidationSpec::parse("key_column=id;exclude_columns=loaded_at");

        assert!(compare_columns(&source, &target, &spec).is_passed());
    }

    #[test]
    fn source_only_key_is_hard() {
        let source = vec![
            row(&[("id", Value::Int(1)), ("v", "a".into())]),
            row(&[("id", Value::Int(2)), ("v", "b".into())]),
        ];
        let target = vec![row(&[("id", Value::Int(1)), ("v", "a".into())])];
        let spec = ValidationSpec::parse("key_column=id");

        let result = compare_columns(&source, &target, &spec);
        assert!(result.is_failed());
        assert_eq!(codes(&result), vec![FindingCode::KeyMismatch]);
        assert_eq!(result.hard_findings()[0].row_key.as_deref(), Some("2"));
    }

    #[test]
    fn value_mismatch_names_row_and_column() {
        let source = vec![row(&[("id", Value::Int(7)), ("status", "ACTIVE".into())])];
        let target = vec![row(&[("id", Value::Int(7)), ("status", "INACTIVE".into())])];
        let spec = ValidationSpec::parse("key_column=id");

        let result = compare_columns(&source, &target, &spec);
        let finding = &result.hard_findings()[0];
        assert_eq!(finding.code, FindingCode::ValueMismatch);
        assert_eq!(finding.column.as_deref(), Some("status"));
        assert_eq!(finding.row_key.as_deref(), Some("7"));
        assert_eq!(finding.source_value.as_deref(), Some("ACTIVE"));
        assert_eq!(finding.target_value.as_deref(), Some("INACTIVE"));
    }

    #[test]
    fn keys_join_across_numeric_spellings() {
        let source = vec![row(&[("id", Value::Int(1)), ("v", "a".into())])];
        let target = vec![row(&[("id", "1".into()), ("v", "a".into())])];
        let spec = ValidationSpec::parse("key_column=id");

        assert!(compare_columns(&source, &target, &spec).is_passed());
    }

    #[test]
    fn mapped_columns_align() {
        let source = vec![row(&[("emp_id", Value::Int(1)), ("emp_name", "Ada".into())])];
        let target = vec![row(&[("employee_id", Value::Int(1)), ("full_name", "Ada".into())])];
        let spec = ValidationSpec::parse(
            "key_column=emp_id;compare_columns=emp_name;column_mappings=emp_id=employee_id|emp_name=full_name",
        );

        let result = compare_columns(&source, &target, &spec);
        assert!(result.is_passed(), "{:?}", result.hard_findings());
        assert!(result.summary().contains("1 columns compared"));
    }

    #[test]
    fn nulls() {
        let source = vec![
            row(&[("id", Value::Int(1)), ("v", Value::Null)]),
            row(&[("id", Value::Int(2)), ("v", Value::Null)]),
        ];
        let target = vec![
            row(&[("id", Value::Int(1)), ("v", Value::Null)]),
            row(&[("id", Value::Int(2)), ("v", Value::Int(5))]),
        ];

        let lenient = ValidationSpec::parse("key_column=id");
        assert!(compare_columns(&source, &target, &lenient).is_passed());

        let strict = ValidationSpec::parse("key_column=id;allow_nulls=false");
        let result = compare_columns(&source, &target, &strict);
        assert_eq!(codes(&result), vec![FindingCode::ValueMismatch]);
        assert_eq!(result.hard_findings()[0].row_key.as_deref(), Some("2"));
    }

    #[test]
    fn null_and_duplicate_keys() {
        let source = vec![
            row(&[("id", Value::Null), ("v", "a".into())]),
            row(&[("id", Value::Int(1)), ("v", "a".into())]),
            row(&[("id", Value::Int(1)), ("v", "b".into())]),
        ];
        let target = vec![row(&[("id", Value::Int(1)), ("v", "a".into())])];
        let spec = ValidationSpec::parse("key_column=id");

        let result = compare_columns(&source, &target, &spec);
        assert_eq!(codes(&result), vec![FindingCode::KeyDuplicate, FindingCode::KeyNull]);
    }

    #[test]
    fn missing_key_column_fails() {
        let source = vec![row(&[("id", Value::Int(1))])];
        let target = vec![row(&[("ident", Value::Int(1))])];
        let spec = ValidationSpec::parse("key_column=id");

        let result = compare_columns(&source, &target, &spec);
        assert!(result.is_failed());
        assert_eq!(codes(&result), vec![FindingCode::ColumnMissing]);
    }

    #[test]
    fn missing_key_parameter_is_invalid_spec() {
        let result = compare_columns(&[], &[], &ValidationSpec::default());
        assert_eq!(codes(&result), vec![FindingCode::InvalidSpec]);
    }

    #[test]
    fn missing_compare_column_is_hard() {
        let source = vec![row(&[("id", Value::Int(1)), ("salary", dec("1"))])];
        let target = vec![row(&[("id", Value::Int(1))])];
        let spec = ValidationSpec::parse("key_column=id;compare_columns=salary");

        let result = compare_columns(&source, &target, &spec);
        assert_eq!(codes(&result), vec![FindingCode::ColumnMissing]);
        assert!(result.hard_findings()[0].message.contains("target"));
    }

    #[test]
    fn comparison_error_does_not_stop_other_columns() {
        let source = vec![row(&[("id", Value::Int(1)), ("amount", dec("10")), ("name", "a".into())])];
        let target = vec![row(&[("id", Value::Int(1)), ("amount", "ten".into()), ("name", "b".into())])];
        let spec = ValidationSpec::parse("key_column=id");

        let result = compare_columns(&source, &target, &spec);
        assert_eq!(
            codes(&result),
            vec![FindingCode::ComparisonError, FindingCode::ValueMismatch]
        );
    }

    #[test]
    fn numeric_tolerance_applies_to_cells() {
        let source = vec![row(&[("id", Value::Int(1)), ("price", Value::Int(100))])];
        let target = vec![row(&[("id", Value::Int(1)), ("price", Value::Int(103))])];

        let tolerant = ValidationSpec::parse("key_column=id;numeric_tolerance=5%");
        assert!(compare_columns(&source, &target, &tolerant).is_passed());

        let strict = ValidationSpec::parse("key_column=id;numeric_tolerance=2%");
        assert!(compare_columns(&source, &target, &strict).is_failed());
    }

    #[test]
    fn zero_padded_text_keys_stay_distinct() {
        let rows = vec![
            row(&[("code", "007".into()), ("qty", Value::Int(1))]),
            row(&[("code", "7".into()), ("qty", Value::Int(2))]),
        ];
        let spec = ValidationSpec::parse("key_column=code");

        let result = compare_columns(&rows, &rows, &spec);
        assert_eq!(result.status(), ValidationStatus::Passed);
        assert!(result.summary().starts_with("2 keys matched"), "{}", result.summary());

        let mut drifted = rows.clone();
        drifted[0].insert("qty".to_string(), Value::Int(9));
        let result = compare_columns(&rows, &drifted, &spec);
        assert_eq!(codes(&result), vec![FindingCode::ValueMismatch]);
        assert_eq!(result.hard_findings()[0].row_key.as_deref(), Some("007"));
    }

    #[test]
    fn numeric_tolerance_ignores_count_suffix() {
        let source = vec![row(&[("id", Value::Int(1)), ("price", Value::Int(1000))])];
        let target = vec![row(&[("id", Value::Int(1)), ("price", Value::Int(1003))])];

        // 0.5 is absolute here; as a percentage it would allow 5
        let spec = ValidationSpec::parse("key_column=id;tolerance=5%;numeric_tolerance=0.5");
        assert!(compare_columns(&source, &target, &spec).is_failed());

        let spec = ValidationSpec::parse("key_column=id;tolerance=5%;numeric_tolerance=3");
        assert!(compare_columns(&source, &target, &spec).is_passed());
    }

    #[test]
    fn dispatch_by_kind() {
        let spec = ValidationSpec::parse(
            "key_column=id;decimal_precision=2;date_tolerance=1 day;case_sensitive=false;trim_spaces=true",
        );
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        assert_eq!(compare_values(&dec("1.234"), &dec("1.231"), &spec), Ok(CellVerdict::Equal));
        assert_eq!(compare_values(&day.into(), &next.into(), &spec), Ok(CellVerdict::Equal));
        assert_eq!(
            compare_values(&Value::Date(day), &"2024-05-02 00:00:00".into(), &spec),
            Ok(CellVerdict::Equal)
        );
        assert_eq!(compare_values(&Value::Bool(true), &"Y".into(), &spec), Ok(CellVerdict::Equal));
        assert_eq!(compare_values(&"ACTIVE".into(), &" active ".into(), &spec), Ok(CellVerdict::Equal));
        assert_eq!(compare_values(&Value::Int(3), &Value::Int(4), &spec), Ok(CellVerdict::Mismatch));
        assert!(compare_values(&Value::Date(day), &"soon".into(), &spec).is_err());
        assert!(compare_values(&Value::Bool(true), &"perhaps".into(), &spec).is_err());
    }
}
