//! Schema comparison between a source and a target table
//!
//! Source column names are renamed through the column mappings before
//! matching. Missing columns and incompatible type changes are hard
//! findings; compatible type changes, length changes and nullability
//! changes are soft.

use crossval_core::{ColumnSchema, Finding, FindingCode, TableSchema, ValidationResult, ValidationSpec};
use indexmap::IndexMap;

/// Type changes accepted as compatible, source base type to target base type
const COMPATIBLE_CHANGES: &[(&str, &str)] = &[
    ("VARCHAR", "TEXT"),
    ("CHAR", "VARCHAR"),
    ("INTEGER", "BIGINT"),
    ("DECIMAL", "NUMERIC"),
    ("TIMESTAMP", "TIMESTAMPTZ"),
];

/// Compare two table schemas
pub fn compare_schemas(
    source: &TableSchema,
    target: &TableSchema,
    spec: &ValidationSpec,
) -> ValidationResult {
    let mut findings = Vec::new();

    let renamed: IndexMap<&str, &ColumnSchema> = source
        .columns()
        .iter()
        .map(|col| (spec.target_name(&col.name), col))
        .collect();

    let missing_in_target: Vec<&str> = renamed
        .keys()
        .copied()
        .filter(|name| target.find_column(name).is_none() && !spec.is_excluded(name))
        .collect();

    let missing_in_source: Vec<&str> = target
        .columns()
        .iter()
        .map(|col| col.name.as_str())
        .filter(|name| !renamed.contains_key(name) && !spec.is_excluded(name))
        .collect();

    if !missing_in_target.is_empty() {
        findings.push(Finding::hard(
            FindingCode::SchemaMissingInTarget,
            format!("Columns missing in target: {}", missing_in_target.join(", ")),
        ));
    }

    if !missing_in_source.is_empty() {
        findings.push(Finding::hard(
            FindingCode::SchemaMissingInSource,
            format!("Columns missing in source: {}", missing_in_source.join(", ")),
        ));
    }

    let mut compared = 0usize;
    for (name, source_col) in &renamed {
        let Some(target_col) = target.find_column(name) else {
            continue;
        };
        if spec.is_excluded(name) {
            continue;
        }
        compared += 1;
        compare_column(name, source_col, target_col, &mut findings);
    }

    let hard = findings.iter().filter(|f| f.severity == crossval_core::Severity::Hard).count();
    let soft = findings.len() - hard;
    let summary = format!(
        "{} source columns, {} target columns, {} compared; {} hard, {} soft findings",
        source.len(),
        target.len(),
        compared,
        hard,
        soft
    );
    tracing::debug!(%summary, "schema comparison finished");

    ValidationResult::from_findings(findings, summary)
}

fn compare_column(
    name: &str,
    source: &ColumnSchema,
    target: &ColumnSchema,
    findings: &mut Vec<Finding>,
) {
    if source.data_type != target.data_type {
        let message = format!(
            "Column '{}' type changed: was {}, now {}",
            name,
            source.display_type(),
            target.display_type()
        );
        let finding = if is_compatible(source, target) {
            Finding::soft(FindingCode::SchemaTypeCompatible, message)
        } else {
            Finding::hard(FindingCode::SchemaTypeIncompatible, message)
        };
        findings.push(
            finding
                .with_column(name)
                .with_values(source.display_type(), target.display_type()),
        );
    }

    if let (Some(was), Some(now)) = (source.max_length, target.max_length) {
        if was != now {
            let direction = if now > was { "increased" } else { "decreased" };
            findings.push(
                Finding::soft(
                    FindingCode::SchemaLengthChange,
                    format!("Column '{}' length {} from {} to {}", name, direction, was, now),
                )
                .with_column(name)
                .with_values(was.to_string(), now.to_string()),
            );
        }
    }

    if source.nullable != target.nullable {
        let label = |nullable: bool| if nullable { "NULL" } else { "NOT NULL" };
        findings.push(
            Finding::soft(
                FindingCode::SchemaNullabilityChange,
                format!(
                    "Column '{}' nullability changed: was {}, now {}",
                    name,
                    label(source.nullable),
                    label(target.nullable)
                ),
            )
            .with_column(name)
            .with_values(label(source.nullable), label(target.nullable)),
        );
    }
}

/// Split `NUMERIC(10,2)` into `NUMERIC` and `10,2`
fn split_type(data_type: &str) -> (&str, Option<&str>) {
    match data_type.split_once('(') {
        Some((base, args)) => (base.trim(), Some(args.trim_end_matches(')'))),
        None => (data_type, None),
    }
}

/// Check the static compatibility table for a source to target type change
fn is_compatible(source: &ColumnSchema, target: &ColumnSchema) -> bool {
    let (source_base, source_args) = split_type(&source.data_type);
    let (target_base, target_args) = split_type(&target.data_type);

    // Single-character flags migrated to booleans
    if source_base == "VARCHAR" && target_base == "BOOLEAN" {
        return source.max_length == Some(1);
    }

    let args_agree = match (source_args, target_args) {
        (Some(a), Some(b)) => a == b,
        _ => true,
    };

    args_agree
        && COMPATIBLE_CHANGES
            .iter()
            .any(|(from, to)| *from == source_base && *to == target_base)
}
