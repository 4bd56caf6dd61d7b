//! End-to-end runner tests over memory connectors

mod fixtures;

use crossval_catalog::{ConnectorError, MemoryConnectorBuilder};
use crossval_core::{Config, FindingCode, ValidationStatus};
use crossval_runner::{
    ConfigProvider, DatabaseRef, StaticProvider, TestCase, TestRunner, TestSuite,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn case(suite: &TestSuite, id: &str) -> TestCase {
    suite.tests.iter().find(|c| c.id == id).cloned().unwrap()
}

#[tokio::test]
async fn test_suite_run_summary() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let runner = TestRunner::new(fixtures::provider());

    let report = runner.run_suite(&suite).await;

    let statuses: Vec<(&str, ValidationStatus)> = report
        .outcomes
        .iter()
        .map(|o| (o.test_id.as_str(), o.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("SCHEMA_001", ValidationStatus::Passed),
            ("COUNT_001", ValidationStatus::Passed),
            ("COUNT_NEG_001", ValidationStatus::Passed),
            ("COUNT_WHERE_001", ValidationStatus::Passed),
            ("COLUMN_001", ValidationStatus::Failed),
            ("SMOKE_001", ValidationStatus::Skipped),
            ("OFF_001", ValidationStatus::Skipped),
        ]
    );
    assert_eq!(report.summary.total, 7);
    assert_eq!(report.summary.passed, 4);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.skipped, 2);
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_negative_case_inverts_result() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let runner = TestRunner::new(fixtures::provider());

    let outcome = runner.run_case(&case(&suite, "COUNT_NEG_001")).await;
    assert_eq!(outcome.status, ValidationStatus::Passed);
    assert!(outcome.message.starts_with("Expected: FAIL, Result: FAIL"));

    // The comparator result itself still failed
    let result = outcome.result.unwrap();
    assert_eq!(result.status(), ValidationStatus::Failed);
    assert_eq!(result.hard_findings()[0].code, FindingCode::RowCountMismatch);

    // An expected failure that passes is a failed test
    let mut flipped = case(&suite, "COUNT_001");
    flipped.expected = crossval_runner::ExpectedResult::Fail;
    let outcome = runner.run_case(&flipped).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);
    assert!(outcome.message.starts_with("Expected: FAIL, Result: PASS"));
}

#[tokio::test]
async fn test_where_clause_summary() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let runner = TestRunner::new(fixtures::provider());

    let outcome = runner.run_case(&case(&suite, "COUNT_WHERE_001")).await;
    assert_eq!(outcome.status, ValidationStatus::Passed);
    assert!(outcome.message.contains("with WHERE clauses"));
}

#[tokio::test]
async fn test_column_mismatch_details() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let runner = TestRunner::new(fixtures::provider());

    let outcome = runner.run_case(&case(&suite, "COLUMN_001")).await;
    let result = outcome.result.unwrap();
    let finding = &result.hard_findings()[0];
    assert_eq!(result.hard_findings().len(), 1);
    assert_eq!(finding.code, FindingCode::ValueMismatch);
    assert_eq!(finding.row_key.as_deref(), Some("2"));
    assert_eq!(finding.source_value.as_deref(), Some("20"));
    assert_eq!(finding.target_value.as_deref(), Some("21"));
}

#[tokio::test]
async fn test_sample_size_limits_rows() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let runner = TestRunner::new(fixtures::provider()).with_sample_size(1);

    // Only key 1 is sampled, and it matches
    let outcome = runner.run_case(&case(&suite, "COLUMN_001")).await;
    assert_eq!(outcome.status, ValidationStatus::Passed);

    let mut override_case = case(&suite, "COLUMN_001");
    override_case.parameters.push_str(";sample_size=3");
    let outcome = runner.run_case(&override_case).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);
}

#[tokio::test]
async fn test_unknown_category_is_skipped() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let runner = TestRunner::new(fixtures::provider());

    let outcome = runner.run_case(&case(&suite, "SMOKE_001")).await;
    assert_eq!(outcome.status, ValidationStatus::Skipped);
    assert_eq!(outcome.message, "SMOKE_TEST not implemented");
    assert!(outcome.result.is_none());
}

#[tokio::test]
async fn test_connector_errors_fail_regardless_of_expectation() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let broken = MemoryConnectorBuilder::new().with_connection_failure().build();
    let provider = StaticProvider::new()
        .with_connector(fixtures::dev(), Arc::new(fixtures::dev_connector()))
        .with_connector(fixtures::qa(), Arc::new(broken));
    let runner = TestRunner::new(provider);

    let outcome = runner.run_case(&case(&suite, "COUNT_NEG_001")).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);
    assert!(outcome.message.contains("Simulated connection failure"));

    let mut missing = case(&suite, "SCHEMA_001");
    missing.target = fixtures::dev();
    missing.parameters = "source_table=sales.orders;target_table=sales.nope".to_string();
    let outcome = runner.run_case(&missing).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);
    assert_eq!(
        outcome.message,
        ConnectorError::SchemaNotFound("sales.nope".to_string()).to_string()
    );
}

#[tokio::test]
async fn test_invalid_parameters_fail() {
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();
    let runner = TestRunner::new(fixtures::provider());

    let mut no_key = case(&suite, "COLUMN_001");
    no_key.parameters = "source_table=sales.orders;target_table=sales.orders".to_string();
    let outcome = runner.run_case(&no_key).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);
    assert!(outcome.message.contains("key_column"));

    let mut bad_table = case(&suite, "SCHEMA_001");
    bad_table.parameters = "source_table=sales.orders x;target_table=sales.orders".to_string();
    let outcome = runner.run_case(&bad_table).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);

    let mut unregistered = case(&suite, "SCHEMA_001");
    unregistered.source = DatabaseRef::new("CRM", "PROD");
    let outcome = runner.run_case(&unregistered).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);
    assert!(outcome.message.contains("PROD/CRM"));
}

#[tokio::test]
async fn test_config_provider_with_memory_fixture() {
    let dir = std::env::temp_dir().join(format!("crossval-runner-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("orders.json"),
        r#"{ "tables": { "sales.orders": {
            "columns": [{ "name": "id", "type": "integer", "nullable": false }],
            "rows": [{ "id": 1 }, { "id": 2 }]
        } } }"#,
    )
    .unwrap();
    std::fs::write(
        dir.join("crossval.toml"),
        r#"
[connections.DEV.HR]
type = "memory"
fixture = "orders.json"

[connections.QA.HR]
type = "memory"
fixture = "orders.json"

[connections.NOCREDS.HR]
type = "postgres"
host = "localhost"
database = "hr"
"#,
    )
    .unwrap();

    let config = Config::from_file(&dir.join("crossval.toml")).unwrap();
    let runner = TestRunner::new(ConfigProvider::new(config));
    let suite = TestSuite::from_toml(fixtures::SUITE).unwrap();

    let mut count = case(&suite, "COUNT_NEG_001");
    count.expected = crossval_runner::ExpectedResult::Pass;
    let outcome = runner.run_case(&count).await;
    assert_eq!(outcome.status, ValidationStatus::Passed, "{}", outcome.message);

    let mut no_creds = count.clone();
    no_creds.target = DatabaseRef::new("HR", "NOCREDS");
    let outcome = runner.run_case(&no_creds).await;
    assert_eq!(outcome.status, ValidationStatus::Failed);
    assert!(outcome.message.contains("NOCREDS_HR_USERNAME"));

    std::fs::remove_dir_all(&dir).ok();
}
