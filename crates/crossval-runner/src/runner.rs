//! Test execution
//!
//! Each case is run in isolation: parse its parameters, open both sides
//! through a [`ConnectorProvider`], fetch what the category needs, run the
//! comparator, then hold the functional result against the expected one.
//! Cases run sequentially in suite order.

use crate::suite::TestSuite;
use crate::test_case::{DatabaseRef, ExpectedResult, TestCase};
use crossval_catalog::{Connector, ConnectorError, SampleQuery, TableRef};
use crossval_core::{
    ComparisonKind, Config, ConnectionKind, Credentials, Report, TestOutcome, ValidationResult,
    ValidationSpec, ValidationStatus,
};
use crossval_engine::{compare_columns, compare_row_counts, compare_schemas};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Hands out connectors for the databases a test refers to
#[async_trait::async_trait]
pub trait ConnectorProvider: Send + Sync {
    async fn connector(&self, database: &DatabaseRef) -> Result<Arc<dyn Connector>, ConnectorError>;
}

/// Opens connectors from `crossval.toml` connections
///
/// PostgreSQL credentials come from `<ENV>_<APP>_USERNAME`/`_PASSWORD`.
pub struct ConfigProvider {
    config: Config,
}

impl ConfigProvider {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[async_trait::async_trait]
impl ConnectorProvider for ConfigProvider {
    async fn connector(&self, database: &DatabaseRef) -> Result<Arc<dyn Connector>, ConnectorError> {
        let connection = self
            .config
            .connection(&database.environment, &database.application)
            .map_err(|e| ConnectorError::Config(e.to_string()))?;

        let credentials = match connection.kind {
            ConnectionKind::Memory => None,
            ConnectionKind::Postgres => Some(
                Credentials::from_env(&database.environment, &database.application)
                    .map_err(|e| ConnectorError::Config(e.to_string()))?,
            ),
        };

        let connector = crossval_catalog::connect(connection, credentials).await?;
        Ok(Arc::from(connector))
    }
}

/// Fixed set of connectors, keyed by database
#[derive(Default, Clone)]
pub struct StaticProvider {
    connectors: HashMap<DatabaseRef, Arc<dyn Connector>>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connector(mut self, database: DatabaseRef, connector: Arc<dyn Connector>) -> Self {
        self.connectors.insert(database, connector);
        self
    }
}

#[async_trait::async_trait]
impl ConnectorProvider for StaticProvider {
    async fn connector(&self, database: &DatabaseRef) -> Result<Arc<dyn Connector>, ConnectorError> {
        self.connectors
            .get(database)
            .cloned()
            .ok_or_else(|| ConnectorError::Config(format!("no connector registered for {}", database)))
    }
}

/// Runs test cases against connectors from a provider
pub struct TestRunner<P: ConnectorProvider> {
    provider: P,
    sample_size: usize,
}

impl<P: ConnectorProvider> TestRunner<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sample_size: crossval_core::config::DEFAULT_SAMPLE_SIZE,
        }
    }

    /// Rows fetched per side when the parameters give no `sample_size`
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// Run every case of a suite in order
    pub async fn run_suite(&self, suite: &TestSuite) -> Report {
        let mut report = Report::new();
        for case in &suite.tests {
            let outcome = self.run_case(case).await;
            report.add_outcome(outcome);
        }

        tracing::info!(
            total = report.summary.total,
            passed = report.summary.passed,
            failed = report.summary.failed,
            skipped = report.summary.skipped,
            "suite finished"
        );
        report
    }

    /// Run one case and classify it against its expected result
    pub async fn run_case(&self, case: &TestCase) -> TestOutcome {
        let started = Instant::now();
        let outcome = |status: ValidationStatus, message: String, result: Option<ValidationResult>| TestOutcome {
            test_id: case.id.clone(),
            name: case.name.clone(),
            category: case.category.to_string(),
            status,
            expected: case.expected.to_string(),
            message,
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            result,
        };

        if !case.enabled {
            tracing::debug!(test_id = %case.id, "test disabled");
            return outcome(ValidationStatus::Skipped, "disabled".to_string(), None);
        }

        let Some(kind) = case.category.comparison_kind() else {
            tracing::info!(test_id = %case.id, category = %case.category, "category not implemented");
            return outcome(
                ValidationStatus::Skipped,
                format!("{} not implemented", case.category),
                None,
            );
        };

        tracing::info!(
            test_id = %case.id,
            category = %case.category,
            source = %case.source,
            target = %case.target,
            "running test"
        );

        let spec = case.spec();
        for warning in &spec.warnings {
            tracing::warn!(test_id = %case.id, %warning, "parameter skipped");
        }
        if let Err(e) = spec.validate_for(kind) {
            return outcome(ValidationStatus::Failed, format!("Invalid parameters: {}", e), None);
        }

        let result = match self.execute(kind, case, &spec).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(test_id = %case.id, error = %e, "test errored");
                return outcome(ValidationStatus::Failed, e.to_string(), None);
            }
        };

        let functional = if result.is_passed() { ExpectedResult::Pass } else { ExpectedResult::Fail };
        let status = if functional == case.expected {
            ValidationStatus::Passed
        } else {
            ValidationStatus::Failed
        };
        let message = format!(
            "Expected: {}, Result: {} - {}",
            case.expected,
            functional,
            result.summary()
        );

        let finished = outcome(status, message, Some(result));
        tracing::info!(
            test_id = %case.id,
            status = ?finished.status,
            duration_ms = finished.duration_ms,
            "test finished"
        );
        finished
    }

    async fn execute(
        &self,
        kind: ComparisonKind,
        case: &TestCase,
        spec: &ValidationSpec,
    ) -> Result<ValidationResult, ConnectorError> {
        let source_table = TableRef::parse(&spec.source_table)?;
        let target_table = TableRef::parse(&spec.target_table)?;

        let source = self.provider.connector(&case.source).await?;
        let target = self.provider.connector(&case.target).await?;

        match kind {
            ComparisonKind::Schema => {
                let source_schema = source.get_table_schema(&source_table).await?;
                let target_schema = target.get_table_schema(&target_table).await?;
                Ok(compare_schemas(&source_schema, &target_schema, spec))
            }
            ComparisonKind::RowCount => {
                let source_count = source
                    .get_row_count(&source_table, spec.source_where.as_deref())
                    .await?;
                let target_count = target
                    .get_row_count(&target_table, spec.target_where.as_deref())
                    .await?;
                tracing::debug!(source_count, target_count, "row counts fetched");
                Ok(compare_row_counts(source_count, target_count, spec))
            }
            ComparisonKind::ColumnValues => {
                let limit = spec.sample_size.unwrap_or(self.sample_size);
                // validate_for guarantees a key column here
                let key = spec.key_column.as_deref().unwrap_or_default();

                let source_query = SampleQuery::new(limit)
                    .with_filter(spec.source_where.clone())
                    .with_order_by(key);
                let target_query = SampleQuery::new(limit)
                    .with_filter(spec.target_where.clone())
                    .with_order_by(spec.target_name(key));

                let source_rows = source.get_sample_data(&source_table, &source_query).await?;
                let target_rows = target.get_sample_data(&target_table, &target_query).await?;
                tracing::debug!(
                    source_rows = source_rows.len(),
                    target_rows = target_rows.len(),
                    "samples fetched"
                );
                Ok(compare_columns(&source_rows, &target_rows, spec))
            }
        }
    }
}
