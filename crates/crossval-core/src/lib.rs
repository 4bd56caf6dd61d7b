//! Crossval Core
//!
//! Domain model shared by the comparators, connectors and runner.
//! Never rename finding codes - they are part of the report format.

pub mod config;
pub mod finding;
pub mod report;
pub mod result;
pub mod schema;
pub mod spec;
pub mod value;

pub use config::{Config, ConfigError, ConnectionConfig, ConnectionKind, Credentials};
pub use finding::{Finding, FindingCode, Severity};
pub use report::{Report, ReportSummary, ReportVersion, TestOutcome};
pub use result::{ValidationResult, ValidationStatus};
pub use schema::{ColumnSchema, SchemaError, TableSchema};
pub use spec::{
    ComparisonKind, DateTolerance, DateUnit, DecimalPrecision, SpecParseError, ToleranceRule,
    ToleranceType, ValidationSpec,
};
pub use value::{Row, Value};
