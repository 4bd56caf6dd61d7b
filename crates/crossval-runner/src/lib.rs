//! Crossval runner - test suites and test execution
//!
//! Loads `[[test]]` cases from TOML, runs each through the comparators with
//! connectors from a [`ConnectorProvider`], and collects a [`Report`].
//!
//! [`Report`]: crossval_core::Report

pub mod runner;
pub mod suite;
pub mod test_case;

pub use runner::{ConfigProvider, ConnectorProvider, StaticProvider, TestRunner};
pub use suite::{SuiteError, TestSuite};
pub use test_case::{DatabaseRef, ExpectedResult, TestCase, TestCategory};
