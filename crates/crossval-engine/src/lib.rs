//! Crossval engine - comparison logic
//!
//! Pure, synchronous comparators over already-fetched data:
//! - Tolerance checks per value kind
//! - Schema comparison
//! - Row count comparison
//! - Column value comparison

pub mod column_compare;
pub mod row_count;
pub mod schema_compare;
pub mod tolerance;

pub use column_compare::{compare_columns, compare_values, CellVerdict, ComparisonError};
pub use row_count::compare_row_counts;
pub use schema_compare::compare_schemas;
