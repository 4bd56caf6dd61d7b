//! Database connectors for cross-database validation
//!
//! A [`Connector`] answers the three questions the comparators ask of a
//! database: what columns does a table have, how many rows match a filter,
//! and what does an ordered sample of rows look like.
//!
//! ## Features
//!
//! - `postgres` - PostgreSQL support via `tokio-postgres`
//!
//! The in-memory connector is always available and backs dry runs and tests.
//!
//! ## Example
//!
//! ```rust,ignore
//! use crossval_catalog::{connect, Connector, TableRef};
//!
//! let connector = connect(&connection_config, Some(credentials)).await?;
//! let count = connector.get_row_count(&TableRef::parse("hr.employees")?, None).await?;
//! ```

pub mod connector;
pub mod factory;
pub mod memory;
pub mod postgres;

pub use connector::{Connector, ConnectorError, SampleQuery, TableRef};
pub use factory::connect;
pub use memory::{MemoryConnector, MemoryConnectorBuilder, MemoryTable};
pub use postgres::PostgresConnector;
