//! Build a connector from a configured connection

use crate::connector::{Connector, ConnectorError};
use crate::memory::MemoryConnector;
use crate::postgres::PostgresConnector;
use crossval_core::{ConnectionConfig, ConnectionKind, Credentials};

/// Open a connector for one configured connection
///
/// `memory` connections load their fixture (or start empty) and ignore
/// credentials. `postgres` connections require them.
pub async fn connect(
    config: &ConnectionConfig,
    credentials: Option<Credentials>,
) -> Result<Box<dyn Connector>, ConnectorError> {
    match config.kind {
        ConnectionKind::Memory => {
            let connector = match &config.fixture {
                Some(path) => MemoryConnector::from_fixture_file(path)?,
                None => MemoryConnector::new(),
            };
            let tables = connector.table_count().await;
            tracing::debug!(tables = tables, "opened memory connector");
            Ok(Box::new(connector))
        }
        ConnectionKind::Postgres => {
            let credentials = credentials.ok_or_else(|| {
                ConnectorError::Config(format!(
                    "no credentials for PostgreSQL at {}:{}",
                    config.host, config.port
                ))
            })?;
            let connector = PostgresConnector::connect(config, &credentials).await?;
            Ok(Box::new(connector))
        }
    }
}
