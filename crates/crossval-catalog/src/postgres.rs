//! PostgreSQL connector
//!
//! Schemas come from `information_schema.columns`; counts and samples are
//! plain `SELECT`s with the caller's filter fragment appended. Table and
//! column names are validated and double-quoted, filter fragments are
//! passed through as written.
//!
//! Samples project columns from the table's schema. Types without a native
//! reader (uuid, json, interval, arrays...) are selected as `::text`, so
//! they arrive as text cells and compare as strings.
//!
//! Unqualified table names resolve to the `public` schema.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let connector = PostgresConnector::connect(&connection_config, &credentials).await?;
//! let schema = connector.get_table_schema(&TableRef::parse("hr.employees")?).await?;
//! ```

use crate::connector::{Connector, ConnectorError, SampleQuery, TableRef};
use crossval_core::{ColumnSchema, ConnectionConfig, Credentials, Row, TableSchema};

#[cfg(feature = "postgres")]
use crossval_core::Value;

#[cfg(feature = "postgres")]
use tokio_postgres::{types::Type, Client, NoTls};

#[cfg(feature = "postgres")]
use postgres_native_tls::MakeTlsConnector;

#[cfg(feature = "postgres")]
use native_tls::TlsConnector;

const DEFAULT_SCHEMA: &str = "public";

/// Normalized types read into typed cells; anything else is cast to text
const NATIVE_TYPES: &[&str] = &[
    "BOOLEAN",
    "SMALLINT",
    "INTEGER",
    "BIGINT",
    "REAL",
    "DOUBLE PRECISION",
    "NUMERIC",
    "DECIMAL",
    "DATE",
    "TIMESTAMP",
    "TIMESTAMPTZ",
    "TEXT",
    "VARCHAR",
    "CHAR",
];

#[cfg(not(feature = "postgres"))]
const NOT_COMPILED: &str =
    "PostgreSQL support not compiled. Rebuild with: cargo build --features postgres";

/// Quote an identifier for interpolation into SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quoted `schema.table` for a table reference
pub fn quote_table(table: &TableRef) -> String {
    format!(
        "{}.{}",
        quote_ident(table.schema_or(DEFAULT_SCHEMA)),
        quote_ident(&table.table)
    )
}

/// `SELECT COUNT(*)` statement for a table and optional filter
pub fn count_sql(table: &TableRef, filter: Option<&str>) -> String {
    let mut sql = format!("SELECT COUNT(*) FROM {}", quote_table(table));
    if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter.trim());
    }
    sql
}

/// Projection for one column, casting types without a native reader
pub fn select_expr(column: &ColumnSchema) -> String {
    let base = column.data_type.split('(').next().unwrap_or_default().trim();
    let ident = quote_ident(&column.name);
    if NATIVE_TYPES.contains(&base) {
        ident
    } else {
        format!("{}::text AS {}", ident, ident)
    }
}

/// Sample `SELECT` statement: projection, filter, ordering and limit
///
/// An empty column list selects every column of `schema`. Requested columns
/// missing from `schema` are selected as named and left to the server.
pub fn sample_sql(table: &TableRef, query: &SampleQuery, schema: &TableSchema) -> String {
    let projection = if query.columns.is_empty() && schema.is_empty() {
        "*".to_string()
    } else if query.columns.is_empty() {
        schema
            .columns()
            .iter()
            .map(select_expr)
            .collect::<Vec<_>>()
            .join(", ")
    } else {
        query
            .columns
            .iter()
            .map(|c| match schema.find_column(c) {
                Some(column) => select_expr(column),
                None => quote_ident(c),
            })
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut sql = format!("SELECT {} FROM {}", projection, quote_table(table));
    if let Some(filter) = query.filter.as_deref().filter(|f| !f.trim().is_empty()) {
        sql.push_str(" WHERE ");
        sql.push_str(filter.trim());
    }
    if let Some(order_by) = &query.order_by {
        sql.push_str(&format!(" ORDER BY {}", quote_ident(order_by)));
    }
    sql.push_str(&format!(" LIMIT {}", query.limit));
    sql
}

/// PostgreSQL connector
pub struct PostgresConnector {
    /// PostgreSQL client (only available with postgres feature)
    #[cfg(feature = "postgres")]
    client: Client,

    host: String,
    port: u16,
    database: String,

    /// Placeholder for when feature is disabled
    #[cfg(not(feature = "postgres"))]
    _phantom: std::marker::PhantomData<()>,
}

impl PostgresConnector {
    /// Connect using a configured connection and credentials
    ///
    /// TLS is negotiated when the connection sets `tls = true`.
    #[cfg(feature = "postgres")]
    pub async fn connect(config: &ConnectionConfig, credentials: &Credentials) -> Result<Self, ConnectorError> {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&credentials.username)
            .password(&credentials.password);

        let host = config.host.clone();
        let port = config.port;

        let client = if config.tls {
            let connector = TlsConnector::builder()
                .build()
                .map_err(|e| ConnectorError::Config(format!("Failed to create TLS connector: {}", e)))?;
            let (client, connection) = pg
                .connect(MakeTlsConnector::new(connector))
                .await
                .map_err(|e| connect_error(&host, port, e))?;
            let (h, p) = (host.clone(), port);
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::warn!(host = %h, port = p, error = %e, "PostgreSQL TLS connection error");
                }
            });
            client
        } else {
            let (client, connection) = pg
                .connect(NoTls)
                .await
                .map_err(|e| connect_error(&host, port, e))?;
            let (h, p) = (host.clone(), port);
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::warn!(host = %h, port = p, error = %e, "PostgreSQL connection error");
                }
            });
            client
        };

        tracing::debug!(%host, port, database = %config.database, "connected to PostgreSQL");

        Ok(Self {
            client,
            host,
            port,
            database: config.database.clone(),
        })
    }

    /// Create connector without postgres feature (returns error)
    #[cfg(not(feature = "postgres"))]
    pub async fn connect(_config: &ConnectionConfig, _credentials: &Credentials) -> Result<Self, ConnectorError> {
        Err(ConnectorError::Config(NOT_COMPILED.to_string()))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

#[cfg(feature = "postgres")]
fn connect_error(host: &str, port: u16, e: tokio_postgres::Error) -> ConnectorError {
    use tokio_postgres::error::SqlState;

    let message = format!("Failed to connect to PostgreSQL at {}:{}: {}", host, port, e);
    match e.code() {
        Some(code)
            if *code == SqlState::INVALID_PASSWORD
                || *code == SqlState::INVALID_AUTHORIZATION_SPECIFICATION =>
        {
            ConnectorError::Authentication(message)
        }
        _ => ConnectorError::Connection(message),
    }
}

#[cfg(feature = "postgres")]
fn query_error(table: &TableRef, e: tokio_postgres::Error) -> ConnectorError {
    use tokio_postgres::error::SqlState;

    match e.code() {
        Some(code) if *code == SqlState::UNDEFINED_TABLE => ConnectorError::SchemaNotFound(table.fqn()),
        Some(code) if *code == SqlState::INSUFFICIENT_PRIVILEGE => {
            ConnectorError::Authentication(format!("Cannot access {}: {}", table, e))
        }
        _ if e.is_closed() => ConnectorError::Connection(e.to_string()),
        _ => ConnectorError::Query(format!("{}: {}", table, e)),
    }
}

/// Read one cell into a `Value` by its PostgreSQL type
#[cfg(feature = "postgres")]
fn read_cell(row: &tokio_postgres::Row, idx: usize, ty: &Type) -> Result<Value, tokio_postgres::Error> {
    let value = match *ty {
        Type::BOOL => row.try_get::<_, Option<bool>>(idx)?.into(),
        Type::INT2 => row.try_get::<_, Option<i16>>(idx)?.map(i64::from).into(),
        Type::INT4 => row.try_get::<_, Option<i32>>(idx)?.map(i64::from).into(),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx)?.into(),
        Type::FLOAT4 => row.try_get::<_, Option<f32>>(idx)?.map(f64::from).into(),
        Type::FLOAT8 => row.try_get::<_, Option<f64>>(idx)?.into(),
        Type::NUMERIC => row.try_get::<_, Option<rust_decimal::Decimal>>(idx)?.into(),
        Type::DATE => row.try_get::<_, Option<chrono::NaiveDate>>(idx)?.into(),
        Type::TIMESTAMP => row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)?.into(),
        Type::TIMESTAMPTZ => row
            .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
            .map(|ts| ts.naive_utc())
            .into(),
        _ => row.try_get::<_, Option<String>>(idx)?.into(),
    };
    Ok(value)
}

#[async_trait::async_trait]
impl Connector for PostgresConnector {
    fn name(&self) -> &str {
        "PostgreSQL"
    }

    #[cfg(feature = "postgres")]
    async fn get_table_schema(&self, table: &TableRef) -> Result<TableSchema, ConnectorError> {
        let query = r#"
            SELECT
                column_name,
                data_type,
                is_nullable,
                character_maximum_length,
                numeric_precision,
                numeric_scale
            FROM information_schema.columns
            WHERE table_schema = $1
              AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let schema_name = table.schema_or(DEFAULT_SCHEMA);
        let rows = self
            .client
            .query(query, &[&schema_name, &table.table])
            .await
            .map_err(|e| query_error(table, e))?;

        let mut schema = TableSchema::new();
        for row in rows {
            let name: String = row.get(0);
            let data_type: String = row.get(1);
            let is_nullable: String = row.get(2);
            let max_length: Option<i32> = row.get(3);
            let precision: Option<i32> = row.get(4);
            let scale: Option<i32> = row.get(5);

            let raw_type = match (data_type.as_str(), precision, scale) {
                ("numeric", Some(p), Some(s)) => format!("numeric({},{})", p, s),
                _ => data_type,
            };

            let column = ColumnSchema::new(name, &raw_type)
                .with_nullable(is_nullable.eq_ignore_ascii_case("YES"))
                .with_max_length(max_length.and_then(|n| u32::try_from(n).ok()));

            schema
                .push(column)
                .map_err(|e| ConnectorError::Query(format!("{}: {}", table, e)))?;
        }

        if schema.is_empty() {
            return Err(ConnectorError::SchemaNotFound(table.fqn()));
        }

        Ok(schema)
    }

    #[cfg(not(feature = "postgres"))]
    async fn get_table_schema(&self, _table: &TableRef) -> Result<TableSchema, ConnectorError> {
        Err(ConnectorError::Config(NOT_COMPILED.to_string()))
    }

    #[cfg(feature = "postgres")]
    async fn get_row_count(&self, table: &TableRef, filter: Option<&str>) -> Result<u64, ConnectorError> {
        let sql = count_sql(table, filter);
        tracing::debug!(%sql, "counting rows");

        let row = self
            .client
            .query_one(sql.as_str(), &[])
            .await
            .map_err(|e| query_error(table, e))?;
        let count: i64 = row.get(0);

        u64::try_from(count).map_err(|_| ConnectorError::Query(format!("negative count {}", count)))
    }

    #[cfg(not(feature = "postgres"))]
    async fn get_row_count(&self, _table: &TableRef, _filter: Option<&str>) -> Result<u64, ConnectorError> {
        Err(ConnectorError::Config(NOT_COMPILED.to_string()))
    }

    #[cfg(feature = "postgres")]
    async fn get_sample_data(&self, table: &TableRef, query: &SampleQuery) -> Result<Vec<Row>, ConnectorError> {
        let schema = self.get_table_schema(table).await?;
        let sql = sample_sql(table, query, &schema);
        tracing::debug!(%sql, "sampling rows");

        let rows = self
            .client
            .query(sql.as_str(), &[])
            .await
            .map_err(|e| query_error(table, e))?;

        let mut sample = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut converted = Row::new();
            for (idx, column) in row.columns().iter().enumerate() {
                let value = read_cell(row, idx, column.type_()).map_err(|e| {
                    ConnectorError::Unsupported(format!(
                        "column '{}' of type {}: {}",
                        column.name(),
                        column.type_(),
                        e
                    ))
                })?;
                converted.insert(column.name().to_string(), value);
            }
            sample.push(converted);
        }

        Ok(sample)
    }

    #[cfg(not(feature = "postgres"))]
    async fn get_sample_data(&self, _table: &TableRef, _query: &SampleQuery) -> Result<Vec<Row>, ConnectorError> {
        Err(ConnectorError::Config(NOT_COMPILED.to_string()))
    }

    #[cfg(feature = "postgres")]
    async fn test_connection(&self) -> Result<(), ConnectorError> {
        self.client
            .query("SELECT 1", &[])
            .await
            .map_err(|e| ConnectorError::Connection(format!("Connection test failed: {}", e)))?;
        Ok(())
    }

    #[cfg(not(feature = "postgres"))]
    async fn test_connection(&self) -> Result<(), ConnectorError> {
        Err(ConnectorError::Config(NOT_COMPILED.to_string()))
    }
}
