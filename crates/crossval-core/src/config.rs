//! Configuration schema (crossval.toml)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of rows sampled per side for column comparison
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// Database engine behind a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    /// PostgreSQL server
    Postgres,

    /// In-process tables, for dry runs and tests
    Memory,
}

impl Default for ConnectionKind {
    fn default() -> Self {
        Self::Postgres
    }
}

impl std::fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => write!(f, "postgres"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

fn default_port() -> u16 {
    5432
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

/// Connection settings for one application in one environment
///
/// Credentials are not part of the file; see [`Credentials::from_env`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Engine type
    #[serde(rename = "type", default)]
    pub kind: ConnectionKind,

    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub database: String,

    /// Negotiate TLS with the server
    #[serde(default)]
    pub tls: bool,

    /// JSON table fixture loaded by `memory` connections
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixture: Option<std::path::PathBuf>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            kind: ConnectionKind::default(),
            host: "localhost".to_string(),
            port: default_port(),
            database: String::new(),
            tls: false,
            fixture: None,
        }
    }
}

/// Username/password pair for a connection
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Environment variable names for an environment/application pair
    pub fn env_keys(environment: &str, application: &str) -> (String, String) {
        let prefix = format!("{}_{}", environment, application).to_uppercase();
        (format!("{}_USERNAME", prefix), format!("{}_PASSWORD", prefix))
    }

    /// Read `<ENV>_<APP>_USERNAME` / `<ENV>_<APP>_PASSWORD`
    pub fn from_env(environment: &str, application: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(environment, application, |key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup
    pub fn from_lookup(
        environment: &str,
        application: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let (user_key, pass_key) = Self::env_keys(environment, application);
        let username = lookup(&user_key).ok_or_else(|| ConfigError::MissingCredentials(user_key))?;
        let password = lookup(&pass_key).ok_or_else(|| ConfigError::MissingCredentials(pass_key))?;
        Ok(Self { username, password })
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Rows fetched per side for column comparison
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Environment name to application name to connection settings
    #[serde(default)]
    pub connections: BTreeMap<String, BTreeMap<String, ConnectionConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            connections: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_toml(&contents)?;

        // Fixture paths are relative to the config file
        if let Some(parent) = path.parent() {
            for apps in config.connections.values_mut() {
                for conn in apps.values_mut() {
                    if let Some(fixture) = conn.fixture.as_mut() {
                        if fixture.is_relative() {
                            *fixture = parent.join(&*fixture);
                        }
                    }
                }
            }
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        if config.sample_size == 0 {
            return Err(ConfigError::ParseError("sample_size must be positive".to_string()));
        }

        Ok(config)
    }

    /// Look up the connection for an environment/application pair
    ///
    /// Names match case-insensitively.
    pub fn connection(&self, environment: &str, application: &str) -> Result<&ConnectionConfig, ConfigError> {
        self.connections
            .iter()
            .find(|(env, _)| env.eq_ignore_ascii_case(environment))
            .and_then(|(_, apps)| {
                apps.iter()
                    .find(|(app, _)| app.eq_ignore_ascii_case(application))
                    .map(|(_, conn)| conn)
            })
            .ok_or_else(|| ConfigError::UnknownConnection {
                environment: environment.to_string(),
                application: application.to_string(),
            })
    }

    /// All configured (environment, application, connection) triples
    pub fn iter_connections(&self) -> impl Iterator<Item = (&str, &str, &ConnectionConfig)> {
        self.connections.iter().flat_map(|(env, apps)| {
            apps.iter()
                .map(move |(app, conn)| (env.as_str(), app.as_str(), conn))
        })
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("No connection configured for environment '{environment}', application '{application}'")]
    UnknownConnection { environment: String, application: String },

    #[error("Missing credentials: environment variable {0} is not set")]
    MissingCredentials(String),
}
