//! Database abstraction layer.
//!
//! Provides a trait-based interface over the two supported backend
//! kinds. Everything downstream of this module sees only the
//! normalized `QueryResult` and `TableDescriptor` shapes, never a
//! driver-native row or column object.

mod mock;
mod mysql;
mod schema;
mod sqlite;
mod types;

pub use mock::{FlakyClient, MockClient};
pub use mysql::MySqlClient;
pub use schema::{ColumnDescriptor, ColumnType, TableDescriptor};
pub use sqlite::SqliteClient;
pub use types::{dedupe_column_names, QueryResult, Row, Value};

use crate::config::ConnectionConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Supported database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Client/server engine (MySQL).
    #[default]
    MySql,
    /// Embedded file-based engine (SQLite).
    Sqlite,
}

impl BackendKind {
    /// Returns the backend as a string for persistence and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Parses a backend from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mysql" => Some(Self::MySql),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Returns the default port for this backend, if it has one.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::MySql => Some(3306),
            Self::Sqlite => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Creates a database client for the configured backend.
///
/// This is the central factory for connections. The config is validated
/// before any network or file-system access; a single connection
/// attempt is made with no implicit retries.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn DatabaseClient>> {
    config.validate()?;
    match config.backend {
        BackendKind::MySql => {
            let client = MySqlClient::connect(config).await?;
            Ok(Box::new(client))
        }
        BackendKind::Sqlite => {
            let client = SqliteClient::connect(config).await?;
            Ok(Box::new(client))
        }
    }
}

/// Trait defining the interface for database clients.
///
/// A client wraps exactly one live connection; it must not be shared
/// across concurrent logical requests. All operations are blocking from
/// the caller's perspective and return complete results, never partial
/// ones.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Lists the tables of the connected database, in catalog order.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Describes one table. Fails with `NotFoundError` when the table
    /// does not exist in the catalog at call time.
    async fn describe_table(&self, table: &str) -> Result<TableDescriptor>;

    /// Executes a single SQL statement and returns the normalized
    /// result. Row-producing statements yield columns and rows;
    /// mutations yield an empty column set and the affected-row count.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Closes the database connection.
    async fn close(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!(BackendKind::parse("mysql"), Some(BackendKind::MySql));
        assert_eq!(BackendKind::parse("SQLite"), Some(BackendKind::Sqlite));
        assert_eq!(BackendKind::parse("postgres"), None);
    }

    #[test]
    fn test_backend_kind_round_trip() {
        for kind in [BackendKind::MySql, BackendKind::Sqlite] {
            assert_eq!(BackendKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[tokio::test]
    async fn test_connect_validates_before_io() {
        let config = ConnectionConfig {
            backend: BackendKind::MySql,
            ..Default::default()
        };

        let err = connect(&config).await.err().unwrap();
        assert_eq!(err.kind(), "ConfigError");
    }
}
