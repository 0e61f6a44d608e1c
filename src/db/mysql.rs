//! MySQL database client implementation.
//!
//! Provides the `MySqlClient` struct that implements the
//! `DatabaseClient` trait for the client/server backend using sqlx.

use crate::config::ConnectionConfig;
use crate::db::{
    dedupe_column_names, ColumnDescriptor, DatabaseClient, QueryResult, Row, TableDescriptor,
    Value,
};
use crate::error::{CharterError, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::mysql::{MySqlDatabaseError, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::debug;

/// Timeout for establishing the connection.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// MySQL database client.
///
/// The pool is capped at one connection so the handle stays exclusive
/// to its session; concurrent callers get their own client.
#[derive(Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
}

impl MySqlClient {
    /// Connects with a single attempt. Credential rejection maps to
    /// `AuthError`, network/host failure to `UnreachableError`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_mysql_url()?;
        debug!("connecting to {}", config.display_string());

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(&conn_str)
            .await
            .map_err(|e| map_connect_error(e, config))?;

        Ok(Self { pool })
    }

    /// Creates a client from an existing pool. Primarily for testing.
    #[allow(dead_code)]
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseClient for MySqlClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        // Scoped to the configured database; the same credentials may
        // reach other databases on the server and those must not leak.
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT table_name
            FROM information_schema.tables
            WHERE table_schema = DATABASE() AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_query_error)
    }

    async fn describe_table(&self, table: &str) -> Result<TableDescriptor> {
        let rows: Vec<(String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT column_name, column_type, is_nullable, column_key
            FROM information_schema.columns
            WHERE table_schema = DATABASE() AND table_name = ?
            ORDER BY ordinal_position
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(map_query_error)?;

        if rows.is_empty() {
            return Err(CharterError::not_found(format!(
                "table '{table}' does not exist"
            )));
        }

        let columns = rows
            .into_iter()
            .map(|(name, column_type, is_nullable, column_key)| {
                ColumnDescriptor::new(name, column_type)
                    .nullable(is_nullable == "YES")
                    .key(column_key == "PRI")
            })
            .collect();

        Ok(TableDescriptor::new(table, columns))
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        debug!("executing statement: {}", sql);

        // Preparing the statement first tells us whether it declares
        // output columns. Statements with none (and DDL that cannot be
        // prepared at all) take the mutation path; any error there is
        // reported through the taxonomy with the backend's message.
        match self.pool.describe(sql).await {
            Ok(described) if !described.columns().is_empty() => {
                let columns = dedupe_column_names(
                    described
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                );

                let native_rows: Vec<MySqlRow> = sqlx::query(sql)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(map_query_error)?;

                let mut rows = Vec::with_capacity(native_rows.len());
                for row in &native_rows {
                    rows.push(convert_row(row)?);
                }
                Ok(QueryResult::with_rows(columns, rows))
            }
            _ => {
                let done = sqlx::query(sql)
                    .execute(&self.pool)
                    .await
                    .map_err(map_query_error)?;
                Ok(QueryResult::mutation(done.rows_affected()))
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.pool.close().await;
        Ok(())
    }
}

/// Converts a sqlx MySqlRow into a normalized row.
fn convert_row(row: &MySqlRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name(), col.name()))
        .collect()
}

/// Converts one cell, keyed on the driver-reported type name.
fn convert_value(row: &MySqlRow, index: usize, type_name: &str, column_name: &str) -> Result<Value> {
    let is_null = row
        .try_get_raw(index)
        .map(|v| v.is_null())
        .unwrap_or(true);
    if is_null {
        return Ok(Value::Null);
    }

    let value = match type_name {
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),

        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" | "BIT" => row
            .try_get::<Option<u64>, _>(index)
            .ok()
            .flatten()
            .map(|v| {
                i64::try_from(v)
                    .map(Value::Int)
                    .unwrap_or_else(|_| Value::String(v.to_string()))
            })
            .unwrap_or(Value::Null),

        "FLOAT" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(v as f64))
            .unwrap_or(Value::Null),

        "DOUBLE" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
            .unwrap_or(Value::Null),

        // DECIMAL arrives as text; the backend does not report it as an
        // integer type, so it defaults to floating.
        "DECIMAL" => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(|s| match s.trim().parse::<f64>() {
                Ok(f) => Value::Float(f),
                Err(_) => Value::String(s),
            })
            .unwrap_or(Value::Null),

        "DATE" => row
            .try_get::<Option<NaiveDate>, _>(index)
            .ok()
            .flatten()
            .map(|d| Value::String(d.to_string()))
            .unwrap_or(Value::Null),

        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)
            .ok()
            .flatten()
            .map(|t| Value::String(t.to_string()))
            .unwrap_or(Value::Null),

        "DATETIME" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|dt| Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
            .unwrap_or(Value::Null),

        "TIMESTAMP" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::Null),

        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            return Err(CharterError::unsupported_type(format!(
                "column '{column_name}' contains binary data ({type_name}), which cannot be \
                 represented as a scalar value"
            )));
        }

        // CHAR, VARCHAR, TEXT, ENUM, SET, JSON and anything unknown.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    };

    Ok(value)
}

/// Maps connection-establishment failures onto the error taxonomy,
/// distinguishing credential rejection from network/host failure.
fn map_connect_error(error: sqlx::Error, config: &ConnectionConfig) -> CharterError {
    if let sqlx::Error::Database(db) = &error {
        if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
            // 1044/1045: access denied for user
            if matches!(mysql.number(), 1044 | 1045) {
                return CharterError::auth(db.message().to_string());
            }
        }
        let lower = db.message().to_lowercase();
        if lower.contains("access denied") || lower.contains("authentication") {
            return CharterError::auth(db.message().to_string());
        }
    }

    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    CharterError::unreachable(format!("cannot connect to {host}:{port}: {error}"))
}

/// Maps statement-level failures onto the error taxonomy, preserving
/// the backend's original message text.
fn map_query_error(error: sqlx::Error) -> CharterError {
    match &error {
        sqlx::Error::Database(db) => {
            let message = db.message().to_string();
            if let Some(mysql) = db.try_downcast_ref::<MySqlDatabaseError>() {
                match mysql.number() {
                    // 1064: parse error, 1149: legacy syntax error code
                    1064 | 1149 => return CharterError::syntax(message),
                    // 2006/2013: server gone away / lost during query
                    2006 | 2013 => return CharterError::connection_lost(message),
                    _ => {}
                }
            }
            CharterError::execution(message)
        }
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => CharterError::connection_lost(error.to_string()),
        _ => CharterError::execution(error.to_string()),
    }
}
