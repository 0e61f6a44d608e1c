//! SQLite database client implementation.
//!
//! Provides the `SqliteClient` struct that implements the
//! `DatabaseClient` trait for the embedded file-based backend.

use crate::config::ConnectionConfig;
use crate::db::{
    dedupe_column_names, ColumnDescriptor, DatabaseClient, QueryResult, Row, TableDescriptor,
    Value,
};
use crate::error::{CharterError, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as SqlxColumn, Executor, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::debug;

/// SQLite database client.
#[derive(Debug)]
pub struct SqliteClient {
    pool: SqlitePool,
}

impl SqliteClient {
    /// Opens the configured database file, creating it if the config
    /// says so. An unwritable path or a file that is not a database
    /// maps to `StorageError`.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let path = config.sqlite_path()?;
        debug!("opening sqlite database at {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(config.create_if_missing);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| {
                CharterError::storage(format!("cannot open {}: {e}", path.display()))
            })?;

        // Opening is lazy about reading the file; force a read of the
        // catalog page so a corrupt file fails here, not mid-query.
        sqlx::query("SELECT count(*) FROM sqlite_master")
            .fetch_one(&pool)
            .await
            .map_err(|e| {
                CharterError::storage(format!("cannot read {}: {e}", path.display()))
            })?;

        Ok(Self { pool })
    }

    /// Creates a client from an existing pool. Primarily for testing.
    #[allow(dead_code)]
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_query_error)
    }

    async fn describe_table(&self, table: &str) -> Result<TableDescriptor> {
        let rows: Vec<(String, String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT name, type, "notnull", pk
            FROM pragma_table_info(?)
            ORDER BY cid
            "#,
        )
        .bind(table)
        .fetch_all(&self.pool)
        .await
        .map_err(map_query_error)?;

        // pragma_table_info returns no rows rather than an error for an
        // unknown table.
        if rows.is_empty() {
            return Err(CharterError::not_found(format!(
                "table '{table}' does not exist"
            )));
        }

        let columns = rows
            .into_iter()
            .map(|(name, native_type, notnull, pk)| {
                ColumnDescriptor::new(name, native_type)
                    .nullable(notnull == 0)
                    .key(pk > 0)
            })
            .collect();

        Ok(TableDescriptor::new(table, columns))
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        debug!("executing statement: {}", sql);

        match self.pool.describe(sql).await {
            Ok(described) if !described.columns().is_empty() => {
                let columns = dedupe_column_names(
                    described
                        .columns()
                        .iter()
                        .map(|c| c.name().to_string())
                        .collect(),
                );

                let native_rows: Vec<SqliteRow> = sqlx::query(sql)
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

/// Converts a sqlx SqliteRow into a normalized row.
fn convert_row(row: &SqliteRow) -> Result<Row> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name(), col.name()))
        .collect()
}

/// Converts one cell, keyed on the driver-reported type name.
fn convert_value(
    row: &SqliteRow,
    index: usize,
    type_name: &str,
    column_name: &str,
) -> Result<Value> {
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

        "INTEGER" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int)
            .unwrap_or(Value::Null),

        "REAL" | "NUMERIC" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float)
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

        "BLOB" => {
            return Err(CharterError::unsupported_type(format!(
                "column '{column_name}' contains binary data (BLOB), which cannot be \
                 represented as a scalar value"
            )));
        }

        // TEXT and anything unknown.
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    };

    Ok(value)
}

/// Maps statement-level failures onto the error taxonomy, preserving
/// the backend's original message text.
fn map_query_error(error: sqlx::Error) -> CharterError {
    match &error {
        sqlx::Error::Database(db) => {
            let message = db.message().to_string();
            if message.contains("syntax error") || message.contains("incomplete input") {
                CharterError::syntax(message)
            } else {
                CharterError::execution(message)
            }
        }
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => CharterError::connection_lost(error.to_string()),
        _ => CharterError::execution(error.to_string()),
    }
}
