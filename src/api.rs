//! Transport-agnostic request/response contracts.
//!
//! A `Session` threads one explicit connection handle through every
//! call; there is no process-wide current connection. The response
//! types here are what a routing layer serializes, whatever protocol
//! it speaks, and the error envelope carries a stable kind string so
//! callers can branch programmatically.

use crate::chart::{self, ChartRequest, ChartSpec};
use crate::config::ConnectionConfig;
use crate::db::{self, DatabaseClient, QueryResult, Value};
use crate::error::{CharterError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum sample rows included per table in the schema context.
const CONTEXT_SAMPLE_ROWS: usize = 3;

/// Error envelope for failure responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Taxonomy kind string, e.g. "SyntaxError". Never free-form.
    pub kind: String,

    /// Original error message, backend text preserved.
    pub message: String,
}

impl From<&CharterError> for ErrorBody {
    fn from(err: &CharterError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.message().to_string(),
        }
    }
}

impl From<CharterError> for ErrorBody {
    fn from(err: CharterError) -> Self {
        Self::from(&err)
    }
}

/// Response for a list-tables request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesResponse {
    pub tables: Vec<String>,
}

/// One column in a describe-table response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnBody {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: crate::db::ColumnType,
    pub nullable: bool,
    pub is_key: bool,
}

/// Response for a describe-table request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub table: String,
    pub columns: Vec<ColumnBody>,
}

/// Wire shape of a query result: rows as ordered column-to-scalar
/// mappings. Also accepted as input to a chart request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultBody {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub row_count: usize,
}

impl From<&QueryResult> for QueryResultBody {
    fn from(result: &QueryResult) -> Self {
        Self {
            columns: result.columns.clone(),
            rows: result.row_objects(),
            row_count: result.row_count,
        }
    }
}

impl QueryResultBody {
    /// Reconstructs the internal result shape, ordering each row by the
    /// column list. Missing cells become NULL; composite JSON values
    /// are outside the contract and rejected.
    ///
    /// For row-producing shapes the row count is recomputed from the
    /// rows rather than trusted from the wire, so a malformed body
    /// cannot produce a result whose count disagrees with its rows.
    /// A mutation shape (no columns) keeps its affected-row count.
    pub fn into_query_result(self) -> Result<QueryResult> {
        let mut rows = Vec::with_capacity(self.rows.len());
        for object in &self.rows {
            let mut row = Vec::with_capacity(self.columns.len());
            for column in &self.columns {
                match object.get(column) {
                    Some(json) => row.push(Value::from_json(json)?),
                    None => row.push(Value::Null),
                }
            }
            rows.push(row);
        }
        let row_count = if self.columns.is_empty() {
            self.row_count
        } else {
            rows.len()
        };
        Ok(QueryResult {
            columns: self.columns,
            rows,
            row_count,
        })
    }
}

/// Request to derive a chart from a previously returned query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildChartBody {
    pub result: QueryResultBody,
    #[serde(flatten)]
    pub request: ChartRequest,
}

/// Derives a chart specification from a chart request body.
///
/// Stateless; it needs no connection, only the result the caller
/// already holds.
pub fn build_chart(body: BuildChartBody) -> Result<ChartSpec> {
    let result = body.result.into_query_result()?;
    chart::build_chart(&result, &body.request)
}

/// A live database session: one configuration, one exclusive
/// connection handle, reused across calls until the session ends.
pub struct Session {
    config: ConnectionConfig,
    client: Box<dyn DatabaseClient>,
}

impl Session {
    /// Connects and wraps the resulting client.
    pub async fn open(config: ConnectionConfig) -> Result<Self> {
        let client = db::connect(&config).await?;
        Ok(Self { config, client })
    }

    /// Creates a session around an existing client. Primarily for
    /// testing.
    pub fn with_client(config: ConnectionConfig, client: Box<dyn DatabaseClient>) -> Self {
        Self { config, client }
    }

    /// Returns the connection configuration this session was opened
    /// with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Lists the tables of the connected database.
    pub async fn list_tables(&self) -> Result<TablesResponse> {
        let tables = self.client.list_tables().await?;
        Ok(TablesResponse { tables })
    }

    /// Describes one table.
    pub async fn describe_table(&self, table: &str) -> Result<DescribeResponse> {
        let descriptor = self.client.describe_table(table).await?;
        Ok(DescribeResponse {
            table: descriptor.name,
            columns: descriptor
                .columns
                .into_iter()
                .map(|col| ColumnBody {
                    name: col.name,
                    column_type: col.column_type,
                    nullable: col.nullable,
                    is_key: col.is_key,
                })
                .collect(),
        })
    }

    /// Executes a single SQL statement.
    ///
    /// If the connection was lost mid-execution, the session reconnects
    /// once and retries; a failure after that is surfaced as-is, never
    /// swallowed.
    pub async fn run_query(&mut self, sql: &str) -> Result<QueryResultBody> {
        let result = match self.client.execute_query(sql).await {
            Ok(result) => result,
            Err(CharterError::ConnectionLost(msg)) => {
                warn!("connection lost ({msg}), reconnecting once");
                self.client = db::connect(&self.config).await?;
                self.client.execute_query(sql).await?
            }
            Err(other) => return Err(other),
        };
        Ok(QueryResultBody::from(&result))
    }

    /// Renders the whole database as prompt-ready context: one
    /// CREATE TABLE block plus a few sample rows per table.
    ///
    /// A table that fails to introspect contributes an error line
    /// instead of aborting the entire context.
    pub async fn schema_context(&self) -> Result<String> {
        let tables = self.client.list_tables().await?;
        let mut parts = Vec::with_capacity(tables.len());

        for table in &tables {
            match self.table_context(table).await {
                Ok(part) => parts.push(part),
                Err(e) => parts.push(format!(
                    "TABLE: {table} - error retrieving schema: {}",
                    e.message()
                )),
            }
        }

        Ok(parts.join("\n\n"))
    }

    async fn table_context(&self, table: &str) -> Result<String> {
        let descriptor = self.client.describe_table(table).await?;
        let sample = self
            .client
            .execute_query(&format!("SELECT * FROM {table} LIMIT {CONTEXT_SAMPLE_ROWS}"))
            .await?;

        let sample_text = if sample.rows.is_empty() {
            "(no data in table)".to_string()
        } else {
            let mut lines = vec!["SAMPLE DATA:".to_string(), sample.columns.join("\t")];
            for row in &sample.rows {
                lines.push(
                    row.iter()
                        .map(Value::to_display_string)
                        .collect::<Vec<_>>()
                        .join("\t"),
                );
            }
            lines.join("\n")
        };

        Ok(format!(
            "TABLE: {table}\n{}\n{sample_text}",
            descriptor.create_table_sql()
        ))
    }

    /// Closes the session's connection.
    pub async fn close(self) -> Result<()> {
        self.client.close().await
    }
}
