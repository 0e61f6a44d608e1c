//! Mock database clients for testing.
//!
//! `MockClient` serves scripted tables and results without any real
//! backend; `FlakyClient` wraps it to simulate a connection dropping
//! mid-session.

use super::{DatabaseClient, QueryResult, TableDescriptor, Value};
use crate::error::{CharterError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A mock database client that returns predefined results.
#[derive(Default)]
pub struct MockClient {
    tables: Vec<TableDescriptor>,
    results: HashMap<String, QueryResult>,
}

impl MockClient {
    /// Creates a new mock client with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table to the mock catalog.
    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.tables.push(table);
        self
    }

    /// Scripts an exact-match result for the given SQL text.
    pub fn with_result(mut self, sql: impl Into<String>, result: QueryResult) -> Self {
        self.results.insert(sql.into(), result);
        self
    }
}

#[async_trait]
impl DatabaseClient for MockClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn describe_table(&self, table: &str) -> Result<TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.name == table)
            .cloned()
            .ok_or_else(|| CharterError::not_found(format!("table '{table}' does not exist")))
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Some(result) = self.results.get(sql) {
            return Ok(result.clone());
        }

        // Unscripted statements get a generic shape so callers can
        // exercise both result paths.
        if sql.trim_start().to_uppercase().starts_with("SELECT") {
            Ok(QueryResult::with_rows(
                vec!["result".to_string()],
                vec![vec![Value::String(format!("mock result for: {sql}"))]],
            ))
        } else {
            Ok(QueryResult::mutation(0))
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A client whose first N queries fail with `ConnectionLostError`,
/// after which it behaves like the wrapped mock. Used to test the
/// session's reconnect policy.
pub struct FlakyClient {
    inner: MockClient,
    failures_left: AtomicUsize,
}

impl FlakyClient {
    /// Wraps a mock client, failing the first `failures` queries.
    pub fn new(inner: MockClient, failures: usize) -> Self {
        Self {
            inner,
            failures_left: AtomicUsize::new(failures),
        }
    }

    fn should_fail(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DatabaseClient for FlakyClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        self.inner.list_tables().await
    }

    async fn describe_table(&self, table: &str) -> Result<TableDescriptor> {
        self.inner.describe_table(table).await
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if self.should_fail() {
            return Err(CharterError::connection_lost(
                "server has gone away".to_string(),
            ));
        }
        self.inner.execute_query(sql).await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}
