//! Session-level integration tests against a real SQLite file.

use super::seeded_database;
use db_charter::api::Session;
use db_charter::db::ColumnType;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_list_tables_sorted() {
    let (_dir, config) = seeded_database().await;
    let session = Session::open(config).await.unwrap();

    let response = session.list_tables().await.unwrap();
    assert_eq!(response.tables, vec!["genres", "tracks"]);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_describe_table_columns() {
    let (_dir, config) = seeded_database().await;
    let session = Session::open(config).await.unwrap();

    let response = session.describe_table("tracks").await.unwrap();
    assert_eq!(response.table, "tracks");
    assert_eq!(response.columns.len(), 5);

    let id = &response.columns[0];
    assert_eq!(id.name, "id");
    assert_eq!(id.column_type, ColumnType::Integer);
    assert!(id.is_key);

    let price = &response.columns[3];
    assert_eq!(price.name, "price");
    assert_eq!(price.column_type, ColumnType::Real);
    assert!(price.nullable);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_run_query_returns_ordered_objects() {
    let (_dir, config) = seeded_database().await;
    let mut session = Session::open(config).await.unwrap();

    let response = session
        .run_query("SELECT title, price FROM tracks ORDER BY id")
        .await
        .unwrap();

    assert_eq!(response.columns, vec!["title", "price"]);
    assert_eq!(response.row_count, 4);
    assert_eq!(response.rows[0]["title"], serde_json::json!("Back In Black"));
    assert_eq!(response.rows[0]["price"], serde_json::json!(0.99));
    assert_eq!(response.rows[3]["price"], serde_json::Value::Null);

    // Object key order follows the select list, not the alphabet.
    let keys: Vec<&str> = response.rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["title", "price"]);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_run_query_mutation_reports_affected_rows() {
    let (_dir, config) = seeded_database().await;
    let mut session = Session::open(config).await.unwrap();

    let response = session
        .run_query("UPDATE tracks SET price = 1.49 WHERE genre_id = 1")
        .await
        .unwrap();

    assert!(response.columns.is_empty());
    assert!(response.rows.is_empty());
    assert_eq!(response.row_count, 2);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_run_query_error_kinds() {
    let (_dir, config) = seeded_database().await;
    let mut session = Session::open(config).await.unwrap();

    let err = session.run_query("SELEC 1").await.unwrap_err();
    assert_eq!(err.kind(), "SyntaxError");

    let err = session
        .run_query("SELECT * FROM nonexistent_table_xyz")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ExecutionError");

    let err = session.describe_table("nope").await.unwrap_err();
    assert_eq!(err.kind(), "NotFoundError");

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_schema_context_lists_every_table() {
    let (_dir, config) = seeded_database().await;
    let session = Session::open(config).await.unwrap();

    let context = session.schema_context().await.unwrap();

    assert!(context.contains("TABLE: genres"));
    assert!(context.contains("TABLE: tracks"));
    assert!(context.contains("CREATE TABLE tracks"));
    assert!(context.contains("SAMPLE DATA:"));
    assert!(context.contains("Back In Black"));
    // Sample rows are capped, so the fourth track never appears.
    assert!(!context.contains("Blue In Green"));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_repeated_query_is_stable() {
    let (_dir, config) = seeded_database().await;
    let mut session = Session::open(config).await.unwrap();

    let sql = "SELECT name FROM genres ORDER BY id";
    let first = session.run_query(sql).await.unwrap();
    let second = session.run_query(sql).await.unwrap();

    assert_eq!(first.columns, second.columns);
    assert_eq!(first.rows, second.rows);

    session.close().await.unwrap();
}
