//! Integration tests for db-charter.

pub mod chart_test;
pub mod session_test;

use db_charter::config::ConnectionConfig;
use db_charter::db::{self, DatabaseClient};
use tempfile::TempDir;

/// Creates a fresh SQLite database seeded with a small music store
/// schema and returns it alongside the temp dir keeping it alive.
pub async fn seeded_database() -> (TempDir, ConnectionConfig) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = ConnectionConfig::sqlite(dir.path().join("store.db"));
    config.create_if_missing = true;

    let client = db::connect(&config).await.unwrap();
    let statements = [
        "CREATE TABLE genres (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        "CREATE TABLE tracks (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            genre_id INTEGER REFERENCES genres(id),
            price REAL,
            seconds INTEGER
        )",
        "INSERT INTO genres (id, name) VALUES (1, 'Rock'), (2, 'Jazz')",
        "INSERT INTO tracks (id, title, genre_id, price, seconds) VALUES
            (1, 'Back In Black', 1, 0.99, 255),
            (2, 'Thunderstruck', 1, 1.29, 292),
            (3, 'So What', 2, 0.99, 562),
            (4, 'Blue In Green', 2, NULL, 337)",
    ];
    for sql in statements {
        client.execute_query(sql).await.unwrap();
    }
    client.close().await.unwrap();

    (dir, config)
}
