//! End-to-end chart derivation from real query results.

use super::seeded_database;
use db_charter::api::{self, BuildChartBody, Session};
use db_charter::chart::{ChartKind, ChartRequest};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_bar_chart_from_aggregated_query() {
    let (_dir, config) = seeded_database().await;
    let mut session = Session::open(config).await.unwrap();

    let result = session
        .run_query(
            "SELECT g.name AS genre, t.seconds AS seconds
             FROM tracks t JOIN genres g ON g.id = t.genre_id
             ORDER BY t.id",
        )
        .await
        .unwrap();

    let spec = api::build_chart(BuildChartBody {
        result,
        request: ChartRequest {
            kind: ChartKind::Bar,
            label_column: "genre".to_string(),
            value_columns: vec!["seconds".to_string()],
            title: None,
        },
    })
    .unwrap();

    assert_eq!(spec.kind, ChartKind::Bar);
    assert_eq!(spec.series.len(), 1);

    // Rows share labels, so values are summed in first-seen order.
    let points = &spec.series[0].points;
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].label, "Rock");
    assert_eq!(points[0].value, 547.0);
    assert_eq!(points[1].label, "Jazz");
    assert_eq!(points[1].value, 899.0);

    assert!(spec.render_code.contains("plotly.express"));

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_pie_chart_treats_null_as_zero() {
    let (_dir, config) = seeded_database().await;
    let mut session = Session::open(config).await.unwrap();

    let result = session
        .run_query(
            "SELECT g.name AS genre, t.price AS price
             FROM tracks t JOIN genres g ON g.id = t.genre_id
             ORDER BY t.id",
        )
        .await
        .unwrap();

    let spec = api::build_chart(BuildChartBody {
        result,
        request: ChartRequest {
            kind: ChartKind::Pie,
            label_column: "genre".to_string(),
            value_columns: vec!["price".to_string()],
            title: Some("Revenue by genre".to_string()),
        },
    })
    .unwrap();

    assert_eq!(spec.title, "Revenue by genre");
    let points = &spec.series[0].points;
    // The NULL price contributes zero to the Jazz slice.
    assert_eq!(points[1].label, "Jazz");
    assert!((points[1].value - 0.99).abs() < 1e-9);

    session.close().await.unwrap();
}

#[tokio::test]
async fn test_chart_errors_from_live_results() {
    let (_dir, config) = seeded_database().await;
    let mut session = Session::open(config).await.unwrap();

    let result = session
        .run_query("SELECT name, id FROM genres ORDER BY id")
        .await
        .unwrap();

    let err = api::build_chart(BuildChartBody {
        result: result.clone(),
        request: ChartRequest {
            kind: ChartKind::Bar,
            label_column: "missing".to_string(),
            value_columns: vec!["id".to_string()],
            title: None,
        },
    })
    .unwrap_err();
    assert_eq!(err.kind(), "ColumnNotFoundError");

    let err = api::build_chart(BuildChartBody {
        result,
        request: ChartRequest {
            kind: ChartKind::Pie,
            label_column: "name".to_string(),
            value_columns: vec!["id".to_string(), "id".to_string()],
            title: None,
        },
    })
    .unwrap_err();
    assert_eq!(err.kind(), "ChartError");

    session.close().await.unwrap();
}
