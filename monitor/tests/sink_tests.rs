use chrono::{TimeZone, Utc};
use market::cross_section::detect_alerts;
use market::{AlertRecord, DetectionConfig, Snapshot};
use monitor::sink::{AlertSink, SqlxAlertSink};
use sqlx::Row;
use uuid::Uuid;

/// Isolated in-memory DB per test.
/// `cache=shared` lets every connection of the pool see the same database.
async fn setup_sink() -> SqlxAlertSink {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let url = format!("sqlite:file:{db_name}?mode=memory&cache=shared");

    let sink = SqlxAlertSink::connect(&url)
        .await
        .expect("connect sqlite memory db");
    sink.migrate().await.expect("create schema");
    sink
}

fn alerts() -> Vec<AlertRecord> {
    let at = Utc.with_ymd_and_hms(2025, 3, 3, 11, 0, 0).unwrap();
    let base = |id: &str| Snapshot {
        identifier: id.into(),
        name: format!("{id} SA"),
        last_price: 30.0,
        reference_price: 30.0,
        variation_pct: 0.0,
        bid_price: 29.9,
        bid_quantity: 100,
        ask_price: 30.1,
        ask_quantity: 100,
        volume: 1_000,
        timestamp: at,
    };

    let mut jumpy = base("TN0001");
    jumpy.variation_pct = 9.0;
    let mut heavy = base("TN0002");
    heavy.ask_quantity = 1_200;

    let out = detect_alerts(&[jumpy, heavy, base("TN0003")], &DetectionConfig::default());
    assert_eq!(out.len(), 2);
    out
}

async fn count(sink: &SqlxAlertSink) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM alerts")
        .fetch_one(sink.pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn alerts_are_written_as_rows() {
    let sink = setup_sink().await;

    sink.record(&alerts()).await.unwrap();

    let rows = sqlx::query(
        "SELECT identifier, anomaly_type, severity, current_value FROM alerts ORDER BY identifier",
    )
    .fetch_all(sink.pool())
    .await
    .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get::<String, _>("identifier"), "TN0001");
    assert_eq!(rows[0].get::<String, _>("anomaly_type"), "PRICE_ANOMALY");
    assert_eq!(rows[0].get::<String, _>("severity"), "WARNING");
    assert_eq!(rows[0].get::<f64, _>("current_value"), 9.0);
    assert_eq!(rows[1].get::<String, _>("anomaly_type"), "ORDER_IMBALANCE");
    assert_eq!(rows[1].get::<String, _>("severity"), "CRITICAL");
}

#[tokio::test]
async fn repeated_writes_append() {
    let sink = setup_sink().await;
    let batch = alerts();

    sink.record(&batch).await.unwrap();
    sink.record(&batch).await.unwrap();

    assert_eq!(count(&sink).await, 4);
}

#[tokio::test]
async fn empty_slice_is_a_no_op() {
    let sink = setup_sink().await;

    sink.record(&[]).await.unwrap();

    assert_eq!(count(&sink).await, 0);
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let sink = setup_sink().await;
    sink.record(&alerts()).await.unwrap();

    sink.migrate().await.unwrap();

    assert_eq!(count(&sink).await, 2);
}
