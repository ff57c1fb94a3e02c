use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::logger::init_logger;
use monitor::{
    api::{AppState, create_router},
    config::AppConfig,
    driver::{DriverConfig, DriverHandle, TickOutcome, spawn_driver},
    engine::StreamingEngine,
    producer::{BvmtClient, FallbackProducer, FixtureProducer, SnapshotProducer},
    service::AnomalyService,
    sink::{AlertSink, SqlxAlertSink},
};
use tokio::net::TcpListener;

/// Live feed first, the static fixture as fallback when one is configured.
fn build_producer(cfg: &AppConfig) -> anyhow::Result<Arc<dyn SnapshotProducer>> {
    let live: Arc<dyn SnapshotProducer> =
        Arc::new(BvmtClient::new(cfg.bvmt_api_url.clone()).context("build bvmt client")?);

    let producer: Arc<dyn SnapshotProducer> = match &cfg.fixture_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "static snapshot fallback enabled");
            Arc::new(FallbackProducer::new(
                live,
                Arc::new(FixtureProducer::new(path.clone())),
            ))
        }
        None => live,
    };

    Ok(producer)
}

/// Connects and migrates the alert database, if one is configured.
async fn init_sink(cfg: &AppConfig) -> anyhow::Result<Option<Arc<dyn AlertSink>>> {
    let Some(url) = &cfg.alert_database_url else {
        return Ok(None);
    };

    let sink = SqlxAlertSink::connect(url).await?;
    sink.migrate().await?;
    tracing::info!("alert sink ready");

    Ok(Some(Arc::new(sink)))
}

fn start_driver(
    engine: Arc<StreamingEngine>,
    producer: Arc<dyn SnapshotProducer>,
    sink: Option<Arc<dyn AlertSink>>,
    cfg: &AppConfig,
) -> anyhow::Result<DriverHandle> {
    let mut driver = spawn_driver(
        engine,
        producer,
        sink,
        DriverConfig {
            poll_interval: cfg.poll_interval,
            outcome_capacity: cfg.outcome_capacity,
            slow_fetch: Duration::from_secs(10),
        },
    )?;

    if let Some(mut outcomes) = driver.take_outcomes() {
        tokio::spawn(async move {
            while let Some(outcome) = outcomes.recv().await {
                match outcome {
                    TickOutcome::Ingested {
                        batch_size,
                        new_alerts,
                    } if new_alerts > 0 => {
                        tracing::info!(batch_size, new_alerts, "new alerts raised");
                    }
                    TickOutcome::Ingested { .. } => {}
                    TickOutcome::Failed { reason } => {
                        tracing::debug!(reason = %reason, "tick failed");
                    }
                }
            }
        });
    }

    Ok(driver)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    sqlx::any::install_default_drivers();

    let cfg = AppConfig::from_env().context("invalid configuration")?;
    init_logger("monitor", cfg.json_logs);

    tracing::info!(
        poll_secs = cfg.poll_interval.as_secs(),
        history_capacity = cfg.detection.history_capacity,
        "Starting market anomaly monitor..."
    );

    let engine = Arc::new(StreamingEngine::new(cfg.detection.clone())?);
    let producer = build_producer(&cfg)?;
    let sink = init_sink(&cfg).await?;

    let driver = start_driver(engine.clone(), producer.clone(), sink, &cfg)?;

    let service = AnomalyService::new(engine, producer, cfg.detection.clone())?;
    let app = create_router(AppState::new(service));

    let listener = TcpListener::bind(cfg.bind_addr)
        .await
        .with_context(|| format!("bind {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("api server")?;

    driver.stop().await;
    tracing::info!("monitor stopped");

    Ok(())
}
