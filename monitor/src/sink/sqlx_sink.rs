use anyhow::Context;
use async_trait::async_trait;
use market::AlertRecord;
use sqlx::AnyPool;
use sqlx::any::AnyPoolOptions;
use tracing::{debug, instrument};

use crate::sink::{AlertSink, schema};

/// SQLx-backed alert sink. Responsible only for persistence and row mapping.
#[derive(Clone)]
pub struct SqlxAlertSink {
    pool: AnyPool,
}

impl SqlxAlertSink {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Opens a pool on `database_url`. The `Any` drivers must be installed.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = AnyPoolOptions::new()
            .max_connections(4)
            .connect(database_url)
            .await
            .with_context(|| format!("connect alert database {database_url}"))?;

        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        schema::migrate(&self.pool)
            .await
            .context("create alerts schema")
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl AlertSink for SqlxAlertSink {
    #[instrument(skip_all, fields(alerts = alerts.len()))]
    async fn record(&self, alerts: &[AlertRecord]) -> anyhow::Result<()> {
        if alerts.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.context("begin alert insert")?;

        for a in alerts {
            sqlx::query(
                r#"
INSERT INTO alerts (
  observed_at, identifier, name, anomaly_type, severity,
  message, current_value, threshold, details
) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
            )
            .bind(a.timestamp().to_rfc3339())
            .bind(a.identifier().to_string())
            .bind(a.name().to_string())
            .bind(a.anomaly_type().as_str())
            .bind(a.severity().as_str())
            .bind(a.message().to_string())
            .bind(a.current_value())
            .bind(a.threshold())
            .bind(a.details().to_string())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("insert alert for {}", a.identifier()))?;
        }

        tx.commit().await.context("commit alert insert")?;

        debug!("alerts persisted");
        Ok(())
    }
}
