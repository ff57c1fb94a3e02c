//! Optional write-only persistence of raised alerts.

mod schema;
pub mod sqlx_sink;

pub use sqlx_sink::SqlxAlertSink;

use async_trait::async_trait;
use market::AlertRecord;

/// Receives every alert the engine raises. Nothing in the monitor reads
/// alerts back from a sink.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn record(&self, alerts: &[AlertRecord]) -> anyhow::Result<()>;
}
