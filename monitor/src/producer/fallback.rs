use std::sync::Arc;

use async_trait::async_trait;
use market::Snapshot;
use tracing::warn;

use crate::error::ProducerError;
use crate::producer::SnapshotProducer;

/// Tries `primary` first; on any failure logs it and asks `secondary`.
///
/// When both fail the secondary's error is returned.
#[derive(Clone)]
pub struct FallbackProducer {
    primary: Arc<dyn SnapshotProducer>,
    secondary: Arc<dyn SnapshotProducer>,
}

impl FallbackProducer {
    pub fn new(primary: Arc<dyn SnapshotProducer>, secondary: Arc<dyn SnapshotProducer>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl SnapshotProducer for FallbackProducer {
    async fn fetch(&self) -> Result<Vec<Snapshot>, ProducerError> {
        match self.primary.fetch().await {
            Ok(batch) if !batch.is_empty() => Ok(batch),
            Ok(_) => {
                warn!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    "primary returned no snapshots, falling back"
                );
                self.secondary.fetch().await
            }
            Err(e) => {
                warn!(
                    primary = self.primary.name(),
                    secondary = self.secondary.name(),
                    error = %e,
                    "primary producer failed, falling back"
                );
                self.secondary.fetch().await
            }
        }
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
