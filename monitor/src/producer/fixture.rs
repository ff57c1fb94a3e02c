use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use market::Snapshot;
use tracing::{debug, instrument};

use crate::error::ProducerError;
use crate::producer::SnapshotProducer;

/// Static snapshot batch read from a JSON file (an array of snapshots).
///
/// The file is re-read on every fetch and every snapshot is stamped with the
/// fetch time, so repeated reads look like successive observations.
#[derive(Clone, Debug)]
pub struct FixtureProducer {
    path: PathBuf,
}

impl FixtureProducer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SnapshotProducer for FixtureProducer {
    #[instrument(skip(self), fields(path = %self.path.display()), level = "debug")]
    async fn fetch(&self) -> Result<Vec<Snapshot>, ProducerError> {
        let raw = tokio::fs::read(&self.path).await?;
        let mut batch: Vec<Snapshot> =
            serde_json::from_slice(&raw).map_err(|e| ProducerError::Decode(e.to_string()))?;

        let now = Utc::now();
        for s in &mut batch {
            s.timestamp = now;
        }

        debug!(instruments = batch.len(), "fixture snapshot loaded");
        Ok(batch)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
