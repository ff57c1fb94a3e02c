use std::sync::Arc;

use chrono::{DateTime, Utc};
use market::cross_section::detect_batch;
use market::{AnomalyReport, ConfigError, DetectionConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::engine::{EngineStatus, StreamingEngine};
use crate::error::ProducerError;
use crate::producer::{SnapshotProducer, validate_batch};

/// Acknowledgement returned by [`AnomalyService::reset`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetAck {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Query surface over the engine and the cross-sectional detector.
///
/// Engine state can only change through the driver's ingest or [`Self::reset`].
#[derive(Clone)]
pub struct AnomalyService {
    engine: Arc<StreamingEngine>,
    producer: Arc<dyn SnapshotProducer>,
    config: DetectionConfig,
}

impl AnomalyService {
    pub fn new(
        engine: Arc<StreamingEngine>,
        producer: Arc<dyn SnapshotProducer>,
        config: DetectionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            engine,
            producer,
            config,
        })
    }

    /// Fetches a fresh batch and runs the cross-sectional detector on it.
    /// Engine state is not touched.
    #[instrument(skip(self), fields(producer = self.producer.name()))]
    pub async fn analyze_latest(&self) -> Result<AnomalyReport, ProducerError> {
        let batch = self.producer.fetch().await?;
        validate_batch(&batch)?;

        Ok(detect_batch(&batch, &self.config))
    }

    pub fn stream_status(&self) -> EngineStatus {
        self.engine.status()
    }

    pub fn stream_report(&self) -> AnomalyReport {
        self.engine.report()
    }

    pub fn reset(&self) -> ResetAck {
        self.engine.reset();
        info!("stream reset requested");

        ResetAck {
            status: "reset".to_string(),
            timestamp: Utc::now(),
        }
    }
}
