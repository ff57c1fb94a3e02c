//! Streaming Anomaly Engine
//!
//! Owns one [`RollingHistory`] per instrument and the cumulative alert log.
//! All of it sits in a single [`EngineState`] behind one lock:
//!
//! - `ingest` and `reset` take the write lock for their full duration, so a
//!   reader sees either the state before a batch or the state after it.
//! - `report` and `status` take the read lock and copy out what they need.
//!
//! The lock is never held across an `.await`; callers fetch their batch
//! first and only then hand it to [`StreamingEngine::ingest`].

mod status;

pub use status::EngineStatus;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use market::{
    AlertRecord, AlertTally, AnomalyReport, ConfigError, DetectionConfig, HistoryError,
    RollingHistory, Snapshot, series,
};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Default)]
struct EngineState {
    histories: HashMap<String, RollingHistory>,
    alerts: Vec<AlertRecord>,
    tally: AlertTally,
    batches_ingested: u64,
    as_of: Option<DateTime<Utc>>,
}

pub struct StreamingEngine {
    config: DetectionConfig,
    state: RwLock<EngineState>,
    running: AtomicBool,
}

impl StreamingEngine {
    /// Refuses to build on an invalid config.
    pub fn new(config: DetectionConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            state: RwLock::new(EngineState::default()),
            running: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Appends each snapshot to its instrument's history, in arrival order,
    /// and runs the time-series detectors on it.
    ///
    /// Returns only the alerts raised by this batch. A snapshot older than
    /// the newest one already held for its instrument is dropped.
    #[instrument(skip_all, fields(batch_size = batch.len()))]
    pub fn ingest(&self, batch: Vec<Snapshot>) -> Vec<AlertRecord> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        let mut raised = Vec::new();
        for snapshot in batch {
            let observed_at = snapshot.timestamp;
            let history = state
                .histories
                .entry(snapshot.identifier.clone())
                .or_insert_with(|| RollingHistory::new(self.config.history_capacity));

            let identifier = snapshot.identifier.clone();
            if let Err(HistoryError::OutOfOrder { latest, incoming }) = history.push(snapshot) {
                warn!(
                    identifier = %identifier,
                    %latest,
                    %incoming,
                    "out-of-order snapshot dropped"
                );
                continue;
            }

            let alerts = series::evaluate(history, &self.config);
            for alert in &alerts {
                state.tally.record(alert);
            }
            raised.extend(alerts);

            state.as_of = state.as_of.max(Some(observed_at));
        }

        state.alerts.extend(raised.iter().cloned());
        state.batches_ingested += 1;

        debug!(
            new_alerts = raised.len(),
            total_alerts = state.tally.total(),
            batches_ingested = state.batches_ingested,
            "batch ingested"
        );

        raised
    }

    /// Report over everything raised since construction or the last reset.
    pub fn report(&self) -> AnomalyReport {
        let state = self.state.read();
        AnomalyReport::from_tally(
            state.alerts.clone(),
            &state.tally,
            state.as_of,
            self.config.top_flagged_limit,
        )
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state.read();
        EngineStatus {
            running: self.is_running(),
            batches_ingested: state.batches_ingested,
            instruments_tracked: state.histories.len(),
            as_of: state.as_of,
            total_alerts: state.tally.total(),
            by_type: state.tally.by_type(),
            by_severity: state.tally.by_severity(),
            top_flagged: state.tally.top_flagged(self.config.top_flagged_limit),
        }
    }

    /// Drops every history and alert in one step.
    pub fn reset(&self) {
        let previous = std::mem::take(&mut *self.state.write());

        info!(
            dropped_alerts = previous.tally.total(),
            dropped_instruments = previous.histories.len(),
            "engine reset"
        );
    }

    /// Observations currently held for `identifier`.
    pub fn history_len(&self, identifier: &str) -> usize {
        self.state
            .read()
            .histories
            .get(identifier)
            .map_or(0, RollingHistory::len)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Claims the driver slot. `false` if a driver already holds it.
    pub fn try_mark_running(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn snap(id: &str, secs: i64, volume: u64) -> Snapshot {
        Snapshot {
            identifier: id.into(),
            name: id.into(),
            last_price: 5.0,
            reference_price: 5.0,
            variation_pct: 0.0,
            bid_price: 4.98,
            bid_quantity: 200,
            ask_price: 5.02,
            ask_quantity: 200,
            volume,
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs),
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = DetectionConfig {
            volume_z: -1.0,
            ..Default::default()
        };
        assert!(StreamingEngine::new(cfg).is_err());
    }

    #[test]
    fn out_of_order_snapshot_is_dropped() {
        let engine = StreamingEngine::new(DetectionConfig::default()).unwrap();

        engine.ingest(vec![snap("TN0001", 60, 100)]);
        engine.ingest(vec![snap("TN0001", 30, 100)]);

        assert_eq!(engine.history_len("TN0001"), 1);
        assert_eq!(engine.status().batches_ingested, 2);
    }

    #[test]
    fn history_is_bounded_by_capacity() {
        let cfg = DetectionConfig {
            history_capacity: 5,
            ..Default::default()
        };
        let engine = StreamingEngine::new(cfg).unwrap();
        for i in 0..12 {
            engine.ingest(vec![snap("TN0001", i * 30, 100)]);
        }

        assert_eq!(engine.history_len("TN0001"), 5);
    }

    #[test]
    fn running_flag_is_claimed_once() {
        let engine = StreamingEngine::new(DetectionConfig::default()).unwrap();

        assert!(engine.try_mark_running());
        assert!(!engine.try_mark_running());
        assert!(engine.status().running);

        engine.mark_stopped();
        assert!(!engine.is_running());
        assert!(engine.try_mark_running());
    }
}
