//! Background Driver
//!
//! One task that polls a [`SnapshotProducer`] on a fixed cadence and feeds
//! the [`StreamingEngine`]. A failed tick is logged and reported on the
//! outcome channel; the loop carries on at the next tick. The stop signal is
//! only observed between ticks, so an in-flight tick always completes.

use std::sync::Arc;
use std::time::Duration;

use common::logger::{TraceId, child_span, root_span, warn_if_slow};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, Span, info, warn};

use crate::engine::StreamingEngine;
use crate::error::{DriverError, ProducerError};
use crate::metrics::counters::{Counters, bump};
use crate::producer::{SnapshotProducer, validate_batch};
use crate::sink::AlertSink;

#[derive(Clone, Debug)]
pub struct DriverConfig {
    pub poll_interval: Duration,

    /// Bound of the outcome channel; outcomes are dropped once it is full.
    pub outcome_capacity: usize,

    /// Producer calls slower than this are reported on the `performance` target.
    pub slow_fetch: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            outcome_capacity: 64,
            slow_fetch: Duration::from_secs(5),
        }
    }
}

/// Result of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Ingested { batch_size: usize, new_alerts: usize },
    Failed { reason: String },
}

pub struct DriverHandle {
    stop_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
    outcomes: Option<mpsc::Receiver<TickOutcome>>,
    counters: Counters,
}

impl DriverHandle {
    /// Takes the outcome receiver. Only the first call returns it.
    pub fn take_outcomes(&mut self) -> Option<mpsc::Receiver<TickOutcome>> {
        self.outcomes.take()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// Signals the loop and waits for it to exit after the current tick.
    pub async fn stop(self) {
        // the loop may already have exited; nothing to signal then
        let _ = self.stop_tx.send(true);

        if let Err(e) = self.join.await {
            warn!(error = %e, "driver task ended abnormally");
        }
    }
}

/// Starts the driver. Fails if another driver is already attached to `engine`.
///
/// Dropping the handle without calling [`DriverHandle::stop`] also stops the
/// loop after its current tick.
pub fn spawn_driver(
    engine: Arc<StreamingEngine>,
    producer: Arc<dyn SnapshotProducer>,
    sink: Option<Arc<dyn AlertSink>>,
    config: DriverConfig,
) -> Result<DriverHandle, DriverError> {
    if !engine.try_mark_running() {
        return Err(DriverError::AlreadyRunning);
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let (outcome_tx, outcome_rx) = mpsc::channel(config.outcome_capacity.max(1));
    let counters = Counters::default();

    let worker = Worker {
        engine,
        producer,
        sink,
        counters: counters.clone(),
        slow_fetch: config.slow_fetch,
    };

    let join = tokio::spawn(
        worker
            .run(config.poll_interval, stop_rx, outcome_tx)
            .in_current_span(),
    );

    Ok(DriverHandle {
        stop_tx,
        join,
        outcomes: Some(outcome_rx),
        counters,
    })
}

struct Worker {
    engine: Arc<StreamingEngine>,
    producer: Arc<dyn SnapshotProducer>,
    sink: Option<Arc<dyn AlertSink>>,
    counters: Counters,
    slow_fetch: Duration,
}

impl Worker {
    async fn run(
        self,
        poll_every: Duration,
        mut stop_rx: watch::Receiver<bool>,
        outcome_tx: mpsc::Sender<TickOutcome>,
    ) {
        let mut ticker = interval(poll_every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            producer = self.producer.name(),
            every_ms = poll_every.as_millis() as u64,
            "background driver started"
        );

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.changed() => break,
                _ = ticker.tick() => {}
            }

            let span = root_span("driver.tick", &TraceId::new());
            let outcome = self.tick().instrument(span).await;

            if outcome_tx.try_send(outcome).is_err() {
                bump(&self.counters.outcomes_dropped, 1);
            }
        }

        self.engine.mark_stopped();
        info!(ticks = self.counters.snapshot().ticks, "background driver stopped");
    }

    async fn tick(&self) -> TickOutcome {
        bump(&self.counters.ticks, 1);

        let fetched = warn_if_slow("producer.fetch", self.slow_fetch, self.producer.fetch()).await;
        let batch = match fetched.and_then(|b| validate_batch(&b).map(|_| b)) {
            Ok(batch) => batch,
            Err(e) => return self.failed(e),
        };

        let batch_size = batch.len();
        Span::current().record("batch_size", batch_size);

        let new_alerts = self.engine.ingest(batch);
        bump(&self.counters.batches_ingested, 1);
        bump(&self.counters.alerts_raised, new_alerts.len() as u64);

        if let Some(sink) = &self.sink {
            if !new_alerts.is_empty() {
                let written = sink
                    .record(&new_alerts)
                    .instrument(child_span("sink.record"))
                    .await;
                if let Err(e) = written {
                    bump(&self.counters.sink_failures, 1);
                    warn!(error = ?e, alerts = new_alerts.len(), "alert sink write failed");
                }
            }
        }

        info!(batch_size, new_alerts = new_alerts.len(), "tick ingested");

        TickOutcome::Ingested {
            batch_size,
            new_alerts: new_alerts.len(),
        }
    }

    fn failed(&self, error: ProducerError) -> TickOutcome {
        bump(&self.counters.fetch_failures, 1);
        warn!(
            producer = self.producer.name(),
            error = %error,
            "snapshot fetch failed, skipping tick"
        );

        TickOutcome::Failed {
            reason: error.to_string(),
        }
    }
}
