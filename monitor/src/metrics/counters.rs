use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Minimal counters for operational visibility of the background driver.
#[derive(Clone, Default)]
pub struct Counters {
    pub ticks: Arc<AtomicU64>,
    pub batches_ingested: Arc<AtomicU64>,
    pub alerts_raised: Arc<AtomicU64>,

    // failures
    pub fetch_failures: Arc<AtomicU64>,
    pub sink_failures: Arc<AtomicU64>,
    pub outcomes_dropped: Arc<AtomicU64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CountersSnapshot {
    pub ticks: u64,
    pub batches_ingested: u64,
    pub alerts_raised: u64,
    pub fetch_failures: u64,
    pub sink_failures: u64,
    pub outcomes_dropped: u64,
}

pub fn bump(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
}

impl Counters {
    pub fn snapshot(&self) -> CountersSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        CountersSnapshot {
            ticks: get(&self.ticks),
            batches_ingested: get(&self.batches_ingested),
            alerts_raised: get(&self.alerts_raised),
            fetch_failures: get(&self.fetch_failures),
            sink_failures: get(&self.sink_failures),
            outcomes_dropped: get(&self.outcomes_dropped),
        }
    }
}
