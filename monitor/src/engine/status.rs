use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use market::{AnomalyType, FlaggedInstrument, Severity};
use serde::{Deserialize, Serialize};

/// Point-in-time view of the engine and its driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineStatus {
    /// True while a background driver is attached.
    pub running: bool,
    pub batches_ingested: u64,
    pub instruments_tracked: usize,
    pub as_of: Option<DateTime<Utc>>,
    pub total_alerts: usize,
    pub by_type: BTreeMap<AnomalyType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub top_flagged: Vec<FlaggedInstrument>,
}
