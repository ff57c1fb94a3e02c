//! Per-metric anomaly pulses.
//!
//! Each pulse owns one metric and exposes the flavours that make sense for
//! it: a cross-sectional test over a whole batch, a time-series test over one
//! instrument's [`RollingHistory`], or a point test on a single snapshot.
//! Pulses are pure; they never mutate the history they read.

pub mod imbalance;
pub mod price;
pub mod rapid;
pub mod spread;
pub mod volume;

use crate::config::DetectionConfig;
use crate::rolling_history::RollingHistory;
use crate::types::Snapshot;

/// Input to a time-series pulse: the newest snapshot and the history it was
/// just appended to.
#[derive(Clone, Copy, Debug)]
pub struct SeriesInput<'a> {
    pub current: &'a Snapshot,
    pub history: &'a RollingHistory,
    pub config: &'a DetectionConfig,
}

impl<'a> SeriesInput<'a> {
    /// `None` for an empty history.
    pub fn new(history: &'a RollingHistory, config: &'a DetectionConfig) -> Option<Self> {
        Some(Self {
            current: history.latest()?,
            history,
            config,
        })
    }
}
