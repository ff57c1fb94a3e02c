use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_VOLUME_Z: f64 = 3.0;
pub const DEFAULT_PRICE_JUMP_PCT: f64 = 5.0;
pub const DEFAULT_IMBALANCE_RATIO: f64 = 5.0;
pub const DEFAULT_SPREAD_Z: f64 = 3.0;
pub const DEFAULT_MIN_HISTORY: usize = 3;
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;
pub const DEFAULT_RAPID_MOVE_PCT: f64 = 2.0;
pub const DEFAULT_RAPID_MOVE_LOOKBACK: usize = 3;
pub const DEFAULT_RAPID_MOVE_WINDOW: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_TOP_FLAGGED_LIMIT: usize = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number greater than zero, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("min_history must be at least 2, got {0}")]
    MinHistoryTooSmall(usize),

    #[error("history_capacity ({capacity}) must be at least min_history ({min_history})")]
    CapacityBelowMinHistory { capacity: usize, min_history: usize },

    #[error("rapid_move_lookback must span at least 3 observations, got {0}")]
    LookbackTooShort(usize),

    #[error("rapid_move_window must be non-zero")]
    ZeroRapidWindow,

    #[error("top_flagged_limit must be non-zero")]
    ZeroTopFlagged,
}

/// Thresholds and sizing shared by both detection passes.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectionConfig {
    /// Volume z-score above which a VOLUME_SPIKE is raised.
    pub volume_z: f64,

    /// Absolute price change, in percent, above which a PRICE_ANOMALY is raised.
    pub price_jump_pct: f64,

    /// Bid/ask quantity ratio (either direction) above which an ORDER_IMBALANCE is raised.
    pub imbalance_ratio: f64,

    /// Spread z-score above which a SPREAD_ANOMALY is raised.
    pub spread_z: f64,

    /// Observations an instrument needs before time-series detection runs.
    pub min_history: usize,

    /// Snapshots retained per instrument; oldest is evicted first.
    pub history_capacity: usize,

    /// Cumulative move, in percent, that raises a RAPID_PRICE_MOVE.
    pub rapid_move_pct: f64,

    /// How many of the most recent observations the rapid-move test spans.
    pub rapid_move_lookback: usize,

    /// Observations older than this (relative to the current one) are not
    /// part of the rapid-move span.
    pub rapid_move_window: Duration,

    /// Length of the `top_flagged` ranking in reports.
    pub top_flagged_limit: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            volume_z: DEFAULT_VOLUME_Z,
            price_jump_pct: DEFAULT_PRICE_JUMP_PCT,
            imbalance_ratio: DEFAULT_IMBALANCE_RATIO,
            spread_z: DEFAULT_SPREAD_Z,
            min_history: DEFAULT_MIN_HISTORY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            rapid_move_pct: DEFAULT_RAPID_MOVE_PCT,
            rapid_move_lookback: DEFAULT_RAPID_MOVE_LOOKBACK,
            rapid_move_window: DEFAULT_RAPID_MOVE_WINDOW,
            top_flagged_limit: DEFAULT_TOP_FLAGGED_LIMIT,
        }
    }
}

impl DetectionConfig {
    /// Rejects thresholds that would make detection meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("volume_z", self.volume_z),
            ("price_jump_pct", self.price_jump_pct),
            ("imbalance_ratio", self.imbalance_ratio),
            ("spread_z", self.spread_z),
            ("rapid_move_pct", self.rapid_move_pct),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NonPositive { field, value });
            }
        }

        if self.min_history < 2 {
            return Err(ConfigError::MinHistoryTooSmall(self.min_history));
        }
        if self.history_capacity < self.min_history {
            return Err(ConfigError::CapacityBelowMinHistory {
                capacity: self.history_capacity,
                min_history: self.min_history,
            });
        }
        if self.rapid_move_lookback < 3 {
            return Err(ConfigError::LookbackTooShort(self.rapid_move_lookback));
        }
        if self.rapid_move_window.is_zero() {
            return Err(ConfigError::ZeroRapidWindow);
        }
        if self.top_flagged_limit == 0 {
            return Err(ConfigError::ZeroTopFlagged);
        }

        Ok(())
    }
}
