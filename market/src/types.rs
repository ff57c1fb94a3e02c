use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observation of an instrument's market state.
///
/// `bid_*` is always the buy side and `ask_*` the sell side, whatever labels
/// the upstream feed uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Stable key (exchange code / ISIN).
    pub identifier: String,
    pub name: String,

    pub last_price: f64,
    pub reference_price: f64,
    /// Variation of `last_price` against `reference_price`, in percent.
    pub variation_pct: f64,

    pub bid_price: f64,
    pub bid_quantity: u64,
    pub ask_price: f64,
    pub ask_quantity: u64,

    /// Traded quantity.
    pub volume: u64,

    pub timestamp: DateTime<Utc>,
}

/// Which side of the book dominates an imbalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Buy,
    Sell,
}

impl Snapshot {
    /// `ask - bid`, only when both sides are quoted.
    pub fn spread(&self) -> Option<f64> {
        if self.bid_price > 0.0 && self.ask_price > 0.0 {
            Some(self.ask_price - self.bid_price)
        } else {
            None
        }
    }

    /// Larger of `bid_qty / ask_qty` and its inverse, with the heavier side.
    ///
    /// `None` when either side has no quantity (ratio not computable).
    pub fn imbalance_ratio(&self) -> Option<(f64, BookSide)> {
        if self.bid_quantity == 0 || self.ask_quantity == 0 {
            return None;
        }
        let bid = self.bid_quantity as f64;
        let ask = self.ask_quantity as f64;
        if bid >= ask {
            Some((bid / ask, BookSide::Buy))
        } else {
            Some((ask / bid, BookSide::Sell))
        }
    }

    /// True when every float field is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.last_price,
            self.reference_price,
            self.variation_pct,
            self.bid_price,
            self.ask_price,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Closed set of anomaly kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    VolumeSpike,
    PriceAnomaly,
    OrderImbalance,
    SpreadAnomaly,
    RapidPriceMove,
}

impl AnomalyType {
    pub const ALL: [AnomalyType; 5] = [
        AnomalyType::VolumeSpike,
        AnomalyType::PriceAnomaly,
        AnomalyType::OrderImbalance,
        AnomalyType::SpreadAnomaly,
        AnomalyType::RapidPriceMove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::VolumeSpike => "VOLUME_SPIKE",
            AnomalyType::PriceAnomaly => "PRICE_ANOMALY",
            AnomalyType::OrderImbalance => "ORDER_IMBALANCE",
            AnomalyType::SpreadAnomaly => "SPREAD_ANOMALY",
            AnomalyType::RapidPriceMove => "RAPID_PRICE_MOVE",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal alert grade, `Info < Warning < Critical`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    Info,
    Warning,
    Critical,
}

/// Ratio of observed deviation to threshold at which an alert becomes WARNING.
pub const WARNING_RATIO: f64 = 1.5;
/// Ratio of observed deviation to threshold at which an alert becomes CRITICAL.
pub const CRITICAL_RATIO: f64 = 2.0;

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Info, Severity::Warning, Severity::Critical];

    /// Grades `ratio = observed deviation / triggering threshold`.
    ///
    /// Monotonic in `ratio`, identical for every anomaly type.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= CRITICAL_RATIO {
            Severity::Critical
        } else if ratio >= WARNING_RATIO {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raised alert. Immutable once built by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    timestamp: DateTime<Utc>,
    identifier: String,
    name: String,
    anomaly_type: AnomalyType,
    severity: Severity,
    message: String,
    current_value: f64,
    threshold: f64,
    details: String,
}

impl AlertRecord {
    /// Builds an alert for `snapshot`, grading severity from `ratio`.
    pub(crate) fn raise(
        snapshot: &Snapshot,
        anomaly_type: AnomalyType,
        ratio: f64,
        current_value: f64,
        threshold: f64,
        message: String,
        details: String,
    ) -> Self {
        let severity = Severity::from_ratio(ratio);

        tracing::debug!(
            identifier = %snapshot.identifier,
            anomaly_type = %anomaly_type,
            severity = %severity,
            current_value,
            threshold,
            "anomaly raised"
        );

        Self {
            timestamp: snapshot.timestamp,
            identifier: snapshot.identifier.clone(),
            name: snapshot.name.clone(),
            anomaly_type,
            severity,
            message,
            current_value,
            threshold,
            details,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn anomaly_type(&self) -> AnomalyType {
        self.anomaly_type
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}
