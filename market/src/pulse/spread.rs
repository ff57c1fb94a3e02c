//! Spread Pulse
//!
//! Measures the quoted `ask - bid` spread and flags values that sit far in
//! the upper tail, either against the other instruments of the same batch or
//! against the instrument's own recent spreads. Instruments quoting only one
//! side carry no spread and are left out of both the sample and the test.

use super::SeriesInput;
use crate::config::DetectionConfig;
use crate::stats::Moments;
use crate::types::{AlertRecord, AnomalyType, Snapshot};

fn raise(
    snapshot: &Snapshot,
    spread: f64,
    z: f64,
    threshold: f64,
    config: &DetectionConfig,
    scope: &str,
) -> AlertRecord {
    AlertRecord::raise(
        snapshot,
        AnomalyType::SpreadAnomaly,
        z / config.spread_z,
        spread,
        threshold,
        format!("Abnormal spread: {spread:.3} (z={z:.1}σ)"),
        format!(
            "{scope} bid={:.3} ask={:.3}",
            snapshot.bid_price, snapshot.ask_price
        ),
    )
}

/// Batch-wide z-score test. Needs two quoted instruments and non-zero dispersion.
pub fn cross_section(batch: &[Snapshot], config: &DetectionConfig) -> Vec<AlertRecord> {
    let quoted: Vec<(&Snapshot, f64)> = batch
        .iter()
        .filter_map(|s| s.spread().map(|sp| (s, sp)))
        .collect();
    if quoted.len() < 2 {
        return Vec::new();
    }

    let Some(m) = Moments::of(quoted.iter().map(|(_, sp)| *sp)) else {
        return Vec::new();
    };
    if m.std_dev <= 0.0 {
        return Vec::new();
    }

    let threshold = m.upper_band(config.spread_z);

    quoted
        .into_iter()
        .filter(|(_, sp)| *sp > threshold)
        .filter_map(|(s, sp)| {
            let z = m.z_score(sp)?;
            Some(raise(s, sp, z, threshold, config, "batch"))
        })
        .collect()
}

/// Current spread against the instrument's prior quoted spreads.
/// Abstains while those spreads have not moved at all.
pub fn series(input: &SeriesInput<'_>) -> Option<AlertRecord> {
    let config = input.config;
    let current = input.current;
    let spread = current.spread()?;

    let m = Moments::of(input.history.prior().filter_map(Snapshot::spread))?;
    if m.count < 2 {
        return None;
    }

    let z = m.z_score(spread)?;
    if z <= config.spread_z {
        return None;
    }
    let threshold = m.upper_band(config.spread_z);

    Some(raise(current, spread, z, threshold, config, "rolling"))
}
