use super::SeriesInput;
use crate::config::DetectionConfig;
use crate::rolling_history::RollingHistory;
use crate::stats::pct_change;
use crate::types::{AlertRecord, AnomalyType, Snapshot};

fn direction(change: f64) -> &'static str {
    if change > 0.0 { "UP" } else { "DOWN" }
}

/// Flags a snapshot whose reported variation exceeds `price_jump_pct`.
pub fn cross_section(snapshot: &Snapshot, config: &DetectionConfig) -> Option<AlertRecord> {
    let pct = snapshot.variation_pct.abs();
    if pct <= config.price_jump_pct {
        return None;
    }

    Some(AlertRecord::raise(
        snapshot,
        AnomalyType::PriceAnomaly,
        pct / config.price_jump_pct,
        pct,
        config.price_jump_pct,
        format!(
            "Abnormal price: {} {pct:.2}%",
            direction(snapshot.variation_pct)
        ),
        format!(
            "reference={:.3} last={:.3}",
            snapshot.reference_price, snapshot.last_price
        ),
    ))
}

/// Percentage change between the two most recent observations.
pub fn single_tick_change(history: &RollingHistory) -> Option<f64> {
    let prev = history.previous()?;
    let current = history.latest()?;
    pct_change(prev.last_price, current.last_price)
}

/// Flags a single-tick jump of the last price above `price_jump_pct`.
pub fn series(input: &SeriesInput<'_>) -> Option<AlertRecord> {
    let config = input.config;
    let change = single_tick_change(input.history)?;
    let pct = change.abs();
    if pct <= config.price_jump_pct {
        return None;
    }

    let prev = input.history.previous()?;
    let current = input.current;

    Some(AlertRecord::raise(
        current,
        AnomalyType::PriceAnomaly,
        pct / config.price_jump_pct,
        pct,
        config.price_jump_pct,
        format!("Price jump: {} {pct:.2}% since last observation", direction(change)),
        format!("before={:.3} after={:.3}", prev.last_price, current.last_price),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::fixtures::snap;
    use crate::types::Severity;

    #[test]
    fn variation_above_threshold_is_graded_by_ratio() {
        let cfg = DetectionConfig::default();
        let mut s = snap("TN0001", 0);

        s.variation_pct = 6.2;
        let info = cross_section(&s, &cfg).unwrap();
        assert_eq!(info.severity(), Severity::Info);
        assert!((info.current_value() - 6.2).abs() < 1e-12);
        assert_eq!(info.threshold(), 5.0);

        s.variation_pct = -8.0;
        assert_eq!(cross_section(&s, &cfg).unwrap().severity(), Severity::Warning);

        s.variation_pct = 10.0;
        assert_eq!(cross_section(&s, &cfg).unwrap().severity(), Severity::Critical);
    }

    #[test]
    fn variation_at_threshold_is_not_an_anomaly() {
        let mut s = snap("TN0001", 0);
        s.variation_pct = 5.0;

        assert!(cross_section(&s, &DetectionConfig::default()).is_none());
    }

    #[test]
    fn series_compares_against_previous_close() {
        let cfg = DetectionConfig::default();
        let mut h = RollingHistory::new(10);
        for (i, price) in [10.0, 10.0, 8.5].into_iter().enumerate() {
            let mut s = snap("TN0001", i as i64 * 30);
            s.last_price = price;
            h.push(s).unwrap();
        }

        let alert = series(&SeriesInput::new(&h, &cfg).unwrap()).unwrap();

        assert!((alert.current_value() - 15.0).abs() < 1e-9);
        assert_eq!(alert.severity(), Severity::Critical);
        assert!(alert.message().contains("DOWN"));
    }
}
