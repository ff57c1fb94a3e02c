use crate::config::DetectionConfig;
use crate::pulse::{SeriesInput, imbalance, price, rapid, spread, volume};
use crate::rolling_history::RollingHistory;
use crate::types::{AlertRecord, AnomalyType};

/// Runs every time-series pulse on the newest entry of `history`.
///
/// Abstains entirely until the history holds `min_history` observations.
pub fn evaluate(history: &RollingHistory, config: &DetectionConfig) -> Vec<AlertRecord> {
    if history.len() < config.min_history {
        return Vec::new();
    }
    let Some(input) = SeriesInput::new(history, config) else {
        return Vec::new();
    };

    AnomalyType::ALL
        .into_iter()
        .filter_map(|kind| evaluate_kind(kind, &input))
        .collect()
}

fn evaluate_kind(kind: AnomalyType, input: &SeriesInput<'_>) -> Option<AlertRecord> {
    match kind {
        AnomalyType::VolumeSpike => volume::series(input),
        AnomalyType::PriceAnomaly => price::series(input),
        AnomalyType::OrderImbalance => imbalance::evaluate(input.current, input.config),
        AnomalyType::SpreadAnomaly => spread::series(input),
        AnomalyType::RapidPriceMove => rapid::series(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::fixtures::snap;

    #[test]
    fn abstains_below_min_history() {
        let cfg = DetectionConfig::default();
        let mut h = RollingHistory::new(cfg.history_capacity);

        let mut loud = snap("TN0001", 0);
        loud.bid_quantity = 10_000;
        loud.ask_quantity = 1;
        h.push(loud.clone()).unwrap();
        assert!(evaluate(&h, &cfg).is_empty());

        loud.timestamp += chrono::Duration::seconds(30);
        h.push(loud.clone()).unwrap();
        assert!(evaluate(&h, &cfg).is_empty());

        loud.timestamp += chrono::Duration::seconds(30);
        h.push(loud).unwrap();
        let alerts = evaluate(&h, &cfg);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].anomaly_type(), AnomalyType::OrderImbalance);
    }

    #[test]
    fn quiet_history_raises_nothing() {
        let cfg = DetectionConfig::default();
        let mut h = RollingHistory::new(cfg.history_capacity);
        for i in 0..20 {
            h.push(snap("TN0001", i * 30)).unwrap();
        }

        assert!(evaluate(&h, &cfg).is_empty());
    }

    #[test]
    fn empty_history_raises_nothing() {
        let cfg = DetectionConfig {
            min_history: 2,
            ..Default::default()
        };
        assert!(evaluate(&RollingHistory::new(5), &cfg).is_empty());
    }
}
