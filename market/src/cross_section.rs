use crate::config::DetectionConfig;
use crate::pulse::{imbalance, price, spread, volume};
use crate::report::AnomalyReport;
use crate::types::{AlertRecord, AnomalyType, Snapshot};

/// Compares every instrument in `batch` against the rest of the batch.
///
/// Stateless; nothing here remembers earlier batches. A batch of fewer than
/// two instruments has no dispersion and yields an empty report.
pub fn detect_batch(batch: &[Snapshot], config: &DetectionConfig) -> AnomalyReport {
    let alerts = detect_alerts(batch, config);
    let as_of = batch.iter().map(|s| s.timestamp).max();

    tracing::debug!(
        batch_size = batch.len(),
        total_alerts = alerts.len(),
        "cross-sectional pass complete"
    );

    AnomalyReport::from_alerts(alerts, as_of, config.top_flagged_limit)
}

/// Raw alerts of the cross-sectional pass, grouped by anomaly type.
pub fn detect_alerts(batch: &[Snapshot], config: &DetectionConfig) -> Vec<AlertRecord> {
    if batch.len() < 2 {
        return Vec::new();
    }

    AnomalyType::ALL
        .into_iter()
        .flat_map(|kind| detect_kind(kind, batch, config))
        .collect()
}

fn detect_kind(kind: AnomalyType, batch: &[Snapshot], config: &DetectionConfig) -> Vec<AlertRecord> {
    match kind {
        AnomalyType::VolumeSpike => volume::cross_section(batch, config),
        AnomalyType::PriceAnomaly => batch
            .iter()
            .filter_map(|s| price::cross_section(s, config))
            .collect(),
        AnomalyType::OrderImbalance => batch
            .iter()
            .filter_map(|s| imbalance::evaluate(s, config))
            .collect(),
        AnomalyType::SpreadAnomaly => spread::cross_section(batch, config),
        // needs history
        AnomalyType::RapidPriceMove => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::fixtures::{snap, t0};

    #[test]
    fn single_instrument_batch_is_empty() {
        let mut s = snap("TN0001", 0);
        s.variation_pct = 30.0;
        s.bid_quantity = 10_000;

        let report = detect_batch(&[s], &DetectionConfig::default());

        assert!(report.is_empty());
        assert!(report.alerts.is_empty());
        assert_eq!(report.as_of, Some(t0()));
    }

    #[test]
    fn alerts_are_grouped_by_type() {
        let mut batch: Vec<Snapshot> = (0..4).map(|i| snap(&format!("TN{i:04}"), 0)).collect();
        batch[0].bid_quantity = 1000;
        batch[3].variation_pct = 7.0;

        let kinds: Vec<AnomalyType> = detect_alerts(&batch, &DetectionConfig::default())
            .iter()
            .map(AlertRecord::anomaly_type)
            .collect();

        assert_eq!(
            kinds,
            vec![AnomalyType::PriceAnomaly, AnomalyType::OrderImbalance]
        );
    }

    #[test]
    fn as_of_is_newest_snapshot() {
        let batch = vec![snap("TN0001", 0), snap("TN0002", 45), snap("TN0003", 10)];

        let report = detect_batch(&batch, &DetectionConfig::default());
        assert_eq!(report.as_of, Some(t0() + chrono::Duration::seconds(45)));
    }
}
