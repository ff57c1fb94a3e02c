use super::SeriesInput;
use crate::config::DetectionConfig;
use crate::stats::Moments;
use crate::types::{AlertRecord, AnomalyType, Snapshot};

/// Flags instruments whose volume exceeds `mean + volume_z * stddev` of the batch.
///
/// Abstains for batches under two instruments or with zero dispersion.
pub fn cross_section(batch: &[Snapshot], config: &DetectionConfig) -> Vec<AlertRecord> {
    if batch.len() < 2 {
        return Vec::new();
    }
    let Some(m) = Moments::of(batch.iter().map(|s| s.volume as f64)) else {
        return Vec::new();
    };
    if m.std_dev <= 0.0 {
        return Vec::new();
    }

    let threshold = m.upper_band(config.volume_z);

    batch
        .iter()
        .filter(|s| s.volume as f64 > threshold)
        .filter_map(|s| {
            let z = m.z_score(s.volume as f64)?;
            Some(AlertRecord::raise(
                s,
                AnomalyType::VolumeSpike,
                z / config.volume_z,
                s.volume as f64,
                threshold,
                format!("Volume spike: {} units (z={z:.1}σ)", s.volume),
                format!(
                    "batch mean={:.0} std={:.0} last={:.3}",
                    m.mean, m.std_dev, s.last_price
                ),
            ))
        })
        .collect()
}

/// z-score of the current volume against the instrument's prior volumes.
///
/// Uses the clipped stddev so a perfectly flat history still trips on a jump.
pub fn series(input: &SeriesInput<'_>) -> Option<AlertRecord> {
    let config = input.config;
    let current = input.current;

    let m = Moments::of(input.history.prior().map(|s| s.volume as f64))?;
    let volume = current.volume as f64;
    let z = m.clipped_z_score(volume);
    if z <= config.volume_z {
        return None;
    }

    let threshold = m.mean + config.volume_z * m.clipped_std_dev();

    Some(AlertRecord::raise(
        current,
        AnomalyType::VolumeSpike,
        z / config.volume_z,
        volume,
        threshold,
        format!("Volume spike: {} units (z={z:.1}σ)", current.volume),
        format!(
            "rolling mean={:.0} std={:.0} samples={}",
            m.mean, m.std_dev, m.count
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pulse::fixtures::snap;
    use crate::rolling_history::RollingHistory;
    use crate::types::Severity;

    fn batch_with_outlier(outlier: u64) -> Vec<Snapshot> {
        let mut batch: Vec<Snapshot> = (0..15)
            .map(|i| snap(&format!("TN{i:04}"), 0))
            .collect();
        batch[7].volume = outlier;
        batch
    }

    #[test]
    fn cross_section_flags_outlier_only() {
        let batch = batch_with_outlier(10_000);
        let alerts = cross_section(&batch, &DetectionConfig::default());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].identifier(), "TN0007");
        assert_eq!(alerts[0].anomaly_type(), AnomalyType::VolumeSpike);
        assert!(alerts[0].threshold() < 10_000.0);
    }

    #[test]
    fn cross_section_abstains_on_flat_or_tiny_batch() {
        let cfg = DetectionConfig::default();
        let flat: Vec<Snapshot> = (0..5).map(|i| snap(&format!("TN{i:04}"), 0)).collect();

        assert!(cross_section(&flat, &cfg).is_empty());
        assert!(cross_section(&flat[..1], &cfg).is_empty());
    }

    #[test]
    fn series_flat_history_then_jump_is_critical() {
        let cfg = DetectionConfig::default();
        let mut h = RollingHistory::new(cfg.history_capacity);
        for (i, v) in [100, 100, 100, 100, 1000].into_iter().enumerate() {
            let mut s = snap("TN0001", i as i64 * 30);
            s.volume = v;
            h.push(s).unwrap();
        }

        let input = SeriesInput::new(&h, &cfg).unwrap();
        let alert = series(&input).unwrap();

        assert_eq!(alert.severity(), Severity::Critical);
        assert_eq!(alert.current_value(), 1000.0);
    }

    #[test]
    fn series_quiet_volume_is_silent() {
        let cfg = DetectionConfig::default();
        let mut h = RollingHistory::new(cfg.history_capacity);
        for (i, v) in [100, 120, 90, 110, 105].into_iter().enumerate() {
            let mut s = snap("TN0001", i as i64 * 30);
            s.volume = v;
            h.push(s).unwrap();
        }

        let input = SeriesInput::new(&h, &cfg).unwrap();
        assert!(series(&input).is_none());
    }
}
