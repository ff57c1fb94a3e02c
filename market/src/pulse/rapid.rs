use super::SeriesInput;
use super::price::single_tick_change;
use crate::stats::pct_change;
use crate::types::{AlertRecord, AnomalyType, Snapshot};

/// Rapid Price Move Pulse
///
/// Cumulative move of the last price across the most recent observations
/// (at most `rapid_move_lookback`, all within `rapid_move_window` of the
/// current one). At least three observations must qualify and at least two
/// of the steps between them must move in the direction of the net change,
/// so one jump after a flat stretch is not a drift. A tick whose single-step
/// change already exceeds `price_jump_pct` is left to the price pulse.
pub fn series(input: &SeriesInput<'_>) -> Option<AlertRecord> {
    let config = input.config;
    let current = input.current;

    if single_tick_change(input.history).is_some_and(|c| c.abs() > config.price_jump_pct) {
        return None;
    }

    let span: Vec<&Snapshot> = input
        .history
        .iter()
        .rev()
        .take(config.rapid_move_lookback)
        .take_while(|s| {
            (current.timestamp - s.timestamp)
                .to_std()
                .is_ok_and(|age| age <= config.rapid_move_window)
        })
        .collect();
    if span.len() < 3 {
        return None;
    }

    let base = span.last()?;
    let change = pct_change(base.last_price, current.last_price)?;
    let pct = change.abs();
    if pct <= config.rapid_move_pct {
        return None;
    }

    let with_trend = span
        .windows(2)
        .filter(|w| (w[0].last_price - w[1].last_price) * change > 0.0)
        .count();
    if with_trend < 2 {
        return None;
    }

    let elapsed = (current.timestamp - base.timestamp).num_seconds();

    Some(AlertRecord::raise(
        current,
        AnomalyType::RapidPriceMove,
        pct / config.rapid_move_pct,
        pct,
        config.rapid_move_pct,
        format!(
            "Rapid price move: {change:+.2}% over {} observations",
            span.len()
        ),
        format!(
            "from={:.3} to={:.3} elapsed={elapsed}s",
            base.last_price, current.last_price
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::pulse::fixtures::snap;
    use crate::rolling_history::RollingHistory;
    use crate::types::Severity;

    fn history(prices: &[f64], step_secs: i64) -> RollingHistory {
        let mut h = RollingHistory::new(50);
        for (i, p) in prices.iter().enumerate() {
            let mut s = snap("TN0001", i as i64 * step_secs);
            s.last_price = *p;
            h.push(s).unwrap();
        }
        h
    }

    #[test]
    fn multi_tick_drift_is_flagged() {
        let cfg = DetectionConfig::default();
        // +1.5% then +1.5%: neither tick is a price jump, the drift is ~3%
        let h = history(&[10.0, 10.0, 10.15, 10.30], 30);

        let alert = series(&SeriesInput::new(&h, &cfg).unwrap()).unwrap();

        assert_eq!(alert.anomaly_type(), AnomalyType::RapidPriceMove);
        assert!((alert.current_value() - 3.0).abs() < 1e-9);
        assert_eq!(alert.severity(), Severity::Warning);
        assert!(alert.message().contains("3 observations"));
    }

    #[test]
    fn single_sharp_jump_is_left_to_the_price_pulse() {
        let cfg = DetectionConfig::default();
        let h = history(&[10.0, 10.0, 10.0, 11.0], 30);

        assert!(series(&SeriesInput::new(&h, &cfg).unwrap()).is_none());
    }

    #[test]
    fn one_step_after_a_flat_stretch_is_not_a_drift() {
        let cfg = DetectionConfig::default();
        let h = history(&[10.0, 10.0, 10.0, 10.0, 10.0, 10.30], 30);

        assert!(series(&SeriesInput::new(&h, &cfg).unwrap()).is_none());
    }

    #[test]
    fn falling_drift_is_flagged() {
        let cfg = DetectionConfig::default();
        let h = history(&[10.0, 10.0, 9.85, 9.70], 30);

        let alert = series(&SeriesInput::new(&h, &cfg).unwrap()).unwrap();
        assert!(alert.message().contains("-3.00%"));
    }

    #[test]
    fn observations_outside_the_window_do_not_count() {
        let cfg = DetectionConfig::default();
        // ten minutes between observations, window is five
        let h = history(&[10.0, 10.0, 10.15, 10.30], 600);

        assert!(series(&SeriesInput::new(&h, &cfg).unwrap()).is_none());
    }

    #[test]
    fn small_drift_is_silent() {
        let cfg = DetectionConfig::default();
        let h = history(&[10.0, 10.05, 10.1, 10.15], 30);

        assert!(series(&SeriesInput::new(&h, &cfg).unwrap()).is_none());
    }
}
