use crate::config::DetectionConfig;
use crate::types::{AlertRecord, AnomalyType, BookSide, Snapshot};

/// Flags a book where one side's quantity exceeds the other by more than
/// `imbalance_ratio`. Abstains when either side is empty.
///
/// The test only needs the snapshot itself, so the cross-sectional and the
/// time-series passes share it.
pub fn evaluate(snapshot: &Snapshot, config: &DetectionConfig) -> Option<AlertRecord> {
    let (ratio, side) = snapshot.imbalance_ratio()?;
    if ratio <= config.imbalance_ratio {
        return None;
    }

    let pressure = match side {
        BookSide::Buy => "buy",
        BookSide::Sell => "sell",
    };

    Some(AlertRecord::raise(
        snapshot,
        AnomalyType::OrderImbalance,
        ratio / config.imbalance_ratio,
        ratio,
        config.imbalance_ratio,
        format!("Order imbalance: {pressure}-side pressure (ratio {ratio:.1}x)"),
        format!(
            "bid_qty={} ask_qty={}",
            snapshot.bid_quantity, snapshot.ask_quantity
        ),
    ))
}
