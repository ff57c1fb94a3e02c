use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AlertRecord, AnomalyType, Severity};

/// One entry of the most-flagged ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlaggedInstrument {
    pub identifier: String,
    pub name: String,
    pub count: usize,
}

/// Running alert counters, updated one alert at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlertTally {
    total: usize,
    by_type: BTreeMap<AnomalyType, usize>,
    by_severity: BTreeMap<Severity, usize>,
    per_instrument: HashMap<String, FlaggedInstrument>,
}

impl AlertTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_alerts<'a, I>(alerts: I) -> Self
    where
        I: IntoIterator<Item = &'a AlertRecord>,
    {
        let mut tally = Self::new();
        for alert in alerts {
            tally.record(alert);
        }
        tally
    }

    pub fn record(&mut self, alert: &AlertRecord) {
        self.total += 1;
        *self.by_type.entry(alert.anomaly_type()).or_default() += 1;
        *self.by_severity.entry(alert.severity()).or_default() += 1;

        self.per_instrument
            .entry(alert.identifier().to_string())
            .or_insert_with(|| FlaggedInstrument {
                identifier: alert.identifier().to_string(),
                name: alert.name().to_string(),
                count: 0,
            })
            .count += 1;
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Count per anomaly type; every type is present, unseen ones at zero.
    pub fn by_type(&self) -> BTreeMap<AnomalyType, usize> {
        AnomalyType::ALL
            .into_iter()
            .map(|t| (t, self.by_type.get(&t).copied().unwrap_or(0)))
            .collect()
    }

    /// Count per severity; every grade is present, unseen ones at zero.
    pub fn by_severity(&self) -> BTreeMap<Severity, usize> {
        Severity::ALL
            .into_iter()
            .map(|s| (s, self.by_severity.get(&s).copied().unwrap_or(0)))
            .collect()
    }

    /// Most-flagged instruments: count descending, identifier ascending on ties.
    pub fn top_flagged(&self, limit: usize) -> Vec<FlaggedInstrument> {
        let mut ranked: Vec<FlaggedInstrument> = self.per_instrument.values().cloned().collect();
        ranked.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });
        ranked.truncate(limit);
        ranked
    }
}

/// Summary of a set of alerts. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyReport {
    /// Timestamp of the newest snapshot that contributed, if any.
    pub as_of: Option<DateTime<Utc>>,
    pub total_alerts: usize,
    pub alerts: Vec<AlertRecord>,
    pub by_type: BTreeMap<AnomalyType, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub top_flagged: Vec<FlaggedInstrument>,
}

impl AnomalyReport {
    /// Report over `alerts` using the matching, already-maintained `tally`.
    pub fn from_tally(
        alerts: Vec<AlertRecord>,
        tally: &AlertTally,
        as_of: Option<DateTime<Utc>>,
        top_limit: usize,
    ) -> Self {
        Self {
            as_of,
            total_alerts: tally.total(),
            alerts,
            by_type: tally.by_type(),
            by_severity: tally.by_severity(),
            top_flagged: tally.top_flagged(top_limit),
        }
    }

    pub fn from_alerts(
        alerts: Vec<AlertRecord>,
        as_of: Option<DateTime<Utc>>,
        top_limit: usize,
    ) -> Self {
        let tally = AlertTally::from_alerts(&alerts);
        Self::from_tally(alerts, &tally, as_of, top_limit)
    }

    /// All counters at zero.
    pub fn empty() -> Self {
        Self::from_alerts(Vec::new(), None, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_alerts == 0
    }

    /// Alerts of one type.
    pub fn of_type(&self, kind: AnomalyType) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.iter().filter(move |a| a.anomaly_type() == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionConfig;
    use crate::pulse::fixtures::snap;
    use crate::pulse::imbalance;

    fn imbalance_alert(id: &str) -> AlertRecord {
        let mut s = snap(id, 0);
        s.bid_quantity = 1000;
        s.ask_quantity = 10;
        imbalance::evaluate(&s, &DetectionConfig::default()).unwrap()
    }

    #[test]
    fn empty_report_has_zero_counters_for_every_key() {
        let r = AnomalyReport::empty();

        assert_eq!(r.total_alerts, 0);
        assert!(r.top_flagged.is_empty());
        assert_eq!(r.by_type.len(), AnomalyType::ALL.len());
        assert!(r.by_type.values().all(|c| *c == 0));
        assert_eq!(r.by_severity.len(), Severity::ALL.len());
        assert!(r.by_severity.values().all(|c| *c == 0));
    }

    #[test]
    fn ranking_breaks_ties_by_identifier() {
        let alerts = vec![
            imbalance_alert("TN0003"),
            imbalance_alert("TN0002"),
            imbalance_alert("TN0003"),
            imbalance_alert("TN0001"),
            imbalance_alert("TN0002"),
        ];

        let r = AnomalyReport::from_alerts(alerts, None, 10);
        let ranked: Vec<(&str, usize)> = r
            .top_flagged
            .iter()
            .map(|f| (f.identifier.as_str(), f.count))
            .collect();

        assert_eq!(ranked, vec![("TN0002", 2), ("TN0003", 2), ("TN0001", 1)]);
        assert_eq!(r.total_alerts, 5);
        assert_eq!(r.by_type[&AnomalyType::OrderImbalance], 5);
        assert_eq!(r.by_severity[&Severity::Critical], 5);
    }

    #[test]
    fn ranking_is_truncated() {
        let alerts: Vec<AlertRecord> = (0..15)
            .map(|i| imbalance_alert(&format!("TN{i:04}")))
            .collect();

        let r = AnomalyReport::from_alerts(alerts, None, 10);
        assert_eq!(r.top_flagged.len(), 10);
        assert_eq!(r.top_flagged[0].identifier, "TN0000");
    }

    #[test]
    fn report_serializes_with_string_keys() {
        let r = AnomalyReport::from_alerts(vec![imbalance_alert("TN0001")], None, 10);
        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(json["by_type"]["ORDER_IMBALANCE"], 1);
        assert_eq!(json["by_severity"]["INFO"], 0);
        assert_eq!(json["top_flagged"][0]["identifier"], "TN0001");
    }
}
