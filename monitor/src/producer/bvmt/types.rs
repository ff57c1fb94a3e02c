use chrono::{DateTime, Utc};
use market::Snapshot;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct MarketsEnvelope {
    #[serde(default)]
    pub markets: Vec<MarketEntry>,
}

/// One row of the market-groups feed. Numeric fields arrive as numbers, as
/// strings or not at all; missing ones read as zero.
#[derive(Debug, Deserialize)]
pub struct MarketEntry {
    #[serde(default)]
    pub isin: String,

    #[serde(default)]
    pub referentiel: Referentiel,

    #[serde(default)]
    pub limit: Limit,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub last: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub close: f64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub change: f64,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub volume: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Referentiel {
    #[serde(default)]
    pub stock_name: String,

    #[serde(default)]
    pub ticker: String,
}

/// Best limits. The feed's `ask` is the buy side and `bid` the sell side.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Limit {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub ask: f64,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub ask_qty: u64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub bid: f64,

    #[serde(default, deserialize_with = "lenient_u64")]
    pub bid_qty: u64,
}

impl MarketEntry {
    /// Maps the feed row onto a [`Snapshot`], swapping the feed's side labels
    /// so `bid_*` is the buy side.
    pub fn into_snapshot(self, observed_at: DateTime<Utc>) -> Snapshot {
        let name = if self.referentiel.stock_name.is_empty() {
            self.referentiel.ticker
        } else {
            self.referentiel.stock_name
        };

        Snapshot {
            identifier: self.isin,
            name,
            last_price: self.last,
            reference_price: self.close,
            variation_pct: self.change,
            bid_price: self.limit.ask,
            bid_quantity: self.limit.ask_qty,
            ask_price: self.limit.bid,
            ask_quantity: self.limit.bid_qty,
            volume: self.volume,
            timestamp: observed_at,
        }
    }
}

fn lenient_f64<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom(format!("not representable as f64: {n}"))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
        Some(Value::String(s)) => s
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| D::Error::custom(format!("not a number: {s:?}"))),
        Some(other) => Err(D::Error::custom(format!("unexpected value: {other}"))),
    }
}

fn lenient_u64<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let v = lenient_f64(de)?;
    if !v.is_finite() || v < 0.0 || v.fract() != 0.0 {
        return Err(D::Error::custom(format!("not a quantity: {v}")));
    }
    Ok(v as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_sides_are_swapped() {
        let raw = r#"{
            "markets": [{
                "isin": "TN0001100254",
                "referentiel": { "stockName": "BIAT", "ticker": "BIAT" },
                "limit": { "ask": 95.1, "askQty": 120, "bid": 95.5, "bidQty": "40" },
                "last": 95.3, "close": 94.0, "change": "1.38", "volume": 1520,
                "status": "S  "
            }]
        }"#;

        let env: MarketsEnvelope = serde_json::from_str(raw).unwrap();
        let s = env
            .markets
            .into_iter()
            .next()
            .unwrap()
            .into_snapshot(DateTime::<Utc>::UNIX_EPOCH);

        assert_eq!(s.identifier, "TN0001100254");
        assert_eq!(s.name, "BIAT");
        assert_eq!(s.bid_price, 95.1);
        assert_eq!(s.bid_quantity, 120);
        assert_eq!(s.ask_price, 95.5);
        assert_eq!(s.ask_quantity, 40);
        assert_eq!(s.variation_pct, 1.38);
    }

    #[test]
    fn missing_and_null_fields_read_as_zero() {
        let raw = r#"{ "markets": [{ "isin": "X", "last": null, "limit": {} }] }"#;

        let env: MarketsEnvelope = serde_json::from_str(raw).unwrap();
        let entry = &env.markets[0];

        assert_eq!(entry.last, 0.0);
        assert_eq!(entry.volume, 0);
        assert_eq!(entry.limit.bid_qty, 0);
    }

    #[test]
    fn non_numeric_quantity_is_rejected() {
        let raw = r#"{ "markets": [{ "isin": "X", "volume": "many" }] }"#;
        assert!(serde_json::from_str::<MarketsEnvelope>(raw).is_err());
    }

    #[test]
    fn fractional_quantity_is_rejected() {
        let raw = r#"{ "markets": [{ "isin": "X", "limit": { "askQty": "12.7" } }] }"#;
        assert!(serde_json::from_str::<MarketsEnvelope>(raw).is_err());

        let whole = r#"{ "markets": [{ "isin": "X", "limit": { "askQty": "12.0" } }] }"#;
        let env: MarketsEnvelope = serde_json::from_str(whole).unwrap();
        assert_eq!(env.markets[0].limit.ask_qty, 12);
    }
}
