pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use market::Snapshot;
use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, REFERER, USER_AGENT};
use tracing::{debug, instrument, warn};

use crate::error::ProducerError;
use crate::producer::SnapshotProducer;
use crate::producer::bvmt::types::MarketsEnvelope;

const REFERER_PAGE: &str = "https://www.bvmt.com.tn/public/BvmtMarketStation/index.html";
const BROWSER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Live snapshot feed from the Bourse de Tunis REST API.
#[derive(Clone)]
pub struct BvmtClient {
    http: Client,
    url: String,
}

impl BvmtClient {
    pub fn new(url: String) -> Result<Self, ProducerError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_AGENT));
        headers.insert(REFERER, HeaderValue::from_static(REFERER_PAGE));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, url })
    }
}

#[async_trait]
impl SnapshotProducer for BvmtClient {
    #[instrument(skip(self), fields(url = %self.url), level = "debug")]
    async fn fetch(&self) -> Result<Vec<Snapshot>, ProducerError> {
        let resp = self.http.get(&self.url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProducerError::Status(status.as_u16()));
        }

        let body = resp.bytes().await?;
        let envelope: MarketsEnvelope =
            serde_json::from_slice(&body).map_err(|e| ProducerError::Decode(e.to_string()))?;

        let observed_at = Utc::now();
        let mut snapshots = Vec::with_capacity(envelope.markets.len());
        for entry in envelope.markets {
            if entry.isin.trim().is_empty() {
                warn!(ticker = %entry.referentiel.ticker, "feed row without isin skipped");
                continue;
            }
            snapshots.push(entry.into_snapshot(observed_at));
        }

        debug!(instruments = snapshots.len(), "bvmt snapshot fetched");

        Ok(snapshots)
    }

    fn name(&self) -> &'static str {
        "bvmt"
    }
}
