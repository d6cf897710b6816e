use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::types::{parse_catalog, parse_last_price, ListingEntry};
use crate::core::config::ExchangeConfig;
use crate::core::{TrackerError, TrackerResult};

const CONTRACT_DETAIL_ENDPOINT: &str = "/api/v1/contract/detail";
const CONTRACT_TICKER_ENDPOINT: &str = "/api/v1/contract/ticker";

/// Read-only view of a futures exchange.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeApi: Send + Sync {
    /// Full catalog of tradable contracts.
    async fn list_contracts(&self) -> TrackerResult<Vec<ListingEntry>>;

    /// Last traded price, `Ok(None)` when the ticker carries no usable price.
    async fn ticker_price(&self, symbol: &str) -> TrackerResult<Option<f64>>;
}

pub struct MexcClient {
    client: Client,
    base_url: String,
}

impl MexcClient {
    pub fn new(config: &ExchangeConfig) -> TrackerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, endpoint: &str, query: &[(&str, &str)]) -> TrackerResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::debug!("MEXC API error: {} - {}", status, body);
            return Err(TrackerError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ExchangeApi for MexcClient {
    async fn list_contracts(&self) -> TrackerResult<Vec<ListingEntry>> {
        let body = self.get_json(CONTRACT_DETAIL_ENDPOINT, &[]).await?;
        parse_catalog(body)
    }

    async fn ticker_price(&self, symbol: &str) -> TrackerResult<Option<f64>> {
        let body = self
            .get_json(CONTRACT_TICKER_ENDPOINT, &[("symbol", symbol)])
            .await?;
        Ok(parse_last_price(&body))
    }
}
