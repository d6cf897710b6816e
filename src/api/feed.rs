use std::sync::Arc;

use super::mexc::ExchangeApi;
use super::types::ListingEntry;
use crate::core::{Component, HealthChecker};
use crate::monitoring::metrics::TrackerMetrics;

/// Infallible front for an [`ExchangeApi`]: failures are logged, counted and
/// turned into an empty catalog or a missing price. Nothing is retried.
pub struct ExchangeFeed {
    api: Arc<dyn ExchangeApi>,
    metrics: TrackerMetrics,
    health: HealthChecker,
}

impl ExchangeFeed {
    pub fn new(api: Arc<dyn ExchangeApi>, metrics: TrackerMetrics, health: HealthChecker) -> Self {
        Self {
            api,
            metrics,
            health,
        }
    }

    pub async fn fetch_listings(&self) -> Vec<ListingEntry> {
        match self.api.list_contracts().await {
            Ok(listings) => {
                self.health.update_component(Component::ExchangeApi, true).await;
                listings
            }
            Err(e) => {
                tracing::error!("❌ Error fetching tokens: {}", e);
                self.metrics.listing_fetch_failures_total.inc();
                self.health.update_component(Component::ExchangeApi, false).await;
                Vec::new()
            }
        }
    }

    pub async fn fetch_price(&self, symbol: &str) -> Option<f64> {
        match self.api.ticker_price(symbol).await {
            Ok(Some(price)) => {
                self.health.update_component(Component::ExchangeApi, true).await;
                Some(price)
            }
            Ok(None) => {
                tracing::warn!("No usable lastPrice for {}", symbol);
                self.metrics.price_fetch_failures_total.inc();
                None
            }
            Err(e) => {
                tracing::error!("❌ Error fetching price for {}: {}", symbol, e);
                self.metrics.price_fetch_failures_total.inc();
                self.health.update_component(Component::ExchangeApi, false).await;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mexc::MockExchangeApi;
    use crate::core::TrackerError;

    fn feed(api: MockExchangeApi) -> (ExchangeFeed, TrackerMetrics, HealthChecker) {
        let metrics = TrackerMetrics::new().unwrap();
        let health = HealthChecker::new();
        (
            ExchangeFeed::new(Arc::new(api), metrics.clone(), health.clone()),
            metrics,
            health,
        )
    }

    #[tokio::test]
    async fn listing_failure_yields_empty_catalog() {
        let mut api = MockExchangeApi::new();
        api.expect_list_contracts()
            .times(1)
            .returning(|| Err(TrackerError::Parse("boom".to_string())));

        let (feed, metrics, health) = feed(api);
        assert!(feed.fetch_listings().await.is_empty());
        assert_eq!(metrics.listing_fetch_failures_total.get(), 1);
        assert_eq!(
            health.get_status().await.components.get(Component::ExchangeApi),
            Some(false)
        );
    }

    #[tokio::test]
    async fn price_failure_and_missing_price_are_absent() {
        let mut api = MockExchangeApi::new();
        api.expect_ticker_price().returning(|symbol| match symbol {
            "DOWN_USDT" => Err(TrackerError::Status {
                url: "ticker".to_string(),
                status: 500,
                body: String::new(),
            }),
            "ZERO_USDT" => Ok(None),
            _ => Ok(Some(1.5)),
        });

        let (feed, metrics, _) = feed(api);
        assert_eq!(feed.fetch_price("DOWN_USDT").await, None);
        assert_eq!(feed.fetch_price("ZERO_USDT").await, None);
        assert_eq!(feed.fetch_price("UP_USDT").await, Some(1.5));
        assert_eq!(metrics.price_fetch_failures_total.get(), 2);
    }

    #[tokio::test]
    async fn successful_price_restores_exchange_health() {
        let mut api = MockExchangeApi::new();
        let mut calls = 0;
        api.expect_ticker_price().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(TrackerError::Parse("truncated body".to_string()))
            } else {
                Ok(Some(2.0))
            }
        });

        let (feed, _, health) = feed(api);
        assert_eq!(feed.fetch_price("ANY_USDT").await, None);
        assert_eq!(
            health.get_status().await.components.get(Component::ExchangeApi),
            Some(false)
        );

        assert_eq!(feed.fetch_price("ANY_USDT").await, Some(2.0));
        assert_eq!(
            health.get_status().await.components.get(Component::ExchangeApi),
            Some(true)
        );
    }
}
