use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::metrics::TrackerMetrics;
use super::token_store::{TokenStore, TrackedToken};
use crate::api::{ContractListing, ExchangeFeed, ListingEntry};
use crate::core::{Component, HealthChecker, TrackerConfig};

const EXCHANGE_LINK_BASE: &str = "https://futures.mexc.com/exchange";

pub fn exchange_link(symbol: &str) -> String {
    format!("{}/{}?type=linear_swap", EXCHANGE_LINK_BASE, symbol)
}

/// Decides which catalog entries are new and records their baseline.
pub struct TokenTracker {
    feed: Arc<ExchangeFeed>,
    metrics: TrackerMetrics,
    health: HealthChecker,
    discovery_window: Duration,
}

impl TokenTracker {
    pub fn new(
        feed: Arc<ExchangeFeed>,
        metrics: TrackerMetrics,
        health: HealthChecker,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            feed,
            metrics,
            health,
            discovery_window: config.discovery_window(),
        }
    }

    /// Inclusive: a contract created exactly one window ago is still new.
    pub fn is_recent(&self, listing: &ContractListing, now: DateTime<Utc>) -> bool {
        let cutoff_ms = now.timestamp_millis() - self.discovery_window.num_milliseconds();
        listing.create_time_ms >= cutoff_ms
    }

    /// Starts tracking every recent, untracked listing whose price can be
    /// fetched. The snapshot is persisted after each admission. Returns the
    /// admitted symbols in catalog order.
    pub async fn admit_new(
        &self,
        listings: &[ListingEntry],
        store: &mut dyn TokenStore,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let mut admitted = Vec::new();

        for entry in listings {
            let listing = match entry {
                ListingEntry::Contract(listing) => listing,
                ListingEntry::Malformed(raw) => {
                    tracing::warn!("Unexpected token format: {}", raw);
                    self.metrics.malformed_listings_total.inc();
                    continue;
                }
            };

            if !self.is_recent(listing, now) || store.contains(&listing.symbol) {
                continue;
            }

            let Some(price) = self.feed.fetch_price(&listing.symbol).await else {
                continue;
            };

            let token = TrackedToken {
                baseline_price: price,
                discovery_time: now,
            };

            // the record stays in memory even when the snapshot write fails
            match store.upsert(&listing.symbol, token) {
                Ok(()) => {
                    self.health.update_component(Component::StateStore, true).await;
                }
                Err(e) => {
                    tracing::error!("❌ Error saving tokens to file: {}", e);
                    self.metrics.state_write_failures_total.inc();
                    self.health.update_component(Component::StateStore, false).await;
                }
            }

            tracing::info!(
                "🆕 Tracking new token: {} at price {} ({})",
                listing.symbol,
                price,
                exchange_link(&listing.symbol)
            );
            self.metrics.tokens_admitted_total.inc();
            admitted.push(listing.symbol.clone());
        }

        self.metrics.tracked_tokens.set(store.len() as i64);
        admitted
    }
}
