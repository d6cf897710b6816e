use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::core::TrackerResult;

#[derive(Clone)]
pub struct TrackerMetrics {
    registry: Registry,
    pub cycles_total: IntCounter,
    pub listing_fetch_failures_total: IntCounter,
    pub price_fetch_failures_total: IntCounter,
    pub malformed_listings_total: IntCounter,
    pub tokens_admitted_total: IntCounter,
    pub tokens_removed_total: IntCounter,
    pub notifications_sent_total: IntCounter,
    pub notifications_failed_total: IntCounter,
    pub state_write_failures_total: IntCounter,
    pub tracked_tokens: IntGauge,
}

impl TrackerMetrics {
    pub fn new() -> TrackerResult<Self> {
        let registry = Registry::new();

        Ok(Self {
            cycles_total: register(
                &registry,
                IntCounter::new("tracker_cycles_total", "Polling cycles run")?,
            )?,
            listing_fetch_failures_total: register(
                &registry,
                IntCounter::new(
                    "tracker_listing_fetch_failures_total",
                    "Catalog fetches that failed",
                )?,
            )?,
            price_fetch_failures_total: register(
                &registry,
                IntCounter::new(
                    "tracker_price_fetch_failures_total",
                    "Ticker fetches that failed or carried no price",
                )?,
            )?,
            malformed_listings_total: register(
                &registry,
                IntCounter::new(
                    "tracker_malformed_listings_total",
                    "Catalog entries skipped as malformed",
                )?,
            )?,
            tokens_admitted_total: register(
                &registry,
                IntCounter::new("tracker_tokens_admitted_total", "Tokens started tracking")?,
            )?,
            tokens_removed_total: register(
                &registry,
                IntCounter::new(
                    "tracker_tokens_removed_total",
                    "Tokens dropped after their report",
                )?,
            )?,
            notifications_sent_total: register(
                &registry,
                IntCounter::new(
                    "tracker_notifications_sent_total",
                    "Webhook posts accepted",
                )?,
            )?,
            notifications_failed_total: register(
                &registry,
                IntCounter::new(
                    "tracker_notifications_failed_total",
                    "Webhook posts that failed",
                )?,
            )?,
            state_write_failures_total: register(
                &registry,
                IntCounter::new(
                    "tracker_state_write_failures_total",
                    "Snapshot writes that failed",
                )?,
            )?,
            tracked_tokens: register(
                &registry,
                IntGauge::new("tracker_tracked_tokens", "Tokens currently tracked")?,
            )?,
            registry,
        })
    }

    pub fn render(&self) -> TrackerResult<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn register<T>(registry: &Registry, collector: T) -> TrackerResult<T>
where
    T: Collector + Clone + 'static,
{
    registry.register(Box::new(collector.clone()))?;
    Ok(collector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_registered_series() {
        let metrics = TrackerMetrics::new().unwrap();
        metrics.tokens_admitted_total.inc();
        metrics.tracked_tokens.set(4);

        let text = metrics.render().unwrap();
        assert!(text.contains("tracker_tokens_admitted_total 1"));
        assert!(text.contains("tracker_tracked_tokens 4"));
    }

    #[test]
    fn instances_do_not_share_registries() {
        let a = TrackerMetrics::new().unwrap();
        let b = TrackerMetrics::new().unwrap();
        a.cycles_total.inc();
        assert_eq!(b.cycles_total.get(), 0);
    }
}
