use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::metrics::TrackerMetrics;
use super::token_store::{TokenStore, TrackedToken};
use crate::api::{ExchangeFeed, Notifier, PriceChangeNotification};
use crate::core::{Component, HealthChecker, ReportPolicy, TrackerConfig};

/// Percentage move from `baseline` to `current`. A zero baseline is not
/// guarded and yields an infinite or NaN result.
pub fn percent_change(baseline: f64, current: f64) -> f64 {
    (current - baseline) / baseline * 100.0
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    /// Mature tokens looked at this cycle.
    pub evaluated: usize,
    pub notified: usize,
    pub failed: usize,
    pub removed: Vec<String>,
}

/// Reports price drift for tokens past the maturity window.
pub struct ChangeReporter {
    feed: Arc<ExchangeFeed>,
    notifier: Arc<dyn Notifier>,
    metrics: TrackerMetrics,
    health: HealthChecker,
    maturity_window: Duration,
    policy: ReportPolicy,
}

impl ChangeReporter {
    pub fn new(
        feed: Arc<ExchangeFeed>,
        notifier: Arc<dyn Notifier>,
        metrics: TrackerMetrics,
        health: HealthChecker,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            feed,
            notifier,
            metrics,
            health,
            maturity_window: config.maturity_window(),
            policy: config.report_policy,
        }
    }

    pub fn is_mature(&self, token: &TrackedToken, now: DateTime<Utc>) -> bool {
        now >= token.discovery_time + self.maturity_window
    }

    pub async fn evaluate(&self, store: &mut dyn TokenStore, now: DateTime<Utc>) -> ReportSummary {
        let mature: Vec<(String, TrackedToken)> = store
            .all()
            .filter(|(_, token)| self.is_mature(token, now))
            .map(|(symbol, token)| (symbol.to_string(), token.clone()))
            .collect();

        let mut summary = ReportSummary::default();

        for (symbol, token) in mature {
            summary.evaluated += 1;

            let Some(current_price) = self.feed.fetch_price(&symbol).await else {
                continue;
            };

            let change = percent_change(token.baseline_price, current_price);
            tracing::info!(
                "📈 Token: {}, Initial Price: {}, Current Price: {}, Change: {:.2}%",
                symbol,
                token.baseline_price,
                current_price,
                change
            );

            let notification = PriceChangeNotification {
                token_name: symbol.clone(),
                initial_price: token.baseline_price,
                current_price,
                price_change: change,
            };

            match self.notifier.notify(&notification).await {
                Ok(()) => {
                    summary.notified += 1;
                    self.metrics.notifications_sent_total.inc();
                    self.health
                        .update_component(Component::NotificationSink, true)
                        .await;
                }
                Err(e) => {
                    tracing::error!("❌ Error sending POST request for {}: {}", symbol, e);
                    summary.failed += 1;
                    self.metrics.notifications_failed_total.inc();
                    self.health
                        .update_component(Component::NotificationSink, false)
                        .await;
                }
            }

            // delivery is best effort, so the token is dropped whether or not the post landed
            if self.policy == ReportPolicy::Once {
                summary.removed.push(symbol);
            }
        }

        for symbol in &summary.removed {
            match store.remove(symbol) {
                Ok(_) => {
                    tracing::info!("🗑️  Stopped tracking {}", symbol);
                    self.metrics.tokens_removed_total.inc();
                    self.health.update_component(Component::StateStore, true).await;
                }
                Err(e) => {
                    tracing::error!("❌ Error saving tokens to file: {}", e);
                    self.metrics.state_write_failures_total.inc();
                    self.health.update_component(Component::StateStore, false).await;
                }
            }
        }

        self.metrics.tracked_tokens.set(store.len() as i64);
        summary
    }
}
