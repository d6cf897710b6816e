use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::api::ExchangeFeed;
use crate::core::{HealthChecker, Shutdown, TrackerConfig};
use crate::monitoring::{ChangeReporter, ReportSummary, TokenStore, TokenTracker, TrackerMetrics};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleSummary {
    pub listings_seen: usize,
    pub admitted: Vec<String>,
    pub report: ReportSummary,
    pub tracked: usize,
}

/// One recurring task: fetch the catalog, admit new listings, report mature ones.
pub struct ListingScanner {
    feed: Arc<ExchangeFeed>,
    tracker: TokenTracker,
    reporter: ChangeReporter,
    store: Box<dyn TokenStore>,
    metrics: TrackerMetrics,
    health: HealthChecker,
    poll_interval: std::time::Duration,
}

impl ListingScanner {
    pub fn new(
        feed: Arc<ExchangeFeed>,
        tracker: TokenTracker,
        reporter: ChangeReporter,
        store: Box<dyn TokenStore>,
        metrics: TrackerMetrics,
        health: HealthChecker,
        config: &TrackerConfig,
    ) -> Self {
        Self {
            feed,
            tracker,
            reporter,
            store,
            metrics,
            health,
            poll_interval: config.poll_interval(),
        }
    }

    pub fn store(&self) -> &dyn TokenStore {
        self.store.as_ref()
    }

    /// Runs exactly one cycle against the given clock reading.
    pub async fn tick(&mut self, now: DateTime<Utc>) -> CycleSummary {
        tracing::info!("🔄 Starting new iteration");
        self.metrics.cycles_total.inc();

        let listings = self.feed.fetch_listings().await;
        let admitted = if listings.is_empty() {
            tracing::info!("No new tokens found");
            Vec::new()
        } else {
            self.tracker
                .admit_new(&listings, self.store.as_mut(), now)
                .await
        };

        let report = self.reporter.evaluate(self.store.as_mut(), now).await;

        let tracked = self.store.len();
        self.health.record_cycle(now, tracked).await;

        tracing::debug!(
            "Cycle done: {} listings, {} admitted, {} reported, {} tracked",
            listings.len(),
            admitted.len(),
            report.notified,
            tracked
        );

        CycleSummary {
            listings_seen: listings.len(),
            admitted,
            report,
            tracked,
        }
    }

    /// Ticks until `shutdown` fires or loses its last trigger. A cycle in
    /// progress always completes.
    pub async fn run(&mut self, shutdown: Shutdown) {
        tracing::info!(
            "🆕 Listing scanner starting (every {}s, {} tracked)",
            self.poll_interval.as_secs(),
            self.store.len()
        );

        while !shutdown.is_triggered() {
            self.tick(Utc::now()).await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = shutdown.clone().wait() => break,
            }
        }

        tracing::info!("🛑 Listing scanner stopped");
    }
}
