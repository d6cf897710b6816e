use anyhow::{Context, Result};
use std::sync::Arc;

use mexc_listing_tracker::api::{ExchangeFeed, MexcClient, WebhookNotifier};
use mexc_listing_tracker::core::{logging, shutdown, Config, HealthChecker};
use mexc_listing_tracker::monitoring::{ChangeReporter, JsonFileStore, TokenTracker, TrackerMetrics};
use mexc_listing_tracker::scanner::ListingScanner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    logging::init_logging(&config.monitoring.log_level);
    for warning in &config.warnings {
        tracing::warn!("⚠️  {}", warning);
    }

    tracing::info!("🚀 MEXC listing tracker starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let metrics = TrackerMetrics::new().context("failed to build metrics registry")?;
    let health_checker = HealthChecker::new();

    if let Some(port) = config.monitoring.health_port {
        let health_clone = health_checker.clone();
        let metrics_clone = metrics.clone();
        tokio::spawn(async move { start_health_server(health_clone, metrics_clone, port).await });
        tracing::info!("✅ Health endpoint running on port {}", port);
    }

    let client = MexcClient::new(&config.exchange).context("failed to build exchange client")?;
    let notifier =
        WebhookNotifier::new(&config.notifier).context("failed to build webhook client")?;
    if !notifier.is_configured() {
        tracing::warn!("POST_URL is not set, price change reports will fail to send");
    }

    let feed = Arc::new(ExchangeFeed::new(
        Arc::new(client),
        metrics.clone(),
        health_checker.clone(),
    ));
    let tracker = TokenTracker::new(
        feed.clone(),
        metrics.clone(),
        health_checker.clone(),
        &config.tracker,
    );
    let reporter = ChangeReporter::new(
        feed.clone(),
        Arc::new(notifier),
        metrics.clone(),
        health_checker.clone(),
        &config.tracker,
    );
    let store = JsonFileStore::open(&config.tracker.state_file);
    tracing::info!(
        "State file: {} | report policy: {}",
        store.path().display(),
        config.tracker.report_policy
    );

    let mut scanner = ListingScanner::new(
        feed,
        tracker,
        reporter,
        Box::new(store),
        metrics,
        health_checker,
        &config.tracker,
    );

    let (trigger, stop) = shutdown::channel();
    tokio::spawn(shutdown::stop_on_signal(trigger));

    scanner.run(stop).await;

    tracing::info!("👋 MEXC listing tracker stopped");
    Ok(())
}

async fn start_health_server(health_checker: HealthChecker, metrics: TrackerMetrics, port: u16) {
    use warp::Filter;

    let health = warp::path("health")
        .and(warp::any().map(move || health_checker.clone()))
        .and_then(|checker: HealthChecker| async move {
            let status = checker.get_status().await;
            Ok::<_, warp::Rejection>(warp::reply::json(&status))
        });

    let prometheus = warp::path("metrics").map(move || match metrics.render() {
        Ok(body) => warp::reply::with_status(body, warp::http::StatusCode::OK),
        Err(e) => warp::reply::with_status(
            format!("failed to encode metrics: {}", e),
            warp::http::StatusCode::INTERNAL_SERVER_ERROR,
        ),
    });

    warp::serve(health.or(prometheus)).run(([0, 0, 0, 0], port)).await;
}
