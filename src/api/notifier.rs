use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::types::PriceChangeNotification;
use crate::core::config::NotifierConfig;
use crate::core::{TrackerError, TrackerResult};

/// Best-effort sink for price change reports.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &PriceChangeNotification) -> TrackerResult<()>;
}

/// Posts each report as JSON to a webhook. Nothing is retried.
pub struct WebhookNotifier {
    client: Client,
    url: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: &NotifierConfig) -> TrackerResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            url: config.post_url.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &PriceChangeNotification) -> TrackerResult<()> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| TrackerError::Config("POST_URL is not set".to_string()))?;

        let response = self.client.post(url).json(notification).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackerError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(
            "📤 POST successful for {}: {}",
            notification.token_name,
            status.as_u16()
        );
        Ok(())
    }
}
