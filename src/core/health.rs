use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
    pub tracked_tokens: usize,
    pub components: ComponentHealth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    ExchangeApi,
    NotificationSink,
    StateStore,
}

/// Last observed outcome per dependency. `None` means not exercised yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub exchange_api: Option<bool>,
    pub notification_sink: Option<bool>,
    pub state_store: Option<bool>,
}

impl ComponentHealth {
    pub fn get(&self, component: Component) -> Option<bool> {
        match component {
            Component::ExchangeApi => self.exchange_api,
            Component::NotificationSink => self.notification_sink,
            Component::StateStore => self.state_store,
        }
    }
}

#[derive(Debug, Default)]
struct HealthState {
    components: ComponentHealth,
    last_cycle_at: Option<DateTime<Utc>>,
    tracked_tokens: usize,
}

#[derive(Clone)]
pub struct HealthChecker {
    start_time: std::time::Instant,
    state: Arc<RwLock<HealthState>>,
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
            state: Arc::new(RwLock::new(HealthState::default())),
        }
    }

    pub async fn get_status(&self) -> HealthStatus {
        let state = self.state.read().await;
        let components = state.components.clone();

        // a failing webhook does not stop tracking, only the exchange and the store do
        let degraded = components.exchange_api == Some(false)
            || components.state_store == Some(false);

        HealthStatus {
            status: if degraded {
                "degraded".to_string()
            } else {
                "healthy".to_string()
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            last_cycle_at: state.last_cycle_at,
            tracked_tokens: state.tracked_tokens,
            components,
        }
    }

    pub async fn update_component(&self, component: Component, healthy: bool) {
        let mut state = self.state.write().await;
        let slot = match component {
            Component::ExchangeApi => &mut state.components.exchange_api,
            Component::NotificationSink => &mut state.components.notification_sink,
            Component::StateStore => &mut state.components.state_store,
        };
        *slot = Some(healthy);
    }

    pub async fn record_cycle(&self, at: DateTime<Utc>, tracked_tokens: usize) {
        let mut state = self.state.write().await;
        state.last_cycle_at = Some(at);
        state.tracked_tokens = tracked_tokens;
    }
}
