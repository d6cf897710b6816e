pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod shutdown;

pub use config::{Config, ReportPolicy, TrackerConfig};
pub use error::{TrackerError, TrackerResult};
pub use health::{Component, HealthChecker};
pub use shutdown::{Shutdown, ShutdownTrigger};
