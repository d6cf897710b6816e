pub mod metrics;
pub mod reporter;
pub mod token_store;
pub mod token_tracker;

pub use metrics::TrackerMetrics;
pub use reporter::{percent_change, ChangeReporter, ReportSummary};
pub use token_store::{JsonFileStore, MemoryTokenStore, TokenStore, TrackedToken};
pub use token_tracker::TokenTracker;
