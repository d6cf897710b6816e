pub mod feed;
pub mod mexc;
pub mod notifier;
pub mod types;

pub use feed::ExchangeFeed;
pub use mexc::{ExchangeApi, MexcClient};
pub use notifier::{Notifier, WebhookNotifier};
pub use types::*;
