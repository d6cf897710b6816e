pub mod new_listings;

pub use new_listings::{CycleSummary, ListingScanner};
