//! Record types flowing between pipeline stages
//!
//! - [`RawListing`]: one scraped item, produced by the collector
//! - [`ExchangeRate`]: one daily quote, produced by the rate provider
//! - [`Product`]: one finalized catalog entry, produced by the transformer

mod listing;
mod product;
mod rate;

pub use listing::RawListing;
pub use product::{AvailabilityStatus, PriceTier, Product};
pub use rate::{ExchangeRate, RATE_SCALE};
