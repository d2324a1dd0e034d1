use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One item as scraped from a listing page, before any cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    /// Free-text title exactly as found in the page
    pub title: String,

    /// Price in the source currency (two fraction digits)
    pub price: Decimal,

    /// Free-text category label, "Unknown" when it couldn't be resolved
    pub category: String,

    /// Free-text availability, e.g. "In stock (22 available)"
    pub availability: String,

    /// When the listing page was fetched
    pub scraped_at: DateTime<Utc>,
}
