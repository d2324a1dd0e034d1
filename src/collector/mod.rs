//! Collector module for scraping catalogue listings
//!
//! This module contains the scraping side of the pipeline, including:
//! - HTTP fetching with explicit timeouts and error classification
//! - HTML parsing of listing and detail pages
//! - A lazy, restartable cursor over paginated listing pages

mod fetcher;
mod parser;
mod source;

pub use fetcher::{build_http_client, fetch_page};
pub use parser::{parse_category, parse_listing_page, parse_price, ListingPage, ListingSummary};
pub use source::{Collector, PageCursor, PageListings, UNKNOWN_CATEGORY};

pub(crate) use fetcher::classify_request_error;
