//! Pricing Pipeline: a small scrape → rate → transform → load ETL job
//!
//! This crate collects book listings from a paginated catalogue site, fetches
//! a daily exchange rate, converts and classifies every listing, and loads the
//! resulting products into SQLite.

pub mod collector;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod rates;
pub mod records;
pub mod retry;
pub mod storage;
pub mod transform;

use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTML parse error for {url}: {message}")]
    HtmlParse { url: String, message: String },

    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(String),

    #[error("Invalid exchange rate: {0}")]
    InvalidRate(String),

    #[error("Transform error: {0}")]
    Transform(#[from] transform::TransformError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No listings were collected")]
    NoListings,

    #[error("No products survived transformation ({dropped} dropped)")]
    NoProducts { dropped: usize },

    #[error("Too many records dropped: {dropped} exceeds limit of {limit}")]
    TooManyDropped { dropped: usize, limit: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether the failed call may succeed if repeated
    ///
    /// Transient network failures, upstream 5xx/429 responses and a busy or
    /// unreachable store are retryable. Everything else aborts the run.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { source, .. } | Self::Reqwest(source) => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::Timeout { .. } | Self::RateUnavailable(_) => true,
            Self::Storage(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use records::{AvailabilityStatus, ExchangeRate, PriceTier, Product, RawListing};
pub use storage::LoadMode;
