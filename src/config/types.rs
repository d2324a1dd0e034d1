use crate::storage::LoadMode;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Main configuration structure for the pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    pub rate: RateConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub pricing: PricingConfig,
    pub output: OutputConfig,
}

/// Listing source (collector) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Root URL of the catalogue site
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum number of listing pages to fetch
    #[serde(rename = "page-limit")]
    pub page_limit: u32,

    /// Whether to visit each product's detail page to resolve its category
    #[serde(rename = "fetch-categories", default = "default_true")]
    pub fetch_categories: bool,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Exchange-rate provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateConfig {
    /// Quote endpoint, queried with `base` and `symbols` parameters
    #[serde(rename = "api-url")]
    pub api_url: String,

    #[serde(rename = "base-currency")]
    pub base_currency: String,

    #[serde(rename = "target-currency")]
    pub target_currency: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Retry policy applied to every boundary call
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    #[serde(rename = "initial-backoff-ms")]
    pub initial_backoff_ms: u64,

    #[serde(rename = "max-backoff-ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

/// Price conversion and classification settings
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Lower tier boundary (T1) in target currency; prices below it are cheap
    #[serde(rename = "cheap-below")]
    pub cheap_below: Decimal,

    /// Upper tier boundary (T2) in target currency; prices at or above it are expensive
    #[serde(rename = "expensive-from")]
    pub expensive_from: Decimal,

    /// Whether the source price is part of the product identifier digest
    #[serde(rename = "id-includes-price", default = "default_true")]
    pub id_includes_price: bool,
}

/// Output (loader) configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    #[serde(rename = "load-mode", default)]
    pub load_mode: LoadMode,

    /// Store collected listings verbatim in the raw capture table
    #[serde(rename = "capture-raw", default)]
    pub capture_raw: bool,

    /// How long a write waits on a locked database (seconds)
    #[serde(rename = "write-timeout-secs", default = "default_write_timeout_secs")]
    pub write_timeout_secs: u64,

    /// Abort the run when more records than this are dropped
    #[serde(rename = "max-dropped-records", default)]
    pub max_dropped_records: Option<usize>,

    /// Directory receiving JSON snapshots of each stage's output
    #[serde(rename = "artifacts-dir", default)]
    pub artifacts_dir: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_write_timeout_secs() -> u64 {
    5
}

fn default_user_agent() -> String {
    format!("pricing-pipeline/{}", env!("CARGO_PKG_VERSION"))
}
