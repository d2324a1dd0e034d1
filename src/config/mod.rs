//! Configuration module for the pricing pipeline
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! The resulting [`Config`] is passed explicitly into every stage; nothing reads
//! settings from process-wide state.
//!
//! # Example
//!
//! ```no_run
//! use pricing_pipeline::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("pipeline.toml")).unwrap();
//! println!("Scraping up to {} pages", config.source.page_limit);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, PricingConfig, RateConfig, RetryConfig, SourceConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};

pub use validation::validate;
