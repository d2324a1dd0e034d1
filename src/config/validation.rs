use crate::config::types::{Config, OutputConfig, PricingConfig, RateConfig, RetryConfig, SourceConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_rate_config(&config.rate)?;
    validate_retry_config(&config.retry)?;
    validate_pricing_config(&config.pricing)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("base-url", &config.base_url)?;

    if config.page_limit < 1 || config.page_limit > 1000 {
        return Err(ConfigError::Validation(format!(
            "page-limit must be between 1 and 1000, got {}",
            config.page_limit
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "source request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_rate_config(config: &RateConfig) -> Result<(), ConfigError> {
    validate_http_url("api-url", &config.api_url)?;
    validate_currency_code(&config.base_currency)?;
    validate_currency_code(&config.target_currency)?;

    if config.base_currency == config.target_currency {
        return Err(ConfigError::Validation(format!(
            "base-currency and target-currency must differ, both are '{}'",
            config.base_currency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "rate request-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    if config.initial_backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "initial-backoff-ms ({}) cannot exceed max-backoff-ms ({})",
            config.initial_backoff_ms, config.max_backoff_ms
        )));
    }

    Ok(())
}

fn validate_pricing_config(config: &PricingConfig) -> Result<(), ConfigError> {
    if config.cheap_below.is_sign_negative() || config.cheap_below.is_zero() {
        return Err(ConfigError::Validation(format!(
            "cheap-below must be positive, got {}",
            config.cheap_below
        )));
    }

    if config.expensive_from <= config.cheap_below {
        return Err(ConfigError::Validation(format!(
            "expensive-from ({}) must be greater than cheap-below ({})",
            config.expensive_from, config.cheap_below
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.write_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "write-timeout-secs must be >= 1".to_string(),
        ));
    }

    if matches!(&config.artifacts_dir, Some(dir) if dir.is_empty()) {
        return Err(ConfigError::Validation(
            "artifacts-dir cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates that a URL parses and uses HTTP(S)
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

/// ISO 4217 style code: three uppercase ASCII letters
fn validate_currency_code(code: &str) -> Result<(), ConfigError> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ConfigError::Validation(format!(
            "Invalid currency code '{}': expected three uppercase letters",
            code
        )));
    }
    Ok(())
}
