//! HTTP exchange-rate provider
//!
//! Queries a JSON quote endpoint with `base` and `symbols` parameters and
//! expects a body of the form:
//!
//! ```json
//! { "success": true, "date": "2024-03-01", "rates": { "INR": 105.5 } }
//! ```
//!
//! `success` and `date` are optional. The quote may be a JSON number or a
//! numeric string.

use crate::collector::{build_http_client, classify_request_error};
use crate::config::RateConfig;
use crate::records::ExchangeRate;
use crate::retry::{with_retry, RetryPolicy};
use crate::{PipelineError, Result};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    date: Option<NaiveDate>,
    #[serde(default)]
    rates: HashMap<String, serde_json::Value>,
}

/// Fetches one daily rate for the configured currency pair
pub struct RateProvider {
    client: Client,
    api_url: String,
    base_currency: String,
    target_currency: String,
    policy: RetryPolicy,
}

impl RateProvider {
    pub fn new(config: &RateConfig, policy: RetryPolicy) -> Result<Self> {
        let client = build_http_client(
            &format!("pricing-pipeline/{}", env!("CARGO_PKG_VERSION")),
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            base_currency: config.base_currency.clone(),
            target_currency: config.target_currency.clone(),
            policy,
        })
    }

    /// Fetches the current rate, retrying transient failures
    ///
    /// # Errors
    ///
    /// * `PipelineError::RateUnavailable` - The API reported failure (retried)
    /// * `PipelineError::InvalidRate` - The quote is missing, not numeric, or
    ///   not strictly positive
    /// * `PipelineError::HttpStatus` / `Timeout` / `Http` - Transport failures
    pub async fn fetch(&self) -> Result<ExchangeRate> {
        let label = format!("fetch rate {}->{}", self.base_currency, self.target_currency);
        let rate = with_retry(&self.policy, &label, || self.fetch_once()).await?;

        tracing::info!(
            "Exchange rate for {}: 1 {} = {} {}",
            rate.date,
            rate.base_currency,
            rate.rate,
            rate.target_currency
        );

        Ok(rate)
    }

    /// A single request with no retries
    pub async fn fetch_once(&self) -> Result<ExchangeRate> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("base", self.base_currency.as_str()),
                ("symbols", self.target_currency.as_str()),
            ])
            .send()
            .await
            .map_err(|e| classify_request_error(&self.api_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::HttpStatus {
                url: self.api_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_request_error(&self.api_url, e))?;
        let quote: QuoteResponse = serde_json::from_str(&body)?;

        self.rate_from_quote(quote)
    }

    fn rate_from_quote(&self, quote: QuoteResponse) -> Result<ExchangeRate> {
        if quote.success == Some(false) {
            return Err(PipelineError::RateUnavailable(format!(
                "API reported failure for {}->{}",
                self.base_currency, self.target_currency
            )));
        }

        let value = quote.rates.get(&self.target_currency).ok_or_else(|| {
            PipelineError::InvalidRate(format!("no {} quote in response", self.target_currency))
        })?;

        let rate = parse_quote(value).ok_or_else(|| {
            PipelineError::InvalidRate(format!("{} quote {} is not numeric", self.target_currency, value))
        })?;

        let fetched_at = Utc::now();
        let date = quote.date.unwrap_or_else(|| fetched_at.date_naive());

        ExchangeRate::new(
            date,
            self.base_currency.as_str(),
            self.target_currency.as_str(),
            rate,
            fetched_at,
        )
        .ok_or_else(|| {
            PipelineError::InvalidRate(format!(
                "{}->{} quote {} is not positive",
                self.base_currency, self.target_currency, rate
            ))
        })
    }
}

fn parse_quote(value: &serde_json::Value) -> Option<Decimal> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        _ => return None,
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}
