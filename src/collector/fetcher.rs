//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the pipeline, including:
//! - Building HTTP clients with a user agent and explicit timeouts
//! - GET requests for listing and detail pages
//! - Error classification into retryable and fatal failures

use crate::{PipelineError, Result};
use reqwest::Client;
use std::time::Duration;

/// Upper bound on the TCP connect phase, independent of the request timeout
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - Value of the User-Agent header
/// * `timeout` - Total time allowed for one request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    user_agent: &str,
    timeout: Duration,
) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page body
///
/// # Errors
///
/// | Condition | Error | Retryable |
/// |-----------|-------|-----------|
/// | Request timed out | `Timeout` | yes |
/// | Connection failed | `Http` | yes |
/// | HTTP 429 or 5xx | `HttpStatus` | yes |
/// | Any other non-2xx | `HttpStatus` | no |
pub async fn fetch_page(client: &Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| classify_request_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response
        .text()
        .await
        .map_err(|e| classify_request_error(url, e))
}

/// Maps a reqwest failure onto the pipeline's error taxonomy
pub(crate) fn classify_request_error(url: &str, error: reqwest::Error) -> PipelineError {
    if error.is_timeout() {
        PipelineError::Timeout {
            url: url.to_string(),
        }
    } else {
        PipelineError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
