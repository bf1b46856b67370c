// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

/// Create a configured asynchronous HTTP client.
///
/// Every request made through it carries the configured timeout.
pub fn create_client(config: &FetcherConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a document body as text.
///
/// Transport failures, timeouts and non-success statuses all surface as
/// [`AppError::Fetch`]. No retries.
pub async fn fetch_text(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::fetch(url, describe(&e)))?;

    let response = response
        .error_for_status()
        .map_err(|e| AppError::fetch(url, describe(&e)))?;

    response
        .text()
        .await
        .map_err(|e| AppError::fetch(url, describe(&e)))
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out ({error})")
    } else if let Some(status) = error.status() {
        format!("HTTP status {status}")
    } else {
        error.to_string()
    }
}
