//! Plain HTTP fetch with a browser-like header set.

use super::{RetrievalConfig, accept_body, browser_headers, request_error};
use crate::error::FetchError;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument};

/// One GET, redirects followed, bounded by `timeout`.
#[instrument(level = "debug", skip(client, config))]
pub async fn fetch(
    client: &Client,
    config: &RetrievalConfig,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .headers(browser_headers(&config.referer))
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| request_error(e, timeout))?;

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let body = response.text().await.map_err(|e| request_error(e, timeout))?;
    debug!(status, %final_url, bytes = body.len(), "Plain fetch response");

    accept_body(status, body)
}
