//! Rendering through a remote Browserless-compatible `/content` endpoint.
//!
//! A lighter JavaScript-capable option than driving a local browser: the
//! service loads the page and returns the rendered HTML.

use super::{RetrievalConfig, WaitUntil, request_error};
use crate::error::FetchError;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::instrument;

#[instrument(level = "debug", skip(client, config))]
pub async fn fetch(
    client: &Client,
    config: &RetrievalConfig,
    url: &str,
    timeout: Duration,
) -> Result<String, FetchError> {
    let base_url = config
        .browserless_url
        .as_deref()
        .ok_or(FetchError::NotConfigured("browserless endpoint"))?;

    let mut endpoint = format!("{}/content", base_url.trim_end_matches('/'));
    if let Some(ref token) = config.browserless_token {
        endpoint.push_str(&format!("?token={}", urlencoding::encode(token)));
    }

    let wait_until = match config.wait_until {
        WaitUntil::NetworkIdle => "networkidle2",
        WaitUntil::DomContentLoaded => "domcontentloaded",
    };
    let mut body = json!({
        "url": url,
        "gotoOptions": { "waitUntil": wait_until, "timeout": timeout.as_millis() as u64 },
    });
    if config.block_resources {
        body["rejectResourceTypes"] = json!(["image", "stylesheet", "font", "media"]);
    }

    let response = client
        .post(&endpoint)
        .json(&body)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| request_error(e, timeout))?;

    let status = response.status().as_u16();
    if !response.status().is_success() {
        return Err(FetchError::Status(status));
    }

    let html = response.text().await.map_err(|e| request_error(e, timeout))?;
    if html.trim().is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(html)
}
