//! Retrieval strategies: ways of turning a URL into raw HTML.
//!
//! Every strategy has the same shape, `fetch(url, timeout) -> RetrievalOutcome`,
//! and is selected by [`StrategyKind`] rather than through trait objects.
//! Failures never escape a strategy: network errors, bad statuses, bot
//! challenges and missing backends all come back as
//! [`RetrievalOutcome::Failure`] with a cause string.
//!
//! | Strategy | Module | Default timeout |
//! |----------|--------|-----------------|
//! | [`StrategyKind::Plain`] | [`plain`] | 10s |
//! | [`StrategyKind::Hardened`] | [`hardened`] | 15s |
//! | [`StrategyKind::RemoteRender`] | [`remote`] | 30s |
//! | [`StrategyKind::Browser`] | [`browser`] | 30s |

pub mod browser;
pub mod hardened;
pub mod plain;
pub mod remote;

use crate::error::FetchError;
use crate::models::{RetrievalOutcome, StrategyKind};
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, HeaderMap, HeaderName, HeaderValue, REFERER,
    UPGRADE_INSECURE_REQUESTS,
};
use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// How long the browser waits before reading the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitUntil {
    /// Load event, then until the resource count stops changing.
    NetworkIdle,
    /// Return as soon as the DOM is parsed.
    DomContentLoaded,
}

/// Settings for all retrieval strategies.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Request budget of the plain strategy.
    pub plain_timeout_secs: u64,
    /// Budget of each hardened request (the challenge retry gets its own).
    pub hardened_timeout_secs: u64,
    /// Budget of one remote render call.
    pub remote_timeout_secs: u64,
    /// Navigation budget of the browser strategy, settle time excluded.
    pub browser_timeout_secs: u64,
    /// Budget handed to the challenge solver, which renders the page itself.
    pub solver_timeout_secs: u64,
    /// Pause after a failed strategy before the next one.
    pub strategy_delay_ms: u64,
    /// Desktop Chrome user agent sent by every strategy.
    pub user_agent: String,
    /// Referer of plain and hardened requests.
    pub referer: String,
    /// FlareSolverr-compatible endpoint used by the hardened strategy.
    pub solver_url: Option<String>,
    /// Browserless-compatible base URL used by the remote render strategy.
    pub browserless_url: Option<String>,
    /// Sent as the `token` query parameter.
    pub browserless_token: Option<String>,
    /// WebDriver endpoint (chromedriver) used by the browser strategy.
    pub webdriver_url: Option<String>,
    /// When the browser considers a page loaded.
    pub wait_until: WaitUntil,
    /// Skip images, stylesheets and fonts when rendering.
    pub block_resources: bool,
    /// Extra wait after load so late scripts can fill in the article.
    pub settle_ms: u64,
    /// Settle time for domains the classifier marks as slow to render.
    pub slow_settle_ms: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            plain_timeout_secs: 10,
            hardened_timeout_secs: 15,
            remote_timeout_secs: 30,
            browser_timeout_secs: 30,
            solver_timeout_secs: 60,
            strategy_delay_ms: 500,
            user_agent: CHROME_USER_AGENT.to_string(),
            referer: "https://www.google.com/".to_string(),
            solver_url: None,
            browserless_url: None,
            browserless_token: None,
            webdriver_url: Some("http://localhost:9515".to_string()),
            wait_until: WaitUntil::NetworkIdle,
            block_resources: true,
            settle_ms: 2000,
            slow_settle_ms: 5000,
        }
    }
}

impl RetrievalConfig {
    pub fn timeout_for(&self, kind: StrategyKind) -> Duration {
        let secs = match kind {
            StrategyKind::Plain => self.plain_timeout_secs,
            StrategyKind::Hardened => self.hardened_timeout_secs,
            StrategyKind::RemoteRender => self.remote_timeout_secs,
            StrategyKind::Browser => self.browser_timeout_secs,
        };
        Duration::from_secs(secs)
    }

    pub fn settle_time(&self, slow_render: bool) -> Duration {
        Duration::from_millis(if slow_render {
            self.slow_settle_ms
        } else {
            self.settle_ms
        })
    }
}

/// The strategy family, sharing one stateless HTTP client.
///
/// The hardened strategy builds its own cookie-carrying client per call so
/// no session state leaks between URLs.
#[derive(Debug, Clone)]
pub struct Fetchers {
    config: RetrievalConfig,
    client: reqwest::Client,
}

impl Fetchers {
    /// Build the shared client for the plain and remote strategies.
    ///
    /// # Arguments
    ///
    /// * `config` - Timeouts, headers and service endpoints for every strategy
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialised.
    pub fn new(config: RetrievalConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run one strategy against `url`.
    ///
    /// # Arguments
    ///
    /// * `kind` - Strategy to run
    /// * `url` - Page to retrieve
    /// * `timeout` - Budget for this attempt
    /// * `slow_render` - Use the longer settle time (browser strategy only)
    ///
    /// # Returns
    ///
    /// The page HTML tagged with `kind`, or a [`RetrievalOutcome::Failure`]
    /// carrying the cause. Never fails.
    #[instrument(level = "debug", skip(self), fields(%kind))]
    pub async fn fetch(
        &self,
        kind: StrategyKind,
        url: &str,
        timeout: Duration,
        slow_render: bool,
    ) -> RetrievalOutcome {
        let result = match kind {
            StrategyKind::Plain => plain::fetch(&self.client, &self.config, url, timeout).await,
            StrategyKind::Hardened => hardened::fetch(&self.config, url, timeout).await,
            StrategyKind::RemoteRender => {
                remote::fetch(&self.client, &self.config, url, timeout).await
            }
            StrategyKind::Browser => browser::fetch(&self.config, url, timeout, slow_render).await,
        };

        match result {
            Ok(html) => {
                debug!(bytes = html.len(), "Strategy returned HTML");
                RetrievalOutcome::Success {
                    html,
                    strategy_used: kind,
                }
            }
            Err(e) => RetrievalOutcome::failure(kind, e),
        }
    }
}

/// Header set of a desktop Chrome navigation arriving from a search engine.
pub fn browser_headers(referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
    headers
}

/// Markers of interstitial bot-check pages (Cloudflare, Incapsula and friends).
const CHALLENGE_MARKERS: &[&str] = &[
    "cf_chl_opt",
    "cf-browser-verification",
    "<title>Just a moment...</title>",
    "Attention Required! | Cloudflare",
    "_Incapsula_Resource",
    "Checking your browser before accessing",
];

/// True when the response is a bot challenge rather than the page itself.
pub fn looks_like_challenge(status: u16, body: &str) -> bool {
    let marked = CHALLENGE_MARKERS.iter().any(|m| body.contains(m));
    marked || (matches!(status, 403 | 503) && body.contains("cloudflare"))
}

/// Map a reqwest error, reporting timeouts with the budget that was exceeded.
pub(crate) fn request_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        err.into()
    }
}

/// Shared status/body acceptance for the HTTP strategies.
pub(crate) fn accept_body(status: u16, body: String) -> Result<String, FetchError> {
    if looks_like_challenge(status, &body) {
        return Err(FetchError::Challenge);
    }
    if !(200..300).contains(&status) {
        return Err(FetchError::Status(status));
    }
    if body.trim().is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_detection() {
        assert!(looks_like_challenge(
            503,
            "<html><head><title>Just a moment...</title></head></html>"
        ));
        assert!(looks_like_challenge(403, "blocked by cloudflare"));
        assert!(!looks_like_challenge(200, "<html><p>regular article</p></html>"));
        // Bot-management script tags on normal pages are not a challenge
        assert!(!looks_like_challenge(
            200,
            r#"<script src="/cdn-cgi/challenge-platform/scripts/jsd/main.js"></script>"#
        ));
    }

    #[test]
    fn test_accept_body() {
        assert!(accept_body(200, "<p>hi</p>".into()).is_ok());
        assert!(matches!(accept_body(404, "nope".into()), Err(FetchError::Status(404))));
        assert!(matches!(accept_body(200, "   ".into()), Err(FetchError::Empty)));
        assert!(matches!(
            accept_body(200, "var cf_chl_opt = {};".into()),
            Err(FetchError::Challenge)
        ));
    }

    #[test]
    fn test_headers_spoof_search_referer() {
        let headers = browser_headers("https://www.google.com/");
        assert_eq!(headers.get(REFERER).unwrap(), "https://www.google.com/");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert!(headers.get(ACCEPT).is_some());
    }

    #[test]
    fn test_timeouts_per_strategy() {
        let config = RetrievalConfig::default();
        assert_eq!(config.timeout_for(StrategyKind::Plain), Duration::from_secs(10));
        assert_eq!(config.timeout_for(StrategyKind::Hardened), Duration::from_secs(15));
        assert_eq!(config.settle_time(true), Duration::from_millis(5000));
        assert_eq!(config.settle_time(false), Duration::from_millis(2000));
    }
}
