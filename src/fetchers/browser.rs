//! Headless browser rendering over WebDriver.
//!
//! Each call owns one WebDriver session for its whole lifetime: the session
//! is created, used for a single navigation and closed again whatever the
//! navigation did, including timeouts and errors half-way through a page load.

use super::{RetrievalConfig, WaitUntil};
use crate::error::FetchError;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use std::time::{Duration, Instant};
use tokio::time::{sleep, timeout as with_timeout};
use tracing::{debug, instrument, warn};

const IDLE_POLL: Duration = Duration::from_millis(250);
const IDLE_QUIET: Duration = Duration::from_millis(500);
const IDLE_MAX: Duration = Duration::from_secs(10);
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

const RESOURCE_COUNT_SCRIPT: &str = "return performance.getEntriesByType('resource').length;";

#[instrument(level = "debug", skip(config))]
pub async fn fetch(
    config: &RetrievalConfig,
    url: &str,
    timeout: Duration,
    slow_render: bool,
) -> Result<String, FetchError> {
    let webdriver_url = config
        .webdriver_url
        .as_deref()
        .ok_or(FetchError::NotConfigured("webdriver endpoint"))?;

    let mut builder = ClientBuilder::native();
    builder.capabilities(capabilities(config));
    let client = with_timeout(timeout, builder.connect(webdriver_url))
        .await
        .map_err(|_| FetchError::Timeout(timeout))?
        .map_err(|e| FetchError::Browser(format!("could not start session: {e}")))?;

    let settle = config.settle_time(slow_render);
    let rendered = with_timeout(
        timeout + settle,
        render(&client, url, config.wait_until, settle),
    )
    .await;

    // The session is closed on every path before the result is inspected
    match with_timeout(CLOSE_TIMEOUT, client.close()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Failed to close browser session"),
        Err(_) => warn!(timeout = ?CLOSE_TIMEOUT, "Timed out closing browser session"),
    }

    match rendered {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(timeout + settle)),
    }
}

async fn render(
    client: &Client,
    url: &str,
    wait_until: WaitUntil,
    settle: Duration,
) -> Result<String, FetchError> {
    client.goto(url).await.map_err(browser_error)?;

    if wait_until == WaitUntil::NetworkIdle {
        wait_for_network_idle(client).await?;
    }
    sleep(settle).await;

    let html = client.source().await.map_err(browser_error)?;
    if html.trim().is_empty() {
        return Err(FetchError::Empty);
    }
    debug!(bytes = html.len(), "Rendered page source");
    Ok(html)
}

/// Poll the resource timing buffer until it stops growing for [`IDLE_QUIET`].
/// Gives up quietly after [`IDLE_MAX`]; the page is read either way.
async fn wait_for_network_idle(client: &Client) -> Result<(), FetchError> {
    let started = Instant::now();
    let mut last_count = None;
    let mut quiet_since = Instant::now();

    while started.elapsed() < IDLE_MAX {
        let count = client
            .execute(RESOURCE_COUNT_SCRIPT, vec![])
            .await
            .map_err(browser_error)?
            .as_u64();

        if count != last_count {
            last_count = count;
            quiet_since = Instant::now();
        } else if quiet_since.elapsed() >= IDLE_QUIET {
            return Ok(());
        }
        sleep(IDLE_POLL).await;
    }

    debug!(?last_count, "Network never went idle; reading page anyway");
    Ok(())
}

fn browser_error(err: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(err.to_string())
}

/// Chrome capabilities for an isolated headless session.
fn capabilities(config: &RetrievalConfig) -> Map<String, Value> {
    let mut args = vec![
        "--headless=new".to_string(),
        "--disable-gpu".to_string(),
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--window-size=1920,1080".to_string(),
        format!("--user-agent={}", config.user_agent),
    ];

    let mut chrome = json!({});
    if config.block_resources {
        args.push("--blink-settings=imagesEnabled=false".to_string());
        chrome["prefs"] = json!({
            "profile.managed_default_content_settings.images": 2,
            "profile.managed_default_content_settings.stylesheets": 2,
            "profile.managed_default_content_settings.fonts": 2,
        });
    }
    chrome["args"] = json!(args);

    let page_load_strategy = match config.wait_until {
        WaitUntil::NetworkIdle => "normal",
        WaitUntil::DomContentLoaded => "eager",
    };

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("pageLoadStrategy".to_string(), json!(page_load_strategy));
    caps.insert("goog:chromeOptions".to_string(), chrome);
    caps
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SESSION: &str = "s-1";

    fn webdriver_error(message: &str) -> ResponseTemplate {
        ResponseTemplate::new(500).set_body_json(json!({
            "value": { "error": "unknown error", "message": message, "stacktrace": "" }
        }))
    }

    /// Fake WebDriver that hands out one session and must see it deleted once.
    async fn fake_webdriver() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": { "sessionId": SESSION, "capabilities": { "browserName": "chrome" } }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/session/{SESSION}/url")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": "about:blank" })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(format!("/session/{SESSION}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    fn config_for(server: &MockServer) -> RetrievalConfig {
        RetrievalConfig {
            webdriver_url: Some(server.uri()),
            wait_until: WaitUntil::DomContentLoaded,
            settle_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_capabilities_block_resources() {
        let caps = capabilities(&RetrievalConfig::default());
        assert_eq!(caps["pageLoadStrategy"], "normal");
        let chrome = &caps["goog:chromeOptions"];
        assert_eq!(
            chrome["prefs"]["profile.managed_default_content_settings.images"],
            2
        );
        let args = chrome["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));
        assert!(args.iter().any(|a| a == "--blink-settings=imagesEnabled=false"));
    }

    #[test]
    fn test_capabilities_fast_mode() {
        let config = RetrievalConfig {
            wait_until: WaitUntil::DomContentLoaded,
            block_resources: false,
            ..Default::default()
        };
        let caps = capabilities(&config);
        assert_eq!(caps["pageLoadStrategy"], "eager");
        assert!(caps["goog:chromeOptions"].get("prefs").is_none());
    }

    #[tokio::test]
    async fn test_missing_webdriver_is_failure() {
        let config = RetrievalConfig {
            webdriver_url: None,
            ..Default::default()
        };
        let err = fetch(&config, "https://example.com", Duration::from_secs(1), false)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_unreachable_webdriver_is_failure() {
        let config = RetrievalConfig {
            // Nothing listens on port 9 (discard) in the test environment
            webdriver_url: Some("http://127.0.0.1:9".to_string()),
            ..Default::default()
        };
        let err = fetch(&config, "https://example.com", Duration::from_secs(5), false)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Browser(_) | FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_session_closed_when_navigation_fails() {
        let server = fake_webdriver().await;
        Mock::given(method("POST"))
            .and(path(format!("/session/{SESSION}/url")))
            .respond_with(webdriver_error("net::ERR_NAME_NOT_RESOLVED"))
            .mount(&server)
            .await;

        let err = fetch(&config_for(&server), "https://example.com/a", Duration::from_secs(5), false)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Browser(_)));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_session_closed_when_source_fails() {
        let server = fake_webdriver().await;
        Mock::given(method("POST"))
            .and(path(format!("/session/{SESSION}/url")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/session/{SESSION}/source")))
            .respond_with(webdriver_error("renderer crashed"))
            .mount(&server)
            .await;

        let err = fetch(&config_for(&server), "https://example.com/a", Duration::from_secs(5), false)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Browser(_)));
        server.verify().await;
    }

    #[tokio::test]
    async fn test_session_closed_after_success() {
        let server = fake_webdriver().await;
        Mock::given(method("POST"))
            .and(path(format!("/session/{SESSION}/url")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": null })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/session/{SESSION}/source")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "value": "<html><body><p>rendered</p></body></html>"
            })))
            .mount(&server)
            .await;

        let html = fetch(&config_for(&server), "https://example.com/a", Duration::from_secs(5), false)
            .await
            .unwrap();
        assert!(html.contains("rendered"));
        server.verify().await;
    }
}
