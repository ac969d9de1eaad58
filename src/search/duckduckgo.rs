//! DuckDuckGo News search backend.
//!
//! Two requests per query: the HTML search page yields a `vqd` token, which
//! the JSON endpoint `news.js` requires alongside the query.

use super::NewsSearch;
use crate::error::SearchError;
use crate::models::ArticleReference;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use reqwest::header::REFERER;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

const BACKEND: &str = "duckduckgo";

static VQD: Lazy<Regex> = Lazy::new(|| Regex::new(r#"vqd=["']?([0-9-]+)"#).unwrap());

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    results: Vec<NewsResult>,
}

#[derive(Debug, Deserialize)]
struct NewsResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    /// Unix seconds.
    date: Option<i64>,
    #[serde(default)]
    source: String,
}

#[derive(Debug, Clone)]
pub struct DuckDuckGoClient {
    client: Client,
    base_url: String,
    region: String,
}

impl DuckDuckGoClient {
    pub fn new(client: Client, base_url: &str, region: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            region: region.to_string(),
        }
    }

    async fn token(&self, query: &str, timeout: Duration) -> Result<String, SearchError> {
        let url = format!(
            "{}/?q={}&iar=news&ia=news",
            self.base_url,
            urlencoding::encode(query)
        );
        let response = self.client.get(&url).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                backend: BACKEND,
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await?;
        VQD.captures(&body)
            .map(|c| c[1].to_string())
            .ok_or(SearchError::Token(BACKEND))
    }
}

/// DuckDuckGo only knows day, week and month windows.
fn date_filter(recency_days: Option<u32>) -> Option<&'static str> {
    match recency_days? {
        0..=1 => Some("d"),
        2..=7 => Some("w"),
        8..=31 => Some("m"),
        _ => None,
    }
}

impl NewsSearch for DuckDuckGoClient {
    fn name(&self) -> &'static str {
        BACKEND
    }

    #[instrument(level = "info", skip(self))]
    async fn search(
        &self,
        query: &str,
        limit: usize,
        recency_days: Option<u32>,
        timeout: Duration,
    ) -> Result<Vec<ArticleReference>, SearchError> {
        let vqd = self.token(query, timeout).await?;
        debug!(%vqd, "Obtained search token");

        let mut url = format!(
            "{}/news.js?l={}&o=json&noamp=1&q={}&vqd={}&p=-1",
            self.base_url,
            urlencoding::encode(&self.region),
            urlencoding::encode(query),
            vqd
        );
        if let Some(df) = date_filter(recency_days) {
            url.push_str(&format!("&df={df}"));
        }

        let response = self
            .client
            .get(&url)
            .header(REFERER, format!("{}/", self.base_url))
            .timeout(timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                backend: BACKEND,
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await?;
        let parsed: NewsResponse = serde_json::from_str(&body).map_err(|e| SearchError::Parse {
            backend: BACKEND,
            message: e.to_string(),
        })?;

        let items: Vec<ArticleReference> = parsed
            .results
            .into_iter()
            .filter(|r| !r.url.trim().is_empty())
            .take(limit)
            .map(|r| {
                let published = r
                    .date
                    .and_then(|secs| DateTime::from_timestamp(secs, 0))
                    .map(|dt| dt.to_rfc3339())
                    .unwrap_or_default();
                ArticleReference::new(&r.title, &r.url, &published, &r.source)
            })
            .collect();

        info!(count = items.len(), "DuckDuckGo results");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mock_token(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<script>nrj('/d.js?q=x&vqd="4-1234567890"&p=1')</script>"#),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_date_filter_windows() {
        assert_eq!(date_filter(None), None);
        assert_eq!(date_filter(Some(1)), Some("d"));
        assert_eq!(date_filter(Some(7)), Some("w"));
        assert_eq!(date_filter(Some(30)), Some("m"));
        assert_eq!(date_filter(Some(365)), None);
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start().await;
        mock_token(&server).await;
        Mock::given(method("GET"))
            .and(path("/news.js"))
            .and(query_param("vqd", "4-1234567890"))
            .and(query_param("l", "au-en"))
            .and(query_param("df", "d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    { "date": 1749897000, "title": "NSW trials AI scribes", "url": "https://www.smh.com.au/a", "source": "SMH" },
                    { "date": 1749890000, "title": "No url", "url": "", "source": "X" },
                    { "title": "Undated", "url": "https://b.com/b", "source": "B" },
                    { "date": 1749880000, "title": "Over limit", "url": "https://c.com/c", "source": "C" }
                ]
            })))
            .mount(&server)
            .await;

        let client = DuckDuckGoClient::new(Client::new(), &server.uri(), "au-en");
        let items = client
            .search("ai health", 2, Some(1), Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].link, "https://www.smh.com.au/a");
        assert_eq!(items[0].published, "2025-06-14T10:30:00+00:00");
        assert_eq!(items[0].source, "SMH");
        assert_eq!(items[1].title, "Undated");
        assert_eq!(items[1].published, "");
    }

    #[tokio::test]
    async fn test_missing_token_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>no token</html>"))
            .mount(&server)
            .await;

        let client = DuckDuckGoClient::new(Client::new(), &server.uri(), "au-en");
        let err = client
            .search("q", 5, None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Token(_)));
    }
}
