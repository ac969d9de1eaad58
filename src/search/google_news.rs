//! Google News RSS search backend.
//!
//! Queries `/rss/search` and reads the RSS 2.0 channel. Google appends the
//! publisher to each headline (`"Headline - Publisher"`); the suffix is
//! removed so title similarity compares headlines only.
//!
//! Item links point at `news.google.com/rss/articles/{id}`, which only
//! forwards to the publisher in script. Ids in the self-contained encoding
//! (base64 of a small record holding the target URL) are decoded in place;
//! other ids keep the wrapper link and are left to the render-first
//! strategies.

use super::NewsSearch;
use crate::error::SearchError;
use crate::models::ArticleReference;
use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const BACKEND: &str = "google_news";

/// Article ids are URL-safe base64, with or without padding.
const ARTICLE_ID: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    /// Publisher homepage.
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "$text")]
    name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleNewsClient {
    client: Client,
    base_url: String,
    hl: String,
    gl: String,
    ceid: String,
}

impl GoogleNewsClient {
    pub fn new(client: Client, base_url: &str, hl: &str, gl: &str, ceid: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hl: hl.to_string(),
            gl: gl.to_string(),
            ceid: ceid.to_string(),
        }
    }

    fn search_url(&self, query: &str, recency_days: Option<u32>) -> String {
        let q = match recency_days {
            Some(days) => format!("{query} when:{days}d"),
            None => query.to_string(),
        };
        format!(
            "{}/rss/search?q={}&hl={}&gl={}&ceid={}",
            self.base_url,
            urlencoding::encode(&q),
            urlencoding::encode(&self.hl),
            urlencoding::encode(&self.gl),
            urlencoding::encode(&self.ceid),
        )
    }
}

impl NewsSearch for GoogleNewsClient {
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
        let url = self.search_url(query, recency_days);
        let response = self.client.get(&url).timeout(timeout).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status {
                backend: BACKEND,
                status: response.status().as_u16(),
            });
        }
        let body = response.text().await?;

        let mut items = parse_feed(&body)?;
        items.truncate(limit);
        info!(count = items.len(), "Google News results");
        Ok(items)
    }
}

fn parse_feed(xml: &str) -> Result<Vec<ArticleReference>, SearchError> {
    let rss: Rss = quick_xml::de::from_str(xml).map_err(|e| SearchError::Parse {
        backend: BACKEND,
        message: e.to_string(),
    })?;

    Ok(rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let link = item.link.filter(|l| !l.trim().is_empty())?;
            let link = decode_article_link(&link).unwrap_or(link);
            let (source, source_url) = item
                .source
                .map(|s| (s.name.unwrap_or_default(), s.url.unwrap_or_default()))
                .unwrap_or_default();
            let title = strip_publisher_suffix(item.title.as_deref().unwrap_or_default(), &source);
            Some(
                ArticleReference::new(
                    title,
                    &link,
                    item.pub_date.as_deref().unwrap_or_default(),
                    &source,
                )
                .with_source_url(&source_url),
            )
        })
        .collect())
}

/// Publisher URL carried inside a `news.google.com/rss/articles/{id}` link.
///
/// # Returns
///
/// `None` for links that are not Google News article wrappers, or whose id
/// does not embed an http(s) URL.
fn decode_article_link(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    if url.host_str()? != "news.google.com" {
        return None;
    }
    let mut segments = url.path_segments()?;
    segments.find(|s| *s == "articles")?;
    let id = segments.next()?;

    let bytes = ARTICLE_ID.decode(id).ok()?;
    let start = bytes.windows(4).position(|w| w == b"http")?;
    let tail = &bytes[start..];
    // The URL runs until the first byte that cannot appear in one
    let end = tail
        .iter()
        .position(|b| !(0x21..=0x7e).contains(b))
        .unwrap_or(tail.len());
    let candidate = std::str::from_utf8(&tail[..end]).ok()?;

    let target = Url::parse(candidate).ok()?;
    if !matches!(target.scheme(), "http" | "https") || target.host_str().is_none() {
        return None;
    }
    debug!(%candidate, "Decoded Google News article link");
    Some(candidate.to_string())
}

fn strip_publisher_suffix<'a>(title: &'a str, source: &str) -> &'a str {
    if source.is_empty() {
        return title;
    }
    title
        .trim()
        .strip_suffix(source)
        .and_then(|t| t.trim_end().strip_suffix('-'))
        .map(str::trim_end)
        .unwrap_or(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <generator>NFE/5.0</generator>
    <title>"digital health" - Google News</title>
    <link>https://news.google.com/search?q=digital+health</link>
    <language>en-AU</language>
    <item>
      <title>Telehealth &amp; AI reshape GP visits - ABC News</title>
      <link>https://news.google.com/rss/articles/CBMiAAA?oc=5</link>
      <guid isPermaLink="false">CBMiAAA</guid>
      <pubDate>Sat, 14 Jun 2025 10:30:00 GMT</pubDate>
      <description>&lt;a href="x"&gt;x&lt;/a&gt;</description>
      <source url="https://www.abc.net.au">ABC News</source>
    </item>
    <item>
      <title>Hospital data platform goes live</title>
      <link>https://news.google.com/rss/articles/CBMiBBB?oc=5</link>
      <pubDate>Fri, 13 Jun 2025 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>No link here</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_feed() {
        let items = parse_feed(FEED).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Telehealth & AI reshape GP visits");
        assert_eq!(items[0].source, "ABC News");
        assert_eq!(items[0].source_url, "https://www.abc.net.au");
        // Opaque test id, wrapper link kept
        assert_eq!(items[0].link, "https://news.google.com/rss/articles/CBMiAAA?oc=5");
        assert_eq!(items[0].published, "Sat, 14 Jun 2025 10:30:00 GMT");
        assert_eq!(items[1].source, "");
        assert_eq!(items[1].title, "Hospital data platform goes live");
    }

    /// Google News link wrapping `target` in the self-contained id encoding.
    fn wrapped(target: &str) -> String {
        let mut record = vec![0x08, 0x13, 0x22, target.len() as u8];
        record.extend_from_slice(target.as_bytes());
        record.extend_from_slice(&[0xd2, 0x01, 0x00]);
        format!(
            "https://news.google.com/rss/articles/{}?oc=5",
            URL_SAFE_NO_PAD.encode(&record)
        )
    }

    #[test]
    fn test_decode_article_link() {
        let target = "https://www.abc.net.au/news/2025-06-14/ai-scribes/105";
        assert_eq!(decode_article_link(&wrapped(target)).as_deref(), Some(target));
        // Opaque ids and ordinary links are left alone
        assert_eq!(
            decode_article_link("https://news.google.com/rss/articles/AU_yqLOpaqueToken?oc=5"),
            None
        );
        assert_eq!(decode_article_link("https://www.abc.net.au/news/x"), None);
        assert_eq!(decode_article_link("not a url"), None);
    }

    #[test]
    fn test_feed_item_keeps_publisher_site_and_decoded_link() {
        let target = "https://www.abc.net.au/news/2025-06-14/telehealth/106";
        let feed = format!(
            r#"<rss version="2.0"><channel>
                <item>
                  <title>Telehealth expands - ABC News</title>
                  <link>{}</link>
                  <source url="https://www.abc.net.au">ABC News</source>
                </item>
            </channel></rss>"#,
            wrapped(target)
        );
        let items = parse_feed(&feed).unwrap();
        assert_eq!(items[0].link, target);
        assert_eq!(items[0].source, "ABC News");
        assert_eq!(items[0].source_url, "https://www.abc.net.au");

        let scoring = crate::search::scoring::ScoringConfig::default();
        // trusted tier +10, topic "telehealth" +7
        assert_eq!(scoring.score(&items[0]), 17.0);
    }

    #[test]
    fn test_malformed_feed_is_parse_error() {
        assert!(matches!(
            parse_feed("<html>not rss</html>"),
            Err(SearchError::Parse { .. })
        ));
    }

    #[test]
    fn test_strip_publisher_suffix() {
        assert_eq!(strip_publisher_suffix("Story - The Age", "The Age"), "Story");
        assert_eq!(strip_publisher_suffix("Story", "The Age"), "Story");
        assert_eq!(strip_publisher_suffix("Story - The Age", ""), "Story - The Age");
    }

    #[tokio::test]
    async fn test_search_builds_query_and_limits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss/search"))
            .and(query_param("q", "digital health when:1d"))
            .and(query_param("gl", "AU"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
            .mount(&server)
            .await;

        let client = GoogleNewsClient::new(Client::new(), &server.uri(), "en-AU", "AU", "AU:en");
        let items = client
            .search("digital health", 1, Some(1), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_search_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GoogleNewsClient::new(Client::new(), &server.uri(), "en-AU", "AU", "AU:en");
        let err = client
            .search("q", 10, None, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Status { status: 503, .. }));
    }
}
