//! Domain classification for article URLs.
//!
//! Maps a URL's hostname to a known publisher ([`SelectorProfile`]) and to a
//! site-structure category. The category decides the order in which the
//! [`Retriever`](crate::retriever::Retriever) tries its strategies; the
//! profile gives the extractor its first set of CSS selectors.
//!
//! Classification is a pure lookup: no network, and an unparseable URL is
//! simply an unknown, static site.

use serde::{Deserialize, Serialize};
use url::Url;

/// Publisher-specific extraction selectors, bound to a hostname fragment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SelectorProfile {
    /// Substring matched against the lowercase hostname (e.g. `abc.net.au`).
    pub host: String,
    /// CSS selectors, tried in order until one yields enough text.
    pub selectors: Vec<String>,
}

impl SelectorProfile {
    pub fn new(host: &str, selectors: &[&str]) -> Self {
        Self {
            host: host.to_string(),
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Result of classifying one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification<'a> {
    pub publisher: Option<&'a SelectorProfile>,
    /// Known JavaScript-heavy site: render in a browser first.
    pub script_rendered: bool,
    /// Needs the long settle time after navigation.
    pub slow_render: bool,
}

/// Hostname lookup tables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DomainClassifier {
    /// Publisher selector profiles, matched by hostname fragment.
    pub publishers: Vec<SelectorProfile>,
    /// Hostname fragments of sites that only produce content in a browser.
    pub script_rendered: Vec<String>,
    /// Hostname fragments that need the long browser settle time.
    pub slow_render: Vec<String>,
}

impl Default for DomainClassifier {
    fn default() -> Self {
        Self {
            publishers: default_publishers(),
            // Google News article links that could not be decoded redirect in script
            script_rendered: vec!["msn.com".to_string(), "news.google.com".to_string()],
            slow_render: vec!["msn.com".to_string()],
        }
    }
}

impl DomainClassifier {
    pub fn classify(&self, url: &str) -> Classification<'_> {
        let Some(host) = hostname(url) else {
            return Classification {
                publisher: None,
                script_rendered: false,
                slow_render: false,
            };
        };

        Classification {
            publisher: self.publisher_for_host(&host),
            script_rendered: self.script_rendered.iter().any(|f| host.contains(f.as_str())),
            slow_render: self.slow_render.iter().any(|f| host.contains(f.as_str())),
        }
    }

    /// Longest matching fragment wins; on equal length the earlier table entry is kept.
    fn publisher_for_host(&self, host: &str) -> Option<&SelectorProfile> {
        let mut best: Option<&SelectorProfile> = None;
        for profile in &self.publishers {
            if profile.host.is_empty() || !host.contains(profile.host.as_str()) {
                continue;
            }
            match best {
                Some(current) if current.host.len() >= profile.host.len() => {}
                _ => best = Some(profile),
            }
        }
        best
    }
}

/// Lowercase hostname of `url`, if it parses.
pub fn hostname(url: &str) -> Option<String> {
    Url::parse(url.trim())
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
}

fn default_publishers() -> Vec<SelectorProfile> {
    vec![
        SelectorProfile::new(
            "msn.com",
            &[
                "article",
                "div[class*=\"article\"]",
                "div[class*=\"story\"]",
                "div[class*=\"content\"]",
                "main article",
                "main div[class*=\"article\"]",
                "[data-t=\"article-body\"]",
                ".article-body",
                ".articlebody",
                "main .content",
                "div[role=\"main\"]",
                "div[id*=\"article\"]",
                "div[id*=\"content\"]",
            ],
        ),
        SelectorProfile::new(
            "abc.net.au",
            &[
                "article div[data-component=\"ArticleBody\"]",
                "article .article-content",
                "article #body",
                ".article__body",
                "div[data-component=\"BodyText\"]",
            ],
        ),
        SelectorProfile::new("smh.com.au", &["article .article-body", "#article-body", "article"]),
        SelectorProfile::new("theage.com.au", &["article .article-body", "article"]),
        SelectorProfile::new("afr.com", &["article .article-content", "article"]),
        SelectorProfile::new("news.com.au", &[".story-primary", ".story-block", "article"]),
        SelectorProfile::new(
            "theguardian.com",
            &[".article-body-commercial-selector", "article"],
        ),
        SelectorProfile::new("bbc.com", &[".article__body-content", "article"]),
        SelectorProfile::new("reuters.com", &[".article-body__content", "article"]),
        SelectorProfile::new("9news.com.au", &[".article__body", "article", ".story__body"]),
        SelectorProfile::new("7news.com.au", &[".article-body", "article"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_publisher_is_resolved() {
        let classifier = DomainClassifier::default();
        let c = classifier.classify("https://www.abc.net.au/news/2025-01-01/story/123");
        assert_eq!(c.publisher.map(|p| p.host.as_str()), Some("abc.net.au"));
        assert!(!c.script_rendered);
    }

    #[test]
    fn test_longest_fragment_wins() {
        let classifier = DomainClassifier::default();
        // "9news.com.au" also contains "news.com.au"
        let c = classifier.classify("https://www.9news.com.au/national/story/abc");
        assert_eq!(c.publisher.map(|p| p.host.as_str()), Some("9news.com.au"));

        let c = classifier.classify("https://www.news.com.au/technology/story");
        assert_eq!(c.publisher.map(|p| p.host.as_str()), Some("news.com.au"));
    }

    #[test]
    fn test_equal_length_tie_keeps_table_order() {
        let classifier = DomainClassifier {
            publishers: vec![
                SelectorProfile::new("aaa.com", &["#first"]),
                SelectorProfile::new("aaa.com", &["#second"]),
            ],
            ..Default::default()
        };
        let c = classifier.classify("https://aaa.com/x");
        assert_eq!(c.publisher.unwrap().selectors, vec!["#first".to_string()]);
    }

    #[test]
    fn test_script_rendered_and_slow() {
        let classifier = DomainClassifier::default();
        let c = classifier.classify("https://www.msn.com/en-au/news/australia/some-story/ar-AA1");
        assert!(c.script_rendered);
        assert!(c.slow_render);
        assert_eq!(c.publisher.map(|p| p.host.as_str()), Some("msn.com"));
    }

    #[test]
    fn test_google_news_wrapper_renders_first() {
        let classifier = DomainClassifier::default();
        let c = classifier.classify("https://news.google.com/rss/articles/AU_yqLOpaque?oc=5");
        assert!(c.script_rendered);
        assert!(!c.slow_render);
        assert!(c.publisher.is_none());
    }

    #[test]
    fn test_garbage_url_never_fails() {
        let classifier = DomainClassifier::default();
        let c = classifier.classify("not a url at all");
        assert!(c.publisher.is_none());
        assert!(!c.script_rendered);
        assert!(!c.slow_render);
    }

    #[test]
    fn test_hostname_is_lowercased() {
        assert_eq!(
            hostname("HTTPS://WWW.Example.COM/Path").as_deref(),
            Some("www.example.com")
        );
    }
}
