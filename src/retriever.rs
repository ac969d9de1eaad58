//! Retrieval orchestration: ordered fallback across strategies.
//!
//! The domain classification of a URL picks one of two fixed strategy
//! orders. Strategies run strictly one after another, the first success
//! wins, and each failure is followed by a short politeness delay. Total
//! failure is an empty value, never an error.

use crate::classify::DomainClassifier;
use crate::error::FetchError;
use crate::extract::{ExtractionConfig, Extractor};
use crate::fetchers::{Fetchers, RetrievalConfig};
use crate::models::{ExtractionResult, RetrievalOutcome, StrategyKind};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// Order for sites that need JavaScript: render first, plain HTTP last.
pub const SCRIPT_RENDERED_ORDER: [StrategyKind; 4] = [
    StrategyKind::Browser,
    StrategyKind::RemoteRender,
    StrategyKind::Hardened,
    StrategyKind::Plain,
];

/// Order for everything else: cheap HTTP first, browser last.
pub const STATIC_ORDER: [StrategyKind; 4] = [
    StrategyKind::Hardened,
    StrategyKind::Plain,
    StrategyKind::RemoteRender,
    StrategyKind::Browser,
];

pub fn strategy_order(script_rendered: bool) -> &'static [StrategyKind] {
    if script_rendered {
        &SCRIPT_RENDERED_ORDER
    } else {
        &STATIC_ORDER
    }
}

#[derive(Debug, Clone)]
pub struct Retriever {
    classifier: DomainClassifier,
    extractor: Extractor,
    fetchers: Fetchers,
}

impl Retriever {
    /// Create a retriever.
    ///
    /// # Arguments
    ///
    /// * `classifier` - Decides strategy order and publisher selectors per URL
    /// * `extraction` - Thresholds for the article-text acceptance check
    /// * `retrieval` - Settings shared by all strategies
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        classifier: DomainClassifier,
        extraction: ExtractionConfig,
        retrieval: RetrievalConfig,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            extractor: Extractor::new(classifier.clone(), extraction),
            classifier,
            fetchers: Fetchers::new(retrieval)?,
        })
    }

    /// Raw HTML from the first strategy that returns any, or `""`.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_html(&self, url: &str) -> String {
        self.first_accepted(url, |html| Some(html.to_string()))
            .await
            .unwrap_or_default()
    }

    /// Article text from the first strategy whose HTML actually yields some.
    ///
    /// A 200 response that turns out to be a shell or consent page does not
    /// stop the fallback chain.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_article(&self, url: &str) -> ExtractionResult {
        self.first_accepted(url, |html| {
            let result = self.extractor.extract(html, url);
            (!result.is_empty()).then_some(result)
        })
        .await
        .unwrap_or_default()
    }

    async fn first_accepted<T>(&self, url: &str, accept: impl Fn(&str) -> Option<T>) -> Option<T> {
        let classification = self.classifier.classify(url);
        let order = strategy_order(classification.script_rendered);
        let config = self.fetchers.config();
        let delay = Duration::from_millis(config.strategy_delay_ms);

        for (i, &kind) in order.iter().enumerate() {
            let outcome = self
                .fetchers
                .fetch(kind, url, config.timeout_for(kind), classification.slow_render)
                .await;

            match outcome {
                RetrievalOutcome::Success { html, strategy_used } => match accept(&html) {
                    Some(value) => {
                        info!(strategy = %strategy_used, bytes = html.len(), "Retrieved article");
                        return Some(value);
                    }
                    None => {
                        warn!(strategy = %strategy_used, "No content extracted");
                    }
                },
                RetrievalOutcome::Failure {
                    strategy_tried,
                    cause,
                } => {
                    warn!(strategy = %strategy_tried, %cause, "Strategy failed");
                }
            }

            if i + 1 < order.len() {
                sleep(delay).await;
            }
        }

        warn!(attempted = order.len(), "All strategies failed");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn offline_config() -> RetrievalConfig {
        RetrievalConfig {
            strategy_delay_ms: 0,
            plain_timeout_secs: 5,
            hardened_timeout_secs: 5,
            browser_timeout_secs: 2,
            webdriver_url: None,
            browserless_url: None,
            ..Default::default()
        }
    }

    fn retriever(config: RetrievalConfig) -> Retriever {
        Retriever::new(
            DomainClassifier::default(),
            ExtractionConfig::default(),
            config,
        )
        .unwrap()
    }

    fn article_html() -> String {
        let paragraphs: String = (1..=4)
            .map(|n| format!("<p>Paragraph {n} of a reasonably long news story about hospitals.</p>"))
            .collect();
        format!("<html><body><article>{paragraphs}</article></body></html>")
    }

    #[test]
    fn test_strategy_order_policy() {
        assert_eq!(strategy_order(true)[0], StrategyKind::Browser);
        assert_eq!(*strategy_order(true).last().unwrap(), StrategyKind::Plain);
        assert_eq!(strategy_order(false)[0], StrategyKind::Hardened);
        assert_eq!(*strategy_order(false).last().unwrap(), StrategyKind::Browser);
    }

    #[tokio::test]
    async fn test_all_strategies_failing_returns_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let r = retriever(offline_config());
        assert_eq!(r.fetch_html(&server.uri()).await, "");
        assert!(r.fetch_article(&server.uri()).await.is_empty());
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_html()))
            .expect(1)
            .mount(&server)
            .await;

        // Hardened goes first for static sites and succeeds; plain never runs
        let html = retriever(offline_config()).fetch_html(&server.uri()).await;
        assert!(html.contains("<article>"));
    }

    #[tokio::test]
    async fn test_shell_page_falls_through_to_next_strategy() {
        let server = MockServer::start().await;
        // Only the hardened session sends client hints
        Mock::given(method("GET"))
            .and(header_exists("sec-ch-ua"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Enable JS</body></html>"))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(article_html()))
            .mount(&server)
            .await;

        let r = retriever(offline_config());
        let result = r.fetch_article(&server.uri()).await;
        assert!(result.text.starts_with("Paragraph 1"));

        // Raw HTML acceptance takes the first body it gets
        let html = r.fetch_html(&server.uri()).await;
        assert!(html.contains("Enable JS"));
    }
}
