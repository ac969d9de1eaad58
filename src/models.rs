//! Data models shared by the search, retrieval and report layers.
//!
//! - [`ArticleReference`]: one search hit, identified by its link
//! - [`RetrievalOutcome`] / [`StrategyKind`]: result of one fetch attempt
//! - [`ExtractionResult`]: cleaned article text, possibly empty
//! - [`DigestRecord`]: the `{Title, Summary, Link, Date}` row handed to the report writers

use serde::{Deserialize, Serialize};
use std::fmt;

/// A candidate article produced by a search backend.
///
/// `link` is the identity key. `relevance_score` starts at zero and is set
/// once by the aggregator's scoring pass.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleReference {
    pub title: String,
    pub link: String,
    /// Publish date exactly as the backend reported it.
    pub published: String,
    /// Display name of the publisher.
    pub source: String,
    /// Publisher site, when the backend reports it apart from `link`.
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub relevance_score: f64,
}

impl ArticleReference {
    pub fn new(title: &str, link: &str, published: &str, source: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            link: link.trim().to_string(),
            published: published.trim().to_string(),
            source: source.trim().to_string(),
            source_url: String::new(),
            relevance_score: 0.0,
        }
    }

    pub fn with_source_url(mut self, source_url: &str) -> Self {
        self.source_url = source_url.trim().to_string();
        self
    }
}

/// The retrieval backends, in no particular order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Single GET with browser-like headers.
    Plain,
    /// Cookie-carrying session with challenge detection and an optional solver.
    Hardened,
    /// Rendering delegated to a remote Browserless-style `/content` endpoint.
    RemoteRender,
    /// Local headless browser driven over WebDriver.
    Browser,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::Plain => "plain",
            StrategyKind::Hardened => "hardened",
            StrategyKind::RemoteRender => "remote_render",
            StrategyKind::Browser => "browser",
        };
        f.write_str(name)
    }
}

/// What one strategy produced for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalOutcome {
    Success {
        html: String,
        strategy_used: StrategyKind,
    },
    Failure {
        strategy_tried: StrategyKind,
        cause: String,
    },
}

impl RetrievalOutcome {
    pub fn failure(strategy_tried: StrategyKind, cause: impl fmt::Display) -> Self {
        RetrievalOutcome::Failure {
            strategy_tried,
            cause: cause.to_string(),
        }
    }
}

/// Extracted article body. Empty text means nothing usable was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    pub text: String,
    /// Length of `text` in characters.
    pub length: usize,
}

impl ExtractionResult {
    pub fn new(text: String) -> Self {
        let length = text.chars().count();
        Self { text, length }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// One processed article, in report order.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DigestRecord {
    pub Title: String,
    pub Summary: String,
    pub Link: String,
    pub Date: String,
}
