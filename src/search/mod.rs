//! Search aggregation: fan queries out to news backends and rank the hits.
//!
//! For every configured query both backends are asked in turn. Their hits
//! are merged into one list, de-duplicated ([`dedupe`]), filtered by publish
//! date ([`recency`]), scored ([`scoring`]) and sorted by score.
//!
//! | Backend | Module | Kind |
//! |---------|--------|------|
//! | Google News | [`google_news`] | RSS feed search |
//! | DuckDuckGo News | [`duckduckgo`] | JSON news API |
//!
//! A failing backend only loses its own hits for that query.

pub mod dedupe;
pub mod duckduckgo;
pub mod google_news;
pub mod recency;
pub mod scoring;

use crate::error::SearchError;
use crate::fetchers::CHROME_USER_AGENT;
use crate::models::ArticleReference;
use chrono::{DateTime, Utc};
use duckduckgo::DuckDuckGoClient;
use google_news::GoogleNewsClient;
use reqwest::Client;
use scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// A news search backend.
pub trait NewsSearch {
    /// Short backend name for logs and errors.
    fn name(&self) -> &'static str;

    /// At most `limit` hits for `query`, optionally restricted to the last
    /// `recency_days` days where the backend supports it.
    async fn search(
        &self,
        query: &str,
        limit: usize,
        recency_days: Option<u32>,
        timeout: Duration,
    ) -> Result<Vec<ArticleReference>, SearchError>;
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Every query is sent to every enabled backend.
    pub queries: Vec<String>,
    /// Hits kept per query and backend.
    pub max_results: usize,
    /// Trailing window in days; `None` keeps everything.
    pub recency_days: Option<u32>,
    /// Per-request budget for backend calls.
    pub timeout_secs: u64,
    /// Titles at or above this similarity count as the same story.
    pub similarity_threshold: f64,
    /// Drop ranked hits scoring below this.
    pub min_score: Option<f64>,
    /// Keep only this many ranked hits.
    pub top_n: Option<usize>,
    pub google_news_enabled: bool,
    /// Base URL of the Google News feed service.
    pub google_news_url: String,
    /// Interface language (`hl`).
    pub google_news_hl: String,
    /// Edition country (`gl`).
    pub google_news_gl: String,
    /// Edition id (`ceid`), `country:language`.
    pub google_news_ceid: String,
    pub duckduckgo_enabled: bool,
    pub duckduckgo_url: String,
    /// DuckDuckGo region code, e.g. `au-en`.
    pub duckduckgo_region: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            queries: vec!["digital health Australia news related to AI".to_string()],
            max_results: 10,
            recency_days: Some(1),
            timeout_secs: 15,
            similarity_threshold: 0.90,
            min_score: None,
            top_n: None,
            google_news_enabled: true,
            google_news_url: "https://news.google.com".to_string(),
            google_news_hl: "en-AU".to_string(),
            google_news_gl: "AU".to_string(),
            google_news_ceid: "AU:en".to_string(),
            duckduckgo_enabled: true,
            duckduckgo_url: "https://duckduckgo.com".to_string(),
            duckduckgo_region: "au-en".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchAggregator {
    config: SearchConfig,
    scoring: ScoringConfig,
    google_news: GoogleNewsClient,
    duckduckgo: DuckDuckGoClient,
}

impl SearchAggregator {
    /// Create an aggregator over both backends.
    ///
    /// # Arguments
    ///
    /// * `config` - Queries, limits and backend endpoints
    /// * `scoring` - Trust tiers and keyword weights used for ranking
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Network`] if the HTTP client cannot be built.
    pub fn new(config: SearchConfig, scoring: ScoringConfig) -> Result<Self, SearchError> {
        let client = Client::builder().user_agent(CHROME_USER_AGENT).build()?;
        let google_news = GoogleNewsClient::new(
            client.clone(),
            &config.google_news_url,
            &config.google_news_hl,
            &config.google_news_gl,
            &config.google_news_ceid,
        );
        let duckduckgo =
            DuckDuckGoClient::new(client, &config.duckduckgo_url, &config.duckduckgo_region);

        Ok(Self {
            config,
            scoring,
            google_news,
            duckduckgo,
        })
    }

    /// Ranked, de-duplicated hits for every configured query.
    pub async fn search(&self) -> Vec<ArticleReference> {
        self.search_at(Utc::now()).await
    }

    #[instrument(level = "info", skip(self), fields(queries = self.config.queries.len()))]
    pub async fn search_at(&self, now: DateTime<Utc>) -> Vec<ArticleReference> {
        let mut candidates = Vec::new();
        for query in &self.config.queries {
            if self.config.google_news_enabled {
                candidates.extend(self.collect(&self.google_news, query).await);
            }
            if self.config.duckduckgo_enabled {
                candidates.extend(self.collect(&self.duckduckgo, query).await);
            }
        }

        let raw = candidates.len();
        let ranked = self.rank(candidates, now);
        info!(raw, kept = ranked.len(), "Search aggregation complete");
        ranked
    }

    /// Dedupe, date-filter, score and sort an already-collected candidate list.
    pub fn rank(&self, candidates: Vec<ArticleReference>, now: DateTime<Utc>) -> Vec<ArticleReference> {
        let merged = dedupe::merge(candidates, self.config.similarity_threshold);
        let mut ranked = recency::filter_recent(merged, self.config.recency_days, now);

        for item in &mut ranked {
            item.relevance_score = self.scoring.score(item);
        }
        // Stable: equal scores keep backend order
        ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        if let Some(min_score) = self.config.min_score {
            ranked.retain(|item| item.relevance_score >= min_score);
        }
        if let Some(top_n) = self.config.top_n {
            ranked.truncate(top_n);
        }
        ranked
    }

    async fn collect(&self, backend: &impl NewsSearch, query: &str) -> Vec<ArticleReference> {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        match backend
            .search(query, self.config.max_results, self.config.recency_days, timeout)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(backend = backend.name(), %query, error = %e, "Search backend failed; continuing");
                Vec::new()
            }
        }
    }
}
