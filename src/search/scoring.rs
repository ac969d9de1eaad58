//! Relevance scoring of search hits.
//!
//! A score is a sum of independent bonuses: one for the publisher's trust
//! tier, and one per keyword category found in the title. Scores are only
//! used for ordering; they are never capped or normalized.

use crate::classify::hostname;
use crate::models::ArticleReference;
use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Bonus values per signal.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub trusted: f64,
    pub relevant: f64,
    pub geographic: f64,
    pub topic: f64,
    pub secondary: f64,
    pub startup: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            trusted: 10.0,
            relevant: 8.0,
            geographic: 5.0,
            topic: 7.0,
            secondary: 3.0,
            startup: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Hostname fragments of the highest trust tier.
    pub trusted_domains: Vec<String>,
    /// Hostname fragments of specialist outlets, checked when not trusted.
    pub relevant_domains: Vec<String>,
    /// Places in the target region.
    pub geographic_keywords: Vec<String>,
    /// Core subject terms.
    pub topic_keywords: Vec<String>,
    /// Conditions and care areas.
    pub secondary_keywords: Vec<String>,
    /// Funding and company news.
    pub startup_keywords: Vec<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            trusted_domains: strings(&[
                "abc.net.au",
                "smh.com.au",
                "theage.com.au",
                "afr.com",
                "theguardian.com",
                "bbc.com",
                "reuters.com",
                "sbs.com.au",
                "news.com.au",
                "9news.com.au",
                "7news.com.au",
            ]),
            relevant_domains: strings(&[
                "healthcareit.com.au",
                "pulseit.news",
                "itnews.com.au",
                "digitalhealth.gov.au",
                "health.gov.au",
                "medicalrepublic.com.au",
                "ausdoc.com.au",
                "mobihealthnews.com",
                "healthcareitnews.com",
                "zdnet.com",
                "innovationaus.com",
                "msn.com",
            ]),
            geographic_keywords: strings(&[
                "australia",
                "australian",
                "nsw",
                "new south wales",
                "victoria",
                "queensland",
                "tasmania",
                "western australia",
                "south australia",
                "northern territory",
                "sydney",
                "melbourne",
                "brisbane",
                "perth",
                "adelaide",
                "hobart",
                "canberra",
                "darwin",
            ]),
            topic_keywords: strings(&[
                "digital health",
                "health tech",
                "healthtech",
                "telehealth",
                "telemedicine",
                "artificial intelligence",
                "machine learning",
                "my health record",
                "e-health",
                "ehealth",
                "virtual care",
                "health",
            ]),
            secondary_keywords: strings(&[
                "cancer",
                "diabetes",
                "dementia",
                "mental health",
                "stroke",
                "cardiac",
                "heart disease",
                "covid",
                "chronic",
                "aged care",
            ]),
            startup_keywords: strings(&[
                "startup",
                "start-up",
                "funding",
                "raises",
                "investment",
                "venture",
                "seed round",
                "series a",
                "series b",
            ]),
        }
    }
}

impl ScoringConfig {
    /// Score one hit.
    ///
    /// The trust tier is matched against the link's host, the publisher site
    /// the backend reported (aggregator links such as Google News carry it
    /// only there) and the source name.
    ///
    /// # Returns
    ///
    /// The sum of every bonus that applies, never below zero.
    pub fn score(&self, item: &ArticleReference) -> f64 {
        let w = &self.weights;
        let title = item.title.to_lowercase();
        let hosts: Vec<String> = [item.link.as_str(), item.source_url.as_str()]
            .into_iter()
            .filter_map(hostname)
            .collect();
        let source = item.source.to_lowercase();

        let in_tier = |domains: &[String]| {
            domains.iter().any(|d| {
                let d = d.to_lowercase();
                !d.is_empty() && (hosts.iter().any(|h| h.contains(&d)) || source.contains(&d))
            })
        };
        let mentions = |keywords: &[String]| {
            keywords
                .iter()
                .any(|k| !k.is_empty() && title.contains(&k.to_lowercase()))
        };

        let mut score = 0.0;
        if in_tier(&self.trusted_domains) {
            score += w.trusted;
        } else if in_tier(&self.relevant_domains) {
            score += w.relevant;
        }
        if mentions(&self.geographic_keywords) {
            score += w.geographic;
        }
        if mentions(&self.topic_keywords) {
            score += w.topic;
        }
        if mentions(&self.secondary_keywords) {
            score += w.secondary;
        }
        if mentions(&self.startup_keywords) {
            score += w.startup;
        }

        // Negative weights from a hand-edited config must not produce negative scores
        score.max(0.0)
    }
}
