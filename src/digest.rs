//! Per-article processing: retrieve, extract, summarize, record.
//!
//! Every ranked search hit becomes exactly one [`DigestRecord`], in ranking
//! order, whether or not its page could be fetched. Failures show up as a
//! sentinel summary and in the failed count.

use crate::api::{AskAsync, SUMMARY_FETCH_FAILED, Summarizer, is_unavailable};
use crate::models::{ArticleReference, DigestRecord};
use crate::retriever::Retriever;
use crate::utils::truncate_for_log;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Articles in flight at once. Output order does not depend on it.
    pub concurrency: usize,
    /// Pause after each article, per worker.
    pub article_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            article_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestStats {
    pub successful: usize,
    pub failed: usize,
}

/// Process `references` into report rows.
#[instrument(level = "info", skip_all, fields(total = references.len(), concurrency = config.concurrency))]
pub async fn build_digest<T>(
    references: &[ArticleReference],
    retriever: &Retriever,
    summarizer: &Summarizer<T>,
    config: &PipelineConfig,
) -> (Vec<DigestRecord>, DigestStats)
where
    T: AskAsync<Response = String>,
{
    let delay = Duration::from_millis(config.article_delay_ms);
    let unique: Vec<&ArticleReference> = references.iter().unique_by(|r| r.link.as_str()).collect();
    let total = unique.len();

    let results: Vec<(DigestRecord, bool)> = stream::iter(unique.into_iter().enumerate())
        .map(|(i, reference)| async move {
            let outcome = process_one(i, total, reference, retriever, summarizer).await;
            if i + 1 < total {
                sleep(delay).await;
            }
            outcome
        })
        .buffered(config.concurrency.max(1))
        .collect()
        .await;

    let mut stats = DigestStats::default();
    let records = results
        .into_iter()
        .map(|(record, ok)| {
            if ok {
                stats.successful += 1;
            } else {
                stats.failed += 1;
            }
            record
        })
        .collect();

    info!(successful = stats.successful, failed = stats.failed, "Digest complete");
    (records, stats)
}

async fn process_one<T>(
    index: usize,
    total: usize,
    reference: &ArticleReference,
    retriever: &Retriever,
    summarizer: &Summarizer<T>,
) -> (DigestRecord, bool)
where
    T: AskAsync<Response = String>,
{
    info!(
        n = index + 1,
        total,
        title = %truncate_for_log(&reference.title, 60),
        "Processing article"
    );

    let article = retriever.fetch_article(&reference.link).await;
    let summary = if article.is_empty() {
        warn!(link = %reference.link, "Could not fetch article content");
        SUMMARY_FETCH_FAILED.to_string()
    } else {
        debug!(chars = article.length, "Generating summary");
        summarizer.summarize(&article.text).await
    };
    let ok = !is_unavailable(&summary);

    let record = DigestRecord {
        Title: reference.title.clone(),
        Summary: summary,
        Link: reference.link.clone(),
        Date: reference.published.clone(),
    };
    (record, ok)
}
