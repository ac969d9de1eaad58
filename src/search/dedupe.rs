//! Merge-time de-duplication of search hits.
//!
//! Two hits are the same story when their links normalize to the same
//! string, or when their titles are near-identical. The first hit seen wins.

use crate::models::ArticleReference;
use std::collections::HashSet;
use url::Url;

/// `scheme://host[:port]/path` with query, fragment and trailing slash removed.
pub fn normalize_url(link: &str) -> String {
    let link = link.trim();
    match Url::parse(link) {
        Ok(url) if url.host_str().is_some() => {
            let host = url.host_str().unwrap_or_default();
            let port = url.port().map(|p| format!(":{p}")).unwrap_or_default();
            format!(
                "{}://{}{}{}",
                url.scheme(),
                host,
                port,
                url.path().trim_end_matches('/')
            )
        }
        _ => {
            let end = link.find(['?', '#']).unwrap_or(link.len());
            link[..end].trim_end_matches('/').to_string()
        }
    }
}

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Normalized edit-distance similarity of two titles in `[0, 1]`.
///
/// Symmetric. An empty title is similar to nothing.
pub fn title_similarity(a: &str, b: &str) -> f64 {
    let (a, b) = (normalize_title(a), normalize_title(b));
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(&a, &b)
}

/// Keep the first of every group of duplicates, preserving input order.
pub fn merge(candidates: Vec<ArticleReference>, similarity_threshold: f64) -> Vec<ArticleReference> {
    let mut seen_links = HashSet::new();
    let mut accepted: Vec<ArticleReference> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let key = normalize_url(&candidate.link);
        if seen_links.contains(&key) {
            continue;
        }
        let near_duplicate = accepted
            .iter()
            .any(|a| title_similarity(&a.title, &candidate.title) >= similarity_threshold);
        if near_duplicate {
            continue;
        }
        seen_links.insert(key);
        accepted.push(candidate);
    }

    accepted
}
