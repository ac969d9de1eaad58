//! Article body extraction from raw or rendered HTML.
//!
//! Non-content elements are stripped first, then a fixed sequence of
//! [`Tier`]s is evaluated. Each tier proposes candidate text, the candidate is
//! run through [`clean_text`], and the first cleaned candidate longer than
//! `min_chars` wins.
//!
//! | Tier | Looks at |
//! |------|----------|
//! | [`Tier::Publisher`] | selectors from the URL's [`SelectorProfile`] |
//! | [`Tier::Article`] | `<article>` elements |
//! | [`Tier::Main`] | `<main>` elements |
//! | [`Tier::KeywordContainer`] | `div`/`section` with a content-ish class or id |
//! | [`Tier::RoleMain`] | `div`/`section` with `role="main"` |
//! | [`Tier::AllParagraphs`] | every `<p>` on the page |

pub mod clean;

pub use clean::clean_text;

use crate::classify::{DomainClassifier, SelectorProfile};
use crate::models::ExtractionResult;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

static NON_CONTENT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script, style, nav, footer, header, aside, iframe, noscript").unwrap()
});
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static MAIN: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static CONTAINER: Lazy<Selector> = Lazy::new(|| Selector::parse("div, section").unwrap());
static ROLE_MAIN: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[role=\"main\"], section[role=\"main\"]").unwrap());

/// One extraction heuristic, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Publisher,
    Article,
    Main,
    KeywordContainer,
    RoleMain,
    AllParagraphs,
}

impl Tier {
    pub const ORDER: [Tier; 6] = [
        Tier::Publisher,
        Tier::Article,
        Tier::Main,
        Tier::KeywordContainer,
        Tier::RoleMain,
        Tier::AllParagraphs,
    ];
}

/// Thresholds and keywords for the extraction tiers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// A tier wins only when its cleaned text is longer than this.
    pub min_chars: usize,
    /// Paragraphs a container needs before it is considered (tiers 2-4).
    pub min_container_paragraphs: usize,
    /// Paragraphs the whole page needs for the last-resort tier.
    pub min_page_paragraphs: usize,
    /// Class/id fragments that mark a likely content container.
    pub container_keywords: Vec<String>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_chars: 200,
            min_container_paragraphs: 3,
            min_page_paragraphs: 5,
            container_keywords: ["content", "article", "story", "body", "text", "post"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Tiered article-body extractor.
#[derive(Debug, Clone)]
pub struct Extractor {
    classifier: DomainClassifier,
    config: ExtractionConfig,
}

impl Extractor {
    pub fn new(classifier: DomainClassifier, config: ExtractionConfig) -> Self {
        Self { classifier, config }
    }

    /// Best-guess article body for `html` fetched from `url`.
    ///
    /// Returns an empty result when no tier clears the length threshold.
    #[instrument(level = "debug", skip(self, html), fields(html_bytes = html.len()))]
    pub fn extract(&self, html: &str, url: &str) -> ExtractionResult {
        let mut document = Html::parse_document(html);
        strip_non_content(&mut document);

        let profile = self.classifier.classify(url).publisher;

        for tier in Tier::ORDER {
            for candidate in self.candidates(tier, &document, profile) {
                let cleaned = clean_text(&candidate);
                if cleaned.chars().count() > self.config.min_chars {
                    debug!(?tier, chars = cleaned.chars().count(), "Extraction tier matched");
                    return ExtractionResult::new(cleaned);
                }
            }
        }

        debug!("No extraction tier produced enough text");
        ExtractionResult::empty()
    }

    /// Raw candidate texts for one tier. Only the publisher tier can yield
    /// more than one (one per selector).
    fn candidates(
        &self,
        tier: Tier,
        document: &Html,
        profile: Option<&SelectorProfile>,
    ) -> Vec<String> {
        match tier {
            Tier::Publisher => profile
                .map(|p| publisher_candidates(document, p))
                .unwrap_or_default(),
            Tier::Article => self.best_container(document.select(&ARTICLE)),
            Tier::Main => self.best_container(document.select(&MAIN)),
            Tier::KeywordContainer => {
                let keywords = &self.config.container_keywords;
                self.best_container(
                    document
                        .select(&CONTAINER)
                        .filter(|el| has_keyword_attr(el, keywords)),
                )
            }
            Tier::RoleMain => self.best_container(document.select(&ROLE_MAIN)),
            Tier::AllParagraphs => {
                let paragraphs: Vec<_> = document.select(&PARAGRAPH).collect();
                if paragraphs.len() >= self.config.min_page_paragraphs {
                    vec![join_paragraphs(paragraphs)]
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// The container with the most nested paragraphs (first wins ties), if it
    /// has at least `min_container_paragraphs` of them.
    fn best_container<'a>(&self, elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
        let mut best: Option<ElementRef<'a>> = None;
        let mut max_paragraphs = 0;
        for el in elements {
            let count = el.select(&PARAGRAPH).count();
            if count > max_paragraphs {
                max_paragraphs = count;
                best = Some(el);
            }
        }

        match best {
            Some(el) if max_paragraphs >= self.config.min_container_paragraphs => {
                vec![join_paragraphs(el.select(&PARAGRAPH))]
            }
            _ => Vec::new(),
        }
    }
}

fn publisher_candidates(document: &Html, profile: &SelectorProfile) -> Vec<String> {
    let mut out = Vec::new();
    for raw in &profile.selectors {
        let selector = match Selector::parse(raw) {
            Ok(s) => s,
            Err(e) => {
                debug!(selector = %raw, error = %e, "Skipping invalid publisher selector");
                continue;
            }
        };
        let texts: Vec<String> = document.select(&selector).map(|el| element_text(&el)).collect();
        if !texts.is_empty() {
            out.push(texts.join("\n\n"));
        }
    }
    out
}

fn has_keyword_attr(el: &ElementRef<'_>, keywords: &[String]) -> bool {
    let value = el.value();
    [value.attr("class"), value.attr("id")]
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .any(|attr| keywords.iter().any(|kw| attr.contains(kw.as_str())))
}

/// Text nodes of an element, trimmed and joined with single spaces.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn join_paragraphs<'a>(paragraphs: impl IntoIterator<Item = ElementRef<'a>>) -> String {
    paragraphs
        .into_iter()
        .map(|p| element_text(&p))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Detach scripts, styles and page chrome so no tier sees them.
fn strip_non_content(document: &mut Html) {
    let ids: Vec<_> = document.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}
