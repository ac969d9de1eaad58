//! # News Harvest
//!
//! Finds recent news on a topic, retrieves each article through a chain of
//! increasingly heavyweight fetch strategies, extracts the readable body
//! text and hands it to an LLM for a short summary.
//!
//! ## Architecture
//!
//! 1. **Search** ([`search`]): query Google News and DuckDuckGo, dedupe, date-filter, score
//! 2. **Retrieve** ([`retriever`], [`fetchers`]): plain, hardened, remote render, browser
//! 3. **Extract** ([`extract`], [`classify`]): publisher selectors, then generic tiers
//! 4. **Summarize** ([`api`]): chat-completions with backoff, sentinel on failure
//! 5. **Report** ([`digest`], [`outputs`]): one record per hit, JSON and Markdown

pub mod api;
pub mod classify;
pub mod cli;
pub mod config;
pub mod digest;
pub mod error;
pub mod extract;
pub mod fetchers;
pub mod models;
pub mod outputs;
pub mod retriever;
pub mod search;
pub mod utils;
