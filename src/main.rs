//! # News Harvest
//!
//! Searches for recent news on a topic, retrieves and extracts each article,
//! summarizes it through an OpenAI-compatible LLM API and writes the results
//! as timestamped JSON and Markdown reports.
//!
//! ## Usage
//!
//! ```sh
//! GROQ_API_KEY=... news_harvest -o ./output
//! ```
//!
//! ## Pipeline
//!
//! 1. **Search**: Google News RSS and DuckDuckGo News, merged and ranked
//! 2. **Retrieval**: per-domain strategy chain, first usable page wins
//! 3. **Summarization**: one request per article, with backoff
//! 4. **Output**: `{stem}_{timestamp}.json` and `.md` in the output directory

use chrono::Local;
use clap::Parser;
use news_harvest::api::Summarizer;
use news_harvest::cli::Cli;
use news_harvest::config::Config;
use news_harvest::digest::build_digest;
use news_harvest::outputs::{json, markdown};
use news_harvest::retriever::Retriever;
use news_harvest::search::SearchAggregator;
use news_harvest::utils::ensure_writable_dir;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_harvest starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.config, ?args.output_dir, queries = ?args.queries, "Parsed CLI arguments");

    // ---- Load config ----
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);

    // Early check: ensure output dir is writable
    if let Err(e) = ensure_writable_dir(&config.output.output_dir).await {
        error!(
            path = %config.output.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let summarizer = Summarizer::from_config(&config.summarizer);
    if !summarizer.is_enabled() {
        warn!("No summarizer API key (set GROQ_API_KEY or --api-key); summaries will be placeholders");
    }

    // ---- Search ----
    let aggregator = SearchAggregator::new(config.search.clone(), config.scoring.clone())?;
    let references = aggregator.search().await;
    if references.is_empty() {
        warn!("No results found. Exiting.");
        return Ok(());
    }
    info!(count = references.len(), "Articles to process");

    // ---- Retrieve, extract, summarize ----
    let retriever = Retriever::new(
        config.classifier.clone(),
        config.extraction.clone(),
        config.retrieval.clone(),
    )?;
    let (records, stats) = build_digest(&references, &retriever, &summarizer, &config.pipeline).await;

    // ---- Output ----
    let now = Local::now();
    let json_path = config.output.report_path(&now, "json");
    if let Err(e) = json::write_records(&records, &json_path).await {
        error!(path = %json_path.display(), error = %e, "Failed to write JSON report");
    }

    let md_path = config.output.report_path(&now, "md");
    if let Err(e) = markdown::write_records(&config.output.title, &records, &md_path).await {
        error!(path = %md_path.display(), error = %e, "Failed writing Markdown");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        successful = stats.successful,
        failed = stats.failed,
        "Execution complete"
    );

    Ok(())
}
