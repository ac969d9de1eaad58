//! Command-line interface definitions for News Harvest.
//!
//! Flags override the YAML config file; secrets and service endpoints can
//! also come from environment variables.

use crate::config::Config;
use clap::Parser;

/// Command-line arguments for the News Harvest application.
///
/// # Examples
///
/// ```sh
/// # Defaults, summaries via GROQ_API_KEY
/// news_harvest -o ./output
///
/// # Custom config and queries, a week of news
/// news_harvest -c config.yaml -q "telehealth Australia" -q "My Health Record" --recency-days 7
///
/// # With a local chromedriver and a Browserless instance
/// news_harvest --webdriver-url http://localhost:9515 --browserless-url http://localhost:3000
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output directory for the JSON and Markdown reports
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Search query (repeat for several); replaces the configured list
    #[arg(short, long = "query")]
    pub queries: Vec<String>,

    /// Maximum hits per query and backend
    #[arg(long)]
    pub max_results: Option<usize>,

    /// Only keep articles published in the last N days
    #[arg(long)]
    pub recency_days: Option<u32>,

    /// Keep at most this many ranked articles
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Articles processed concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// API key for the chat-completions summarizer
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// WebDriver endpoint for the browser strategy
    #[arg(long, env = "WEBDRIVER_URL")]
    pub webdriver_url: Option<String>,

    /// Browserless-compatible base URL for the remote render strategy
    #[arg(long, env = "BROWSERLESS_URL")]
    pub browserless_url: Option<String>,

    /// Browserless API token
    #[arg(long, env = "BROWSERLESS_TOKEN", hide_env_values = true)]
    pub browserless_token: Option<String>,

    /// FlareSolverr-compatible challenge solver endpoint
    #[arg(long, env = "CHALLENGE_SOLVER_URL")]
    pub solver_url: Option<String>,
}

impl Cli {
    /// Apply every flag that was given on top of `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if !self.queries.is_empty() {
            config.search.queries = self.queries.clone();
        }
        if let Some(n) = self.max_results {
            config.search.max_results = n;
        }
        if let Some(days) = self.recency_days {
            config.search.recency_days = Some(days);
        }
        if let Some(n) = self.top_n {
            config.search.top_n = Some(n);
        }
        if let Some(n) = self.concurrency {
            config.pipeline.concurrency = n.max(1);
        }
        if let Some(key) = &self.api_key {
            config.summarizer.api_key = Some(key.clone());
        }
        if let Some(url) = &self.webdriver_url {
            config.retrieval.webdriver_url = Some(url.clone());
        }
        if let Some(url) = &self.browserless_url {
            config.retrieval.browserless_url = Some(url.clone());
        }
        if let Some(token) = &self.browserless_token {
            config.retrieval.browserless_token = Some(token.clone());
        }
        if let Some(url) = &self.solver_url {
            config.retrieval.solver_url = Some(url.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(&[
            "news_harvest",
            "--output-dir",
            "./reports",
            "--query",
            "telehealth",
            "--query",
            "aged care",
            "--recency-days",
            "7",
        ]);

        assert_eq!(cli.output_dir.as_deref(), Some("./reports"));
        assert_eq!(cli.queries, vec!["telehealth", "aged care"]);
        assert_eq!(cli.recency_days, Some(7));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(&["news_harvest", "-c", "/tmp/config.yaml", "-o", "/tmp/out", "-q", "ai"]);

        assert_eq!(cli.config.as_deref(), Some("/tmp/config.yaml"));
        assert_eq!(cli.output_dir.as_deref(), Some("/tmp/out"));
        assert_eq!(cli.queries, vec!["ai"]);
    }

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let cli = Cli::parse_from(&[
            "news_harvest",
            "--concurrency",
            "0",
            "--solver-url",
            "http://localhost:8191",
            "--top-n",
            "5",
        ]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.pipeline.concurrency, 1);
        assert_eq!(config.retrieval.solver_url.as_deref(), Some("http://localhost:8191"));
        assert_eq!(config.search.top_n, Some(5));
        assert_eq!(config.search.queries, Config::default().search.queries);
        assert_eq!(config.output.output_dir, "./output");
    }
}
