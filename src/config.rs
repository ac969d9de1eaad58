//! YAML configuration.
//!
//! Every section and every field is optional; anything missing falls back to
//! the built-in defaults. A minimal file only needs what it changes:
//!
//! ```yaml
//! search:
//!   queries:
//!     - "digital health Australia"
//!   recency_days: 2
//! summarizer:
//!   model: "llama-3.3-70b-versatile"
//! ```

use crate::api::SummarizerConfig;
use crate::classify::DomainClassifier;
use crate::digest::PipelineConfig;
use crate::error::ConfigError;
use crate::extract::ExtractionConfig;
use crate::fetchers::RetrievalConfig;
use crate::outputs::OutputConfig;
use crate::search::SearchConfig;
use crate::search::scoring::ScoringConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub scoring: ScoringConfig,
    pub classifier: DomainClassifier,
    pub extraction: ExtractionConfig,
    pub retrieval: RetrievalConfig,
    pub summarizer: SummarizerConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

impl Config {
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })?;
        info!("Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            r#"
search:
  queries: ["telehealth"]
  recency_days: 3
pipeline:
  concurrency: 4
"#,
        )
        .unwrap();

        assert_eq!(config.search.queries, vec!["telehealth"]);
        assert_eq!(config.search.recency_days, Some(3));
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.pipeline.concurrency, 4);
        assert_eq!(config.pipeline.article_delay_ms, 1000);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("").unwrap(), Config::default());
    }

    #[test]
    fn test_null_recency_disables_filter() {
        let config = Config::from_yaml("search:\n  recency_days: null\n").unwrap();
        assert_eq!(config.search.recency_days, None);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "output:\n  file_stem: health_digest").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.output.file_stem, "health_digest");
        assert_eq!(config.output.title, "Digital Health News Summary");
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            Config::load("/definitely/not/here.yaml"),
            Err(ConfigError::Io { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "search: [not, a, map]").unwrap();
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Yaml { .. })));
    }
}
