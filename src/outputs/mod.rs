//! Report writers for processed articles.
//!
//! # Submodules
//!
//! - [`json`]: Writes the `DigestRecord` list as a JSON array
//! - [`markdown`]: Renders the same records as a readable Markdown report
//!
//! # Output Structure
//!
//! Both files share a stem and a local timestamp, so one run never
//! overwrites another:
//!
//! ```text
//! output_dir/
//! ├── digital_health_news_20250614_093000.json
//! └── digital_health_news_20250614_093000.md
//! ```

pub mod json;
pub mod markdown;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for both reports; created and checked at start-up.
    pub output_dir: String,
    /// File name prefix, followed by the run timestamp.
    pub file_stem: String,
    /// Top-level heading of the Markdown report.
    pub title: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: "./output".to_string(),
            file_stem: "digital_health_news".to_string(),
            title: "Digital Health News Summary".to_string(),
        }
    }
}

impl OutputConfig {
    /// `{output_dir}/{file_stem}_{YYYYmmdd_HHMMSS}.{extension}`
    pub fn report_path<Tz>(&self, at: &DateTime<Tz>, extension: &str) -> PathBuf
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        PathBuf::from(&self.output_dir).join(format!(
            "{}_{}.{}",
            self.file_stem,
            at.format("%Y%m%d_%H%M%S"),
            extension
        ))
    }
}
