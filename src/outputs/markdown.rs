//! Markdown report output.
//!
//! ```text
//! # Digital Health News Summary
//!
//! ## Article 1
//!
//! **Title:** ...
//!
//! **Summary:** ...
//! ```

use crate::models::DigestRecord;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Render the records under a single `# {title}` heading.
pub fn records_to_markdown(title: &str, records: &[DigestRecord]) -> String {
    let mut md = String::new();
    writeln!(md, "# {}\n", title).unwrap();

    if records.is_empty() {
        writeln!(md, "_No articles found._").unwrap();
        return md;
    }

    for (i, record) in records.iter().enumerate() {
        writeln!(md, "## Article {}\n", i + 1).unwrap();
        writeln!(md, "**Title:** {}\n", record.Title).unwrap();
        writeln!(md, "**Summary:** {}\n", record.Summary).unwrap();
        writeln!(md, "**Link:** <{}>\n", record.Link).unwrap();
        writeln!(md, "**Date:** {}\n", record.Date).unwrap();
    }
    md
}

#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records(
    title: &str,
    records: &[DigestRecord],
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    fs::write(path, records_to_markdown(title, records)).await?;
    info!("Wrote Markdown report");
    Ok(())
}
