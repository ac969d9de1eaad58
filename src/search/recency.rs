//! Publish-date parsing and the recency cutoff.
//!
//! Feeds disagree about date formats, so parsing walks an ordered list of
//! formats and takes the first that fits. Anything that still does not parse
//! is kept: losing a real article to an odd date string is worse than
//! keeping one that turns out to be old.

use crate::models::ArticleReference;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%b %d, %Y", "%B %d, %Y", "%d %B %Y"];

static RELATIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+)\s+(minute|min|hour|day|week)s?\s+ago$").unwrap()
});

/// Parse a backend date string. `now` anchors relative forms like "3 hours ago".
pub fn parse_published(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
        }
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        return s.parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0));
    }
    if let Some(caps) = RELATIVE.captures(s) {
        let n: i64 = caps[1].parse().ok()?;
        // Out-of-range counts fail open like any other unparseable date
        let delta = match caps[2].to_lowercase().as_str() {
            "minute" | "min" => Duration::try_minutes(n),
            "hour" => Duration::try_hours(n),
            "day" => Duration::try_days(n),
            _ => Duration::try_weeks(n),
        }?;
        return now.checked_sub_signed(delta);
    }

    None
}

/// Keep items published within the last `days` days, plus any whose date
/// cannot be parsed. `None` disables the filter.
pub fn filter_recent(
    items: Vec<ArticleReference>,
    days: Option<u32>,
    now: DateTime<Utc>,
) -> Vec<ArticleReference> {
    let Some(days) = days else {
        return items;
    };
    // A window reaching past the representable range has no cutoff
    let Some(cutoff) = Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d))
    else {
        return items;
    };

    items
        .into_iter()
        .filter(|item| match parse_published(&item.published, now) {
            Some(published) => published >= cutoff,
            None => {
                debug!(published = %item.published, link = %item.link, "Unparseable date; keeping item");
                true
            }
        })
        .collect()
}
