//! Normalization of extracted text into paragraph-separated prose.

/// Paragraphs at or below this many characters are treated as navigation,
/// captions or bylines and dropped.
pub const MIN_PARAGRAPH_CHARS: usize = 30;

const SEPARATOR: &str = "\n\n";

/// Clean raw joined text.
///
/// Lines are trimmed and empty lines dropped, each surviving line becomes a
/// paragraph, and paragraphs of [`MIN_PARAGRAPH_CHARS`] characters or fewer
/// are removed. The output is joined with blank lines and is stable under
/// re-application.
pub fn clean_text(text: &str) -> String {
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(SEPARATOR);

    joined
        .split(SEPARATOR)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_A: &str = "The health department announced a new telehealth program today.";
    const LONG_B: &str = "Clinicians across the state will gain access to the platform next year.";

    #[test]
    fn test_drops_short_lines_and_blank_lines() {
        let raw = format!("  {LONG_A}  \n\n\nShare\nMenu\n\t{LONG_B}\n");
        assert_eq!(clean_text(&raw), format!("{LONG_A}\n\n{LONG_B}"));
    }

    #[test]
    fn test_idempotent() {
        let raw = format!("Home\n{LONG_A}\r\n  \n{LONG_B}\nby staff");
        let once = clean_text(&raw);
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn test_thirty_chars_exactly_is_dropped() {
        let thirty = "a".repeat(30);
        let thirty_one = "b".repeat(31);
        let raw = format!("{thirty}\n{thirty_one}");
        assert_eq!(clean_text(&raw), thirty_one);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 20 chars of 2-byte text is still short
        let accented = "é".repeat(20);
        assert_eq!(clean_text(&accented), "");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("\n\n  \n"), "");
    }

    #[test]
    fn test_output_has_no_outer_whitespace() {
        let raw = format!("\n\n   {LONG_A}   \n\n");
        let cleaned = clean_text(&raw);
        assert_eq!(cleaned, cleaned.trim());
        for paragraph in cleaned.split("\n\n") {
            assert!(paragraph.chars().count() > MIN_PARAGRAPH_CHARS);
        }
    }
}
