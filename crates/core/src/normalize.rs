//! Text normalization for paragraph matching.
//!
//! Locators compare paragraph text after NFC composition and trimming, so
//! a suggestion that copied text through a different Unicode form still
//! matches the live paragraph.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex matching every kind of line break a paragraph can carry.
static LINE_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n\u{000B}\u{2028}\u{2029}]+").unwrap());

/// How an expected text is compared against a paragraph's current text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Normalized texts must be equal.
    #[default]
    Exact,
    /// The normalized expected text must occur inside the current text.
    Contains,
}

/// Normalize text for comparison: NFC composition, then trim.
pub fn normalize_text(text: &str) -> String {
    text.nfc().collect::<String>().trim().to_string()
}

/// Whether the text is empty once trimmed.
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Trim and remove every line break.
pub fn single_line(text: &str) -> String {
    LINE_BREAK_REGEX.replace_all(text.trim(), "").into_owned()
}

/// Check `current` against an expected text.
///
/// An empty (after normalization) expectation accepts anything.
pub fn text_matches(current: &str, expected: &str, mode: MatchMode) -> bool {
    let expected = normalize_text(expected);
    if expected.is_empty() {
        return true;
    }
    let current = normalize_text(current);
    match mode {
        MatchMode::Exact => current == expected,
        MatchMode::Contains => current.contains(&expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_trims_and_composes() {
        assert_eq!(normalize_text("  Draft \n"), "Draft");
        // "e" + combining acute composes to a single code point
        assert_eq!(normalize_text("Caf\u{0065}\u{0301}"), "Caf\u{00E9}");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank(" \t\n"));
        assert!(!is_blank(" x "));
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line(" Quarterly\nResults "), "QuarterlyResults");
        assert_eq!(single_line("A\r\nB\u{000B}C"), "ABC");
        assert_eq!(single_line("Already one line"), "Already one line");
    }

    #[test]
    fn test_text_matches_exact() {
        assert!(text_matches(" first point ", "first point", MatchMode::Exact));
        assert!(!text_matches("first point!", "first point", MatchMode::Exact));
        assert!(text_matches("anything", "   ", MatchMode::Exact));
    }

    #[test]
    fn test_text_matches_contains() {
        assert!(text_matches("Revenue grew 10%", "grew", MatchMode::Contains));
        assert!(!text_matches("Revenue grew 10%", "fell", MatchMode::Contains));
    }
}
