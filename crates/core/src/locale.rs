//! Locale-specific literals used by the heuristics.
//!
//! Adding a language for explicit slide markers means adding a row here;
//! the marker regex is built from this table.

use regex::Regex;
use std::sync::LazyLock;

/// Words that introduce an explicit slide marker, by language.
pub const SLIDE_MARKER_KEYWORDS: &[(&str, &str)] = &[
    ("en", "slide"),
    ("ru", "слайд"),
    ("es", "diapositiva"),
    ("de", "folie"),
    ("fr", "diapo"),
];

/// Matches a line opening with a slide marker: keyword, number, then an
/// optional title on the same line.
pub static SLIDE_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let keywords = SLIDE_MARKER_KEYWORDS
        .iter()
        .map(|(_, word)| regex::escape(word))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(
        r"(?im)^[ \t]*(?:{keywords})[ \t]*(\d+)\b[ \t]*[.:\-–—]?[ \t]*([^\n]*)$"
    ))
    .unwrap()
});

/// Language code of the keyword a marker line uses, if any.
pub fn marker_language(line: &str) -> Option<&'static str> {
    let lower = line.trim_start().to_lowercase();
    SLIDE_MARKER_KEYWORDS
        .iter()
        .find(|(_, word)| lower.starts_with(word))
        .map(|(lang, _)| *lang)
}
