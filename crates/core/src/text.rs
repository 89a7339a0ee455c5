//! Small text predicates shared by the detector and the classifier.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::ListKind;

/// Numbered list marker: `1.`, `2)`, `3:` followed by whitespace.
static NUMBERED_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[.):]\s+(.+)$").unwrap());

/// Bullet list marker: `-`, `•`, `*`, en dash or em dash followed by whitespace.
static BULLET_MARKER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[•\-*–—]\s+(.+)$").unwrap());

/// Markdown header prefix, one to three `#`.
static MARKDOWN_HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(#{1,3})\s+(.+)$").unwrap());

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of Unicode scalar values in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// If `line` starts with a list marker, return the kind and the item text.
pub fn list_marker(line: &str) -> Option<(ListKind, &str)> {
    if let Some(caps) = NUMBERED_MARKER_REGEX.captures(line) {
        return caps.get(1).map(|m| (ListKind::Numbered, m.as_str().trim()));
    }
    BULLET_MARKER_REGEX
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (ListKind::Bullet, m.as_str().trim()))
}

/// Whether `line` starts with any list marker.
pub fn is_list_item(line: &str) -> bool {
    list_marker(line).is_some()
}

/// If `line` is a markdown header, return its level and text.
pub fn markdown_header(line: &str) -> Option<(u8, &str)> {
    let caps = MARKDOWN_HEADER_REGEX.captures(line)?;
    let level = caps.get(1)?.as_str().len() as u8;
    Some((level, caps.get(2)?.as_str().trim()))
}

/// Strip a markdown header prefix if present.
pub fn strip_markdown_header(line: &str) -> &str {
    markdown_header(line).map(|(_, text)| text).unwrap_or(line)
}

/// Whether every cased letter is uppercase and there is at least one letter.
pub fn is_all_caps(text: &str) -> bool {
    let mut has_letter = false;
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        has_letter = true;
        if c.is_lowercase() {
            return false;
        }
    }
    has_letter
}

/// Capitalize the first letter of each word and lowercase the rest.
pub fn to_title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Whether a line could plausibly stand alone as a slide title: short, not a
/// sentence, not a list item.
pub fn is_title_like(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && char_len(line) <= 100
        && !line.ends_with(['.', ':', ';', ','])
        && !is_list_item(line)
}

/// Whether strictly more than half of the words start with an uppercase letter.
pub fn is_heading_cased(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return false;
    }
    let capitalized = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();
    capitalized * 2 > words.len()
}
