//! Inline emphasis extraction.
//!
//! Turns `***bold italic***`, `**bold**`, `__underline__`, `*italic*` and
//! `_italic_` markup into plain text plus [`Segment`]s. Longer markers are
//! matched first and their spans are locked, so the `*` inside `**` is never
//! read as italic and segments never overlap.

use regex::Regex;
use std::sync::LazyLock;

use crate::classify::Classified;
use crate::text::char_len;
use crate::types::{ContentElement, Segment};

static BOLD_ITALIC_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*\*([^*\s](?:[^*\n]*?[^*\s])?)\*\*\*").unwrap());

static BOLD_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*](?:.*?[^*])?)\*\*").unwrap());

static UNDERLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"__(.+?)__").unwrap());

static ITALIC_STAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*\n]*?[^*\s])?)\*").unwrap());

static ITALIC_UNDERSCORE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_\s](?:[^_\n]*?[^_\s])?)_").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emphasis {
    BoldItalic,
    Bold,
    Italic,
    Underline,
}

/// A run of text that is either still open for matching or already styled.
#[derive(Debug)]
struct Piece {
    text: String,
    emphasis: Option<Emphasis>,
}

/// Plain text with its formatting spans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedText {
    pub plain: String,
    pub segments: Vec<Segment>,
}

/// Strips emphasis markers and records where they applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineFormatter;

impl InlineFormatter {
    /// Create a new formatter.
    pub fn new() -> Self {
        Self
    }

    /// Convert marked-up text into plain text and formatting segments.
    ///
    /// Segment offsets count characters in the returned plain text.
    pub fn format(&self, text: &str) -> FormattedText {
        let pieces = vec![Piece {
            text: text.to_string(),
            emphasis: None,
        }];

        let pieces = split_pieces(pieces, &BOLD_ITALIC_REGEX, Emphasis::BoldItalic, false);
        let pieces = split_pieces(pieces, &BOLD_REGEX, Emphasis::Bold, false);
        let pieces = split_pieces(pieces, &UNDERLINE_REGEX, Emphasis::Underline, true);
        let pieces = split_pieces(pieces, &ITALIC_STAR_REGEX, Emphasis::Italic, false);
        let pieces = split_pieces(pieces, &ITALIC_UNDERSCORE_REGEX, Emphasis::Italic, true);

        let mut formatted = FormattedText::default();
        let mut offset = 0;
        for piece in pieces {
            let len = char_len(&piece.text);
            if let (Some(emphasis), true) = (piece.emphasis, len > 0) {
                formatted.segments.push(Segment {
                    start: offset,
                    end: offset + len,
                    bold: matches!(emphasis, Emphasis::Bold | Emphasis::BoldItalic),
                    italic: matches!(emphasis, Emphasis::Italic | Emphasis::BoldItalic),
                    underline: emphasis == Emphasis::Underline,
                });
            }
            formatted.plain.push_str(&piece.text);
            offset += len;
        }
        formatted
    }

    /// Format a classified element into its final content form.
    pub fn format_element(&self, classified: &Classified) -> ContentElement {
        let (text, mut segments, list_items) = match &classified.list_items {
            Some(items) => {
                let mut plain_items = Vec::with_capacity(items.len());
                let mut text = String::new();
                let mut segments = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        text.push('\n');
                    }
                    let formatted = self.format(item);
                    let offset = char_len(&text);
                    segments.extend(formatted.segments.iter().map(|s| s.shifted(offset)));
                    text.push_str(&formatted.plain);
                    plain_items.push(formatted.plain);
                }
                (text, segments, Some(plain_items))
            }
            None => {
                let formatted = self.format(&classified.text);
                (formatted.plain, formatted.segments, None)
            }
        };

        if classified.is_label {
            segments = embolden(char_len(&text), &segments);
        }

        ContentElement {
            role: classified.role,
            text,
            formatting_segments: segments,
            list_items,
            list_kind: classified.list_kind,
            heading_level: classified.heading_level,
            opens_list: classified.opens_list,
        }
    }
}

/// Split every unstyled piece on the matches of `regex`, styling the inner
/// capture. With `word_guard`, a match touching a word character on its
/// outer side is left as literal text.
fn split_pieces(pieces: Vec<Piece>, regex: &Regex, emphasis: Emphasis, word_guard: bool) -> Vec<Piece> {
    let mut out = Vec::with_capacity(pieces.len());

    for piece in pieces {
        if piece.emphasis.is_some() {
            out.push(piece);
            continue;
        }

        let text = piece.text;
        let mut last = 0;
        for caps in regex.captures_iter(&text) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if word_guard && touches_word(&text, whole.start(), whole.end()) {
                continue;
            }
            if whole.start() > last {
                out.push(Piece {
                    text: text[last..whole.start()].to_string(),
                    emphasis: None,
                });
            }
            out.push(Piece {
                text: inner.as_str().to_string(),
                emphasis: Some(emphasis),
            });
            last = whole.end();
        }
        if last < text.len() {
            out.push(Piece {
                text: text[last..].to_string(),
                emphasis: None,
            });
        }
    }

    out
}

fn touches_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.is_some_and(char::is_alphanumeric) || after.is_some_and(char::is_alphanumeric)
}

/// Make the whole `0..len` range bold, keeping existing spans and filling
/// the gaps between them.
fn embolden(len: usize, segments: &[Segment]) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len() * 2 + 1);
    let mut cursor = 0;
    for segment in segments {
        if segment.start > cursor {
            out.push(Segment::bold(cursor, segment.start));
        }
        out.push(Segment {
            bold: true,
            ..*segment
        });
        cursor = segment.end;
    }
    if cursor < len {
        out.push(Segment::bold(cursor, len));
    }
    out
}
