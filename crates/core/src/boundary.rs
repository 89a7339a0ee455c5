//! Slide boundary detection.
//!
//! Splits an undifferentiated text blob into [`SlideDraft`]s. Three
//! strategies are tried in order and the first one that finds anything wins;
//! their results are never merged.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

use crate::config::EngineConfig;
use crate::locale::{marker_language, SLIDE_MARKER_REGEX};
use crate::text::{is_heading_cased, is_list_item, is_title_like, markdown_header, word_count};
use crate::types::{SlideDraft, TitleCandidate};

/// A line holding nothing but a number, closing the slide above it.
static NUMBER_AFTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\n(\d+)\s*$").unwrap());

/// One or more blank lines between paragraphs.
static PARAGRAPH_BREAK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// A numbered section header such as `2. Results`.
static NUMBERED_HEADER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s").unwrap());

/// A way of finding slide boundaries in raw text.
pub trait BoundaryStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Split `text` into drafts, or return `None` when this strategy does
    /// not recognise the text.
    fn detect(&self, text: &str) -> Option<Vec<SlideDraft>>;
}

/// Normalize line endings and Unicode composition before detection.
pub fn normalize_input(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n").nfc().collect()
}

fn non_empty_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

/// Slides separated by a bare number on its own line after their content.
///
/// ```text
/// Q4 Review
/// 1
///
/// Details here
/// 2
/// ```
#[derive(Debug, Clone, Default)]
pub struct NumberAfterStrategy;

impl NumberAfterStrategy {
    /// Build a draft from the text between two markers.
    ///
    /// The first line is taken as the title when it reads like one. A lone
    /// line must also be heading-cased, since a single sentence-case
    /// fragment is more likely body text.
    fn draft_from_span(number: usize, span: &str, label: Option<&str>) -> SlideDraft {
        let lines = non_empty_lines(span);
        let mut draft = SlideDraft::new(number);
        if let Some(label) = label {
            draft = draft.with_source_label(label);
        }

        let Some(first) = lines.first() else {
            return draft.with_title(TitleCandidate::Absent);
        };

        let titled = is_title_like(first) && (lines.len() > 1 || is_heading_cased(first));
        if titled {
            draft.title = TitleCandidate::Found(first.to_string());
            for line in &lines[1..] {
                draft.add_lines(line);
            }
        } else {
            draft.title = TitleCandidate::Absent;
            for line in &lines {
                draft.add_lines(line);
            }
        }
        draft
    }
}

impl BoundaryStrategy for NumberAfterStrategy {
    fn name(&self) -> &'static str {
        "number-after"
    }

    fn detect(&self, text: &str) -> Option<Vec<SlideDraft>> {
        let markers: Vec<_> = NUMBER_AFTER_REGEX.captures_iter(text).collect();
        if markers.is_empty() {
            return None;
        }

        let mut drafts = Vec::new();
        let mut previous_end = 0;

        for caps in &markers {
            let whole = caps.get(0)?;
            let content = text[previous_end..whole.start()].trim();
            if !content.is_empty() {
                let label = caps.get(1).map(|m| m.as_str());
                drafts.push(Self::draft_from_span(drafts.len() + 1, content, label));
            }
            previous_end = whole.end();
        }

        // Trailing text without a closing number
        let remaining = text[previous_end..].trim();
        if !remaining.is_empty() {
            drafts.push(Self::draft_from_span(drafts.len() + 1, remaining, None));
        }

        Some(drafts)
    }
}

/// Slides introduced by a "Slide N" line in any configured language.
#[derive(Debug, Clone, Default)]
pub struct ExplicitMarkerStrategy;

impl BoundaryStrategy for ExplicitMarkerStrategy {
    fn name(&self) -> &'static str {
        "explicit-marker"
    }

    fn detect(&self, text: &str) -> Option<Vec<SlideDraft>> {
        let markers: Vec<_> = SLIDE_MARKER_REGEX.captures_iter(text).collect();
        let first = markers.first()?.get(0)?;

        let mut drafts = Vec::new();

        let preamble = text[..first.start()].trim();
        if !preamble.is_empty() {
            log::debug!("Keeping {} bytes of text before the first slide marker", preamble.len());
            let mut draft = SlideDraft::new(1);
            draft.add_lines(preamble);
            drafts.push(draft);
        }

        for (i, caps) in markers.iter().enumerate() {
            let whole = caps.get(0)?;
            let content_end = markers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map(|m| m.start())
                .unwrap_or(text.len());

            let mut draft = SlideDraft::new(drafts.len() + 1);
            if let Some(label) = caps.get(1) {
                draft = draft.with_source_label(label.as_str());
            }
            let inline_title = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
            if !inline_title.is_empty() {
                draft.title = TitleCandidate::Found(inline_title.to_string());
            }
            draft.add_lines(&text[whole.end()..content_end]);

            log::trace!(
                "Slide marker ({}) opens draft {}",
                marker_language(whole.as_str()).unwrap_or("?"),
                draft.number
            );
            drafts.push(draft);
        }

        Some(drafts)
    }
}

/// Fallback: group blank-line separated paragraphs into slides.
#[derive(Debug, Clone)]
pub struct BlockAnalysisStrategy {
    title_max_words: usize,
}

impl Default for BlockAnalysisStrategy {
    fn default() -> Self {
        Self {
            title_max_words: EngineConfig::default().title_max_words,
        }
    }
}

/// Slide under construction while walking paragraphs.
#[derive(Debug, Default)]
struct PendingSlide {
    title: Option<String>,
    lines: Vec<String>,
}

impl PendingSlide {
    fn into_draft(self, number: usize) -> SlideDraft {
        let title = match self.title {
            Some(t) => TitleCandidate::Found(t),
            None => TitleCandidate::Unresolved,
        };
        let mut draft = SlideDraft::new(number).with_title(title);
        for line in &self.lines {
            draft.add_lines(line);
        }
        draft
    }
}

impl BlockAnalysisStrategy {
    /// Create the strategy with a custom title word limit.
    pub fn new(title_max_words: usize) -> Self {
        Self { title_max_words }
    }

    /// A paragraph opening with a markdown header, or consisting of a
    /// single numbered header line, always starts a new slide.
    fn is_slide_start(lines: &[&str]) -> bool {
        let first = lines[0];
        markdown_header(first).is_some()
            || (lines.len() == 1 && NUMBERED_HEADER_REGEX.is_match(first))
    }

    /// The paragraph's first line, if it is short enough to be a title.
    fn title_line<'a>(&self, lines: &[&'a str]) -> Option<&'a str> {
        let first = lines[0];
        if word_count(first) > self.title_max_words {
            return None;
        }
        if is_list_item(first) && !Self::is_slide_start(lines) {
            return None;
        }
        Some(first)
    }
}

impl BoundaryStrategy for BlockAnalysisStrategy {
    fn name(&self) -> &'static str {
        "block-analysis"
    }

    fn detect(&self, text: &str) -> Option<Vec<SlideDraft>> {
        let mut slides: Vec<PendingSlide> = Vec::new();
        let mut current: Option<PendingSlide> = None;

        for paragraph in PARAGRAPH_BREAK_REGEX.split(text) {
            let lines = non_empty_lines(paragraph);
            if lines.is_empty() {
                continue;
            }

            let title_line = self.title_line(&lines);
            let starts_new = match &current {
                None => true,
                Some(slide) => {
                    Self::is_slide_start(&lines)
                        || (title_line.is_some() && slide.title.is_some() && !slide.lines.is_empty())
                }
            };
            if starts_new {
                slides.extend(current.take());
            }
            let slide = current.get_or_insert_with(PendingSlide::default);

            match title_line {
                Some(title) if slide.title.is_none() => {
                    slide.title = Some(title.to_string());
                    slide.lines.extend(lines[1..].iter().map(|l| l.to_string()));
                }
                _ => slide.lines.extend(lines.iter().map(|l| l.to_string())),
            }
        }
        slides.extend(current);

        let drafts: Vec<SlideDraft> = slides
            .into_iter()
            .enumerate()
            .map(|(i, slide)| slide.into_draft(i + 1))
            .collect();

        if drafts.is_empty() {
            None
        } else {
            Some(drafts)
        }
    }
}

/// Runs boundary strategies in order and returns the first non-empty result.
pub struct BoundaryDetector {
    strategies: Vec<Box<dyn BoundaryStrategy>>,
}

impl BoundaryDetector {
    /// The standard strategy order: number-after, explicit marker, block analysis.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            strategies: vec![
                Box::new(NumberAfterStrategy),
                Box::new(ExplicitMarkerStrategy),
                Box::new(BlockAnalysisStrategy::new(config.title_max_words)),
            ],
        }
    }

    /// Use a custom ordered list of strategies.
    pub fn with_strategies(strategies: Vec<Box<dyn BoundaryStrategy>>) -> Self {
        Self { strategies }
    }

    /// Split raw text into slide drafts. Never fails; text without content
    /// yields no drafts.
    pub fn detect(&self, raw_text: &str) -> Vec<SlideDraft> {
        let text = normalize_input(raw_text);
        if text.trim().is_empty() {
            return Vec::new();
        }

        for strategy in &self.strategies {
            match strategy.detect(&text) {
                Some(drafts) if !drafts.is_empty() => {
                    log::debug!("Strategy '{}' found {} slides", strategy.name(), drafts.len());
                    return drafts;
                }
                _ => log::trace!("Strategy '{}' found nothing", strategy.name()),
            }
        }

        Vec::new()
    }
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> Vec<SlideDraft> {
        BoundaryDetector::default().detect(text)
    }

    #[test]
    fn test_empty_input() {
        assert!(detect("").is_empty());
        assert!(detect("  \n\t\n  ").is_empty());
    }

    #[test]
    fn test_number_after_scenario() {
        let drafts = detect("Q4 Review\n1\n\nDetails here\n2");
        assert_eq!(drafts.len(), 2);

        assert_eq!(drafts[0].number, 1);
        assert_eq!(drafts[0].title, TitleCandidate::Found("Q4 Review".to_string()));
        assert!(drafts[0].body_lines().is_empty());

        assert_eq!(drafts[1].number, 2);
        assert_eq!(drafts[1].title, TitleCandidate::Absent);
        assert_eq!(drafts[1].body_lines(), vec!["Details here"]);
        assert_eq!(drafts[1].source_label.as_deref(), Some("2"));
    }

    #[test]
    fn test_number_after_trailing_text() {
        let drafts = detect("Intro\nWelcome everyone\n1\n\nClosing words");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title_text(), Some("Intro"));
        assert_eq!(drafts[0].body_lines(), vec!["Welcome everyone"]);
        assert_eq!(drafts[1].number, 2);
        assert_eq!(drafts[1].source_label, None);
        assert_eq!(drafts[1].body_lines(), vec!["Closing words"]);
    }

    #[test]
    fn test_number_after_sentence_first_line_has_no_title() {
        let drafts = detect("This opens with a full sentence.\nAnd more.\n1");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, TitleCandidate::Absent);
        assert_eq!(drafts[0].body_lines().len(), 2);
    }

    #[test]
    fn test_explicit_marker_scenario() {
        let drafts = detect("Slide 1 Intro\nSome text\n\nSlide 2\nMore text");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title_text(), Some("Intro"));
        assert_eq!(drafts[0].body_lines(), vec!["Some text"]);
        assert_eq!(drafts[1].title, TitleCandidate::Unresolved);
        assert_eq!(drafts[1].body_lines(), vec!["More text"]);
        assert_eq!(drafts[1].source_label.as_deref(), Some("2"));
    }

    #[test]
    fn test_explicit_marker_russian() {
        let drafts = detect("Слайд 1 Введение\nТекст\n\nслайд 2\nЕщё текст");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title_text(), Some("Введение"));
        assert_eq!(drafts[1].body_lines(), vec!["Ещё текст"]);
    }

    #[test]
    fn test_explicit_marker_keeps_preamble() {
        let drafts = detect("Company overview deck\n\nSlide 1: Start\nBody");
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].body_lines(), vec!["Company overview deck"]);
        assert_eq!(drafts[1].number, 2);
        assert_eq!(drafts[1].title_text(), Some("Start"));
    }

    #[test]
    fn test_block_analysis_single_paragraph() {
        let drafts = detect("First line of text\nsecond line of text\nthird line");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title_text(), Some("First line of text"));
        assert_eq!(drafts[0].body_lines().len(), 2);
    }

    #[test]
    fn test_block_analysis_no_title_match_is_one_draft() {
        let text = "This paragraph opens with a line that has far too many words.\nMore.\n\n\
                    Another paragraph that also opens with a very long first line here.";
        let drafts = detect(text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, TitleCandidate::Unresolved);
        assert_eq!(drafts[0].body_lines().len(), 3);
    }

    #[test]
    fn test_block_analysis_short_paragraph_after_body_starts_slide() {
        let text = "Overview\nWe grew in every region this year.\n\nNext Steps\nHire two engineers.";
        let drafts = detect(text);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title_text(), Some("Overview"));
        assert_eq!(drafts[1].title_text(), Some("Next Steps"));
        assert_eq!(drafts[1].body_lines(), vec!["Hire two engineers."]);
    }

    #[test]
    fn test_block_analysis_title_then_body_paragraph() {
        let drafts = detect("Q4 Review\n\nDetails here");
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title_text(), Some("Q4 Review"));
        assert_eq!(drafts[0].body_lines(), vec!["Details here"]);
    }

    #[test]
    fn test_block_analysis_markdown_headers_split() {
        let text = "# Intro\nHello there\n\n# Plan\nStep one";
        let drafts = detect(text);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title_text(), Some("# Intro"));
        assert_eq!(drafts[1].title_text(), Some("# Plan"));
    }

    #[test]
    fn test_block_analysis_list_paragraph_stays_on_slide() {
        let text = "Goals\nWhat we want to reach this year\n\n1. Grow\n2. Hire\n3. Ship";
        let drafts = detect(text);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].body_lines().len(), 4);
    }

    #[test]
    fn test_crlf_input() {
        let drafts = detect("Q4 Review\r\n1\r\n\r\nDetails here\r\n2");
        assert_eq!(drafts.len(), 2);
    }

    struct Never;

    impl BoundaryStrategy for Never {
        fn name(&self) -> &'static str {
            "never"
        }

        fn detect(&self, _text: &str) -> Option<Vec<SlideDraft>> {
            Some(Vec::new())
        }
    }

    #[test]
    fn test_empty_strategy_result_falls_through() {
        let detector = BoundaryDetector::with_strategies(vec![
            Box::new(Never),
            Box::new(BlockAnalysisStrategy::default()),
        ]);
        let drafts = detector.detect("Just one line");
        assert_eq!(drafts.len(), 1);
    }
}
