//! Tunable thresholds for the structuring heuristics and layout.
//!
//! Every number the classifier, detector and layout engine compare against
//! lives here so that callers can adjust them without touching the rules.

use serde::{Deserialize, Serialize};

/// Engine configuration.
///
/// Missing fields fall back to their defaults when deserialized, so a config
/// file only needs to list the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// A line with at most this many words may become a title.
    pub title_max_words: usize,

    /// A line with at least this many words is always a body paragraph.
    pub paragraph_min_words: usize,

    /// Consecutive marker lines needed to confirm a list.
    pub list_min_run: usize,

    /// The last element of a slide is a footer when shorter than this.
    pub footer_max_chars: usize,

    /// Minimum length of an ALL-CAPS heading.
    pub all_caps_min_chars: usize,

    /// Maximum length of an ALL-CAPS heading.
    pub all_caps_max_chars: usize,

    /// Promote a short line following the title on the first slide to a subtitle.
    pub detect_subtitles: bool,

    /// Vertical gap between elements stacked in the same layout box (points).
    pub element_spacing: f64,

    /// Average glyph width as a fraction of the font size.
    pub avg_char_width: f64,

    /// Line height multiplier used when typography does not specify one.
    pub default_line_height: f64,

    /// Points taken off the body size when a list inherits body typography.
    pub list_size_reduction: f64,

    /// Lists inheriting body typography are not reduced below this size.
    pub min_list_font_size: f64,

    /// Minimum acceptable text/background contrast ratio.
    pub min_contrast_ratio: f64,

    /// Extracted elements whose top edge lies below this offset (EMU) are footers.
    pub footer_position_threshold: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title_max_words: 6,
            paragraph_min_words: 16,
            list_min_run: 3,
            footer_max_chars: 50,
            all_caps_min_chars: 3,
            all_caps_max_chars: 50,
            detect_subtitles: false,
            element_spacing: 12.0,
            avg_char_width: 0.5,
            default_line_height: 1.2,
            list_size_reduction: 2.0,
            min_list_font_size: 14.0,
            min_contrast_ratio: 4.5,
            footer_position_threshold: Some(4_000_000.0),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum word count of a title line.
    pub fn with_title_max_words(mut self, words: usize) -> Self {
        self.title_max_words = words.max(1);
        self
    }

    /// Set the number of marker lines required to confirm a list.
    pub fn with_list_min_run(mut self, run: usize) -> Self {
        self.list_min_run = run.max(1);
        self
    }

    /// Enable or disable first-slide subtitle detection.
    pub fn with_detect_subtitles(mut self, detect: bool) -> Self {
        self.detect_subtitles = detect;
        self
    }

    /// Set the vertical spacing between stacked elements.
    pub fn with_element_spacing(mut self, spacing: f64) -> Self {
        self.element_spacing = spacing.max(0.0);
        self
    }

    /// Set how much smaller lists are than inherited body text. Zero keeps
    /// them at the body size.
    pub fn with_list_size_reduction(mut self, points: f64, floor: f64) -> Self {
        self.list_size_reduction = points.max(0.0);
        self.min_list_font_size = floor.max(0.0);
        self
    }

    /// Set the minimum contrast ratio below which a warning is recorded.
    pub fn with_min_contrast_ratio(mut self, ratio: f64) -> Self {
        self.min_contrast_ratio = ratio.max(1.0);
        self
    }

    /// Set or clear the footer position threshold for extracted elements.
    pub fn with_footer_position_threshold(mut self, threshold: Option<f64>) -> Self {
        self.footer_position_threshold = threshold;
        self
    }
}
