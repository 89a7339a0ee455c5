//! Domain types flowing through the structuring pipeline.
//!
//! Raw input ([`RawBlock`], [`SlideDraft`], [`ExtractedPresentation`]),
//! classified content ([`ContentElement`]) and the designed output
//! ([`StyledElement`], [`DesignedSlide`], [`DesignedPresentation`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of input handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Structured extraction JSON ([`ExtractedPresentation`]).
    Extraction,
    /// Raw pasted text.
    Text,
}

impl InputFormat {
    /// Detect format from file extension. Unknown extensions are raw text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pptx" => Self::Pptx,
            "json" => Self::Extraction,
            _ => Self::Text,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        None
    }
}

/// Placeholder type reported by the extraction source for a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceholderHint {
    Title,
    CenteredTitle,
    Subtitle,
    Body,
    Footer,
}

impl PlaceholderHint {
    /// Map an extraction placeholder name (`TITLE`, `ctrTitle`, ...) to a hint.
    pub fn from_placeholder_type(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TITLE" => Some(Self::Title),
            "CENTERED_TITLE" | "CTRTITLE" => Some(Self::CenteredTitle),
            "SUBTITLE" => Some(Self::Subtitle),
            "BODY" | "OBJECT" => Some(Self::Body),
            "FOOTER" | "FTR" => Some(Self::Footer),
            _ => None,
        }
    }

    /// The role a block with this hint is forced to, if any.
    pub fn forced_role(self) -> Option<Role> {
        match self {
            Self::Title | Self::CenteredTitle => Some(Role::Title),
            Self::Subtitle => Some(Role::Subtitle),
            Self::Footer => Some(Role::Footer),
            Self::Body => None,
        }
    }
}

/// An opaque unit of text supplied by the extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    /// Text content, possibly spanning several lines.
    pub text: String,

    /// Placeholder the text came from, when known.
    pub hint: Option<PlaceholderHint>,

    /// Vertical offset on the source slide, when known.
    pub position_y: Option<f64>,
}

impl RawBlock {
    /// Create a block of plain text with no extraction metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hint: None,
            position_y: None,
        }
    }

    /// Create a block carrying a placeholder hint and vertical position.
    pub fn with_hint(text: impl Into<String>, hint: Option<PlaceholderHint>, y: Option<f64>) -> Self {
        Self {
            text: text.into(),
            hint,
            position_y: y,
        }
    }

    /// Non-empty trimmed lines of this block.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines().map(str::trim).filter(|l| !l.is_empty())
    }
}

/// What boundary detection concluded about a slide's title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleCandidate {
    /// The detector had no opinion; the classifier decides.
    Unresolved,
    /// The detector picked this line as the title.
    Found(String),
    /// The detector decided the slide has no title.
    Absent,
}

/// The text attributed to one slide before styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideDraft {
    /// 1-based position of this slide in the output.
    pub number: usize,

    /// Slide number as written in the source marker, if there was one.
    pub source_label: Option<String>,

    /// Title decision made during boundary detection.
    pub title: TitleCandidate,

    /// Body blocks in reading order.
    pub blocks: Vec<RawBlock>,
}

impl SlideDraft {
    /// Create an empty draft with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            source_label: None,
            title: TitleCandidate::Unresolved,
            blocks: Vec::new(),
        }
    }

    /// Set the title candidate.
    pub fn with_title(mut self, title: TitleCandidate) -> Self {
        self.title = title;
        self
    }

    /// Set the source marker label.
    pub fn with_source_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    /// Add one block per line of `text`.
    pub fn add_lines(&mut self, text: &str) {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.blocks.push(RawBlock::new(line));
        }
    }

    /// Add a block.
    pub fn add_block(&mut self, block: RawBlock) {
        self.blocks.push(block);
    }

    /// Sort blocks top-to-bottom. Blocks without a position keep their place
    /// relative to each other and go last.
    pub fn sort_by_position(&mut self) {
        self.blocks.sort_by(|a, b| match (a.position_y, b.position_y) {
            (Some(ya), Some(yb)) => ya.partial_cmp(&yb).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    /// Whether the draft carries no text at all.
    pub fn is_empty(&self) -> bool {
        let has_title = matches!(&self.title, TitleCandidate::Found(t) if !t.trim().is_empty());
        !has_title && self.blocks.iter().all(|b| b.lines().next().is_none())
    }

    /// The title text, if one was found.
    pub fn title_text(&self) -> Option<&str> {
        match &self.title {
            TitleCandidate::Found(t) => Some(t.as_str()),
            _ => None,
        }
    }

    /// All body lines, flattened across blocks.
    pub fn body_lines(&self) -> Vec<&str> {
        self.blocks.iter().flat_map(RawBlock::lines).collect()
    }
}

/// Semantic category of a piece of slide text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Title,
    Subtitle,
    Heading,
    Body,
    BulletList,
    NumberedList,
    Footer,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 7] = [
        Role::Title,
        Role::Subtitle,
        Role::Heading,
        Role::Body,
        Role::BulletList,
        Role::NumberedList,
        Role::Footer,
    ];

    /// Key used for this role in template typography and layout tables.
    pub fn key(self) -> &'static str {
        match self {
            Role::Title => "title",
            Role::Subtitle => "subtitle",
            Role::Heading => "heading",
            Role::Body => "body",
            Role::BulletList => "bullet_list",
            Role::NumberedList => "numbered_list",
            Role::Footer => "footer",
        }
    }

    /// Whether this role holds list items.
    pub fn is_list(self) -> bool {
        matches!(self, Role::BulletList | Role::NumberedList)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which bullet preset a renderer should use for a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    Bullet,
    Numbered,
}

impl ListKind {
    /// The list role matching this kind.
    pub fn role(self) -> Role {
        match self {
            ListKind::Bullet => Role::BulletList,
            ListKind::Numbered => Role::NumberedList,
        }
    }
}

/// An inline formatting span over plain text.
///
/// Offsets count Unicode scalar values; `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: usize,
    pub end: usize,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Segment {
    /// A bold span.
    pub fn bold(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            bold: true,
            italic: false,
            underline: false,
        }
    }

    /// Same span moved right by `offset` characters.
    pub fn shifted(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
            ..self
        }
    }
}

/// A classified, formatted piece of slide content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentElement {
    pub role: Role,

    /// Marker-free text. List items are joined with `\n`.
    pub text: String,

    pub formatting_segments: Vec<Segment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_kind: Option<ListKind>,

    /// Markdown header depth (1-3) for headings that came from `#` prefixes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,

    /// A colon label directly followed by a confirmed list.
    #[serde(default)]
    pub opens_list: bool,
}

/// Absolute placement of an element on the slide, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A non-fatal problem recorded against a styled element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementWarning {
    /// The content needs more vertical room than its layout box has left.
    #[serde(rename_all = "camelCase")]
    BoundaryViolation {
        required_height: f64,
        available_height: f64,
    },

    /// Text color does not stand out enough from the background.
    #[serde(rename_all = "camelCase")]
    LowContrast {
        ratio: f64,
        minimum: f64,
        foreground: String,
        background: String,
    },
}

/// A fully styled and positioned element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyledElement {
    pub role: Role,
    pub text: String,
    pub formatting_segments: Vec<Segment>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_kind: Option<ListKind>,

    pub font: String,
    pub size: f64,
    pub bold: bool,
    pub color: String,
    pub line_height: f64,
    pub position: Position,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ElementWarning>,
}

/// The kind of slide resolved from the roles it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlideKind {
    TitleSlide,
    ContentSlide,
    Section,
}

impl SlideKind {
    /// Canonical layout name for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            SlideKind::TitleSlide => "title_slide",
            SlideKind::ContentSlide => "content_slide",
            SlideKind::Section => "section",
        }
    }
}

/// One designed slide, in the same position as its draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignedSlide {
    /// 1-based position in the presentation.
    pub number: usize,

    /// Template layout variant used for this slide.
    pub layout_type: String,

    pub slide_kind: SlideKind,

    /// Background color the slide is drawn on.
    pub background: String,

    pub styled_elements: Vec<StyledElement>,
}

impl DesignedSlide {
    /// Number of warnings on this slide.
    pub fn warning_count(&self) -> usize {
        self.styled_elements.iter().map(|e| e.warnings.len()).sum()
    }
}

/// Per-slide warning counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationReport {
    pub boundary_violations: usize,
    pub contrast_warnings: usize,

    /// Slide numbers with at least one warning.
    pub slides_with_warnings: Vec<usize>,
}

/// The final output handed to the presentation generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignedPresentation {
    pub template_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presentation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    pub designed_slides: Vec<DesignedSlide>,

    pub report: PresentationReport,
}

/// Structured extraction of a presentation (Input A).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPresentation {
    #[serde(default)]
    pub presentation_id: Option<String>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub slides: Vec<ExtractedSlide>,
}

impl ExtractedPresentation {
    /// Create an empty extraction.
    pub fn new(presentation_id: Option<String>, title: Option<String>) -> Self {
        Self {
            presentation_id,
            title,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the extraction.
    pub fn add_slide(&mut self, slide: ExtractedSlide) {
        self.slides.push(slide);
    }
}

/// One slide of a structured extraction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSlide {
    pub index: usize,

    #[serde(default)]
    pub raw_elements: Vec<RawElement>,
}

impl ExtractedSlide {
    /// Create a slide with the given 0-based index.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            raw_elements: Vec::new(),
        }
    }

    /// Sort elements top-to-bottom.
    pub fn sort_by_position(&mut self) {
        self.raw_elements.sort_by(|a, b| {
            a.position_y
                .partial_cmp(&b.position_y)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// A text element as reported by the extraction source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawElement {
    #[serde(rename = "type", default = "default_element_type")]
    pub element_type: String,

    pub content: String,

    #[serde(default)]
    pub object_id: String,

    #[serde(default)]
    pub position_y: f64,

    #[serde(default)]
    pub placeholder_type: String,
}

fn default_element_type() -> String {
    "TEXT".to_string()
}

impl RawElement {
    /// Create a text element.
    pub fn text(content: impl Into<String>, position_y: f64, placeholder_type: impl Into<String>) -> Self {
        Self {
            element_type: default_element_type(),
            content: content.into(),
            object_id: String::new(),
            position_y,
            placeholder_type: placeholder_type.into(),
        }
    }
}
