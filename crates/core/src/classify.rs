//! Structural role classification.
//!
//! Every line of a slide draft gets exactly one [`Role`]. List runs are
//! grouped first; everything else goes through an ordered table of rules
//! where the first rule that answers wins. Classification is total: when no
//! specific rule matches, the line is body text.

use crate::config::EngineConfig;
use crate::text::{
    char_len, is_all_caps, list_marker, markdown_header, strip_markdown_header, to_title_case,
    word_count,
};
use crate::types::{ListKind, Role, SlideDraft, TitleCandidate};

/// A line (or grouped list) with its role decided, before inline formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub role: Role,

    /// Display text, still carrying inline emphasis markers.
    pub text: String,

    /// Item texts with list markers removed, for list roles.
    pub list_items: Option<Vec<String>>,

    pub list_kind: Option<ListKind>,

    pub heading_level: Option<u8>,

    /// Colon label rendered in bold.
    pub is_label: bool,

    /// Colon label directly followed by a confirmed list.
    pub opens_list: bool,
}

impl Classified {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            list_items: None,
            list_kind: None,
            heading_level: None,
            is_label: false,
            opens_list: false,
        }
    }
}

/// A single classifiable line.
#[derive(Debug, Clone)]
pub struct Unit {
    pub text: String,

    /// Role imposed by the source (placeholder hint or detected title).
    forced: Option<Role>,

    /// Whether the title rule may fire for this line.
    title_allowed: bool,
}

impl Unit {
    /// A free line that any rule may classify.
    pub fn line(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            forced: None,
            title_allowed: true,
        }
    }
}

/// Position information a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub config: &'a EngineConfig,

    /// 0-based slide position in the presentation.
    pub slide_index: usize,

    /// 0-based position of this element within the slide.
    pub index: usize,

    /// Number of elements on the slide.
    pub total: usize,

    /// Role assigned to the element before this one.
    pub previous: Option<Role>,

    /// Whether the next element is a confirmed list.
    pub next_is_list: bool,
}

impl RuleContext<'_> {
    fn is_first(&self) -> bool {
        self.index == 0
    }

    fn is_last(&self) -> bool {
        self.index + 1 == self.total
    }
}

/// One entry of the ordered rule table.
pub struct Rule {
    pub name: &'static str,
    pub apply: fn(&Unit, &RuleContext) -> Option<Classified>,
}

/// Classification rules in priority order.
pub const RULES: &[Rule] = &[
    Rule {
        name: "markdown-header",
        apply: markdown_header_rule,
    },
    Rule {
        name: "short-first-line-title",
        apply: title_rule,
    },
    Rule {
        name: "first-slide-subtitle",
        apply: subtitle_rule,
    },
    Rule {
        name: "all-caps-heading",
        apply: all_caps_rule,
    },
    Rule {
        name: "colon-label",
        apply: colon_label_rule,
    },
    Rule {
        name: "long-paragraph",
        apply: paragraph_rule,
    },
    Rule {
        name: "trailing-footer",
        apply: footer_rule,
    },
    Rule {
        name: "default-body",
        apply: body_rule,
    },
];

pub fn markdown_header_rule(unit: &Unit, _ctx: &RuleContext) -> Option<Classified> {
    let (level, text) = markdown_header(&unit.text)?;
    let mut classified = Classified::new(Role::Heading, text);
    classified.heading_level = Some(level);
    Some(classified)
}

pub fn title_rule(unit: &Unit, ctx: &RuleContext) -> Option<Classified> {
    (unit.title_allowed && ctx.is_first() && word_count(&unit.text) <= ctx.config.title_max_words)
        .then(|| Classified::new(Role::Title, unit.text.as_str()))
}

pub fn subtitle_rule(unit: &Unit, ctx: &RuleContext) -> Option<Classified> {
    let applies = ctx.config.detect_subtitles
        && ctx.slide_index == 0
        && ctx.index == 1
        && ctx.previous == Some(Role::Title)
        && word_count(&unit.text) <= ctx.config.title_max_words
        && char_len(&unit.text) < 150;
    applies.then(|| Classified::new(Role::Subtitle, unit.text.as_str()))
}

pub fn all_caps_rule(unit: &Unit, ctx: &RuleContext) -> Option<Classified> {
    let len = char_len(&unit.text);
    let applies = (ctx.config.all_caps_min_chars..=ctx.config.all_caps_max_chars).contains(&len)
        && is_all_caps(&unit.text);
    applies.then(|| Classified::new(Role::Heading, to_title_case(&unit.text)))
}

pub fn colon_label_rule(unit: &Unit, ctx: &RuleContext) -> Option<Classified> {
    if !unit.text.ends_with(':') {
        return None;
    }
    let mut classified = Classified::new(Role::Body, unit.text.as_str());
    classified.is_label = true;
    classified.opens_list = ctx.next_is_list;
    Some(classified)
}

pub fn paragraph_rule(unit: &Unit, ctx: &RuleContext) -> Option<Classified> {
    (word_count(&unit.text) >= ctx.config.paragraph_min_words)
        .then(|| Classified::new(Role::Body, unit.text.as_str()))
}

pub fn footer_rule(unit: &Unit, ctx: &RuleContext) -> Option<Classified> {
    // A lone element has nothing above it to be a footer of
    let applies =
        ctx.total >= 2 && ctx.is_last() && char_len(&unit.text) < ctx.config.footer_max_chars;
    applies.then(|| Classified::new(Role::Footer, unit.text.as_str()))
}

pub fn body_rule(unit: &Unit, _ctx: &RuleContext) -> Option<Classified> {
    Some(Classified::new(Role::Body, unit.text.as_str()))
}

/// An element after the list pre-pass.
#[derive(Debug, Clone)]
enum Item {
    /// A line the rule table will classify.
    Line(Unit),
    /// A line whose role is already known.
    Fixed(Classified),
    /// A confirmed list run.
    List(ListKind, Vec<String>),
}

/// Assigns roles to the lines of slide drafts.
#[derive(Debug, Clone, Default)]
pub struct StructuralClassifier {
    config: EngineConfig,
}

impl StructuralClassifier {
    /// Create a classifier with the given thresholds.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Classify a draft. `slide_index` is the 0-based slide position.
    pub fn classify(&self, draft: &SlideDraft, slide_index: usize) -> Vec<Classified> {
        let units = self.units(draft);
        let items = self.group_lists(units);
        self.apply_rules(items, slide_index, draft.number)
    }

    /// Classify free-standing lines as if they formed one slide.
    pub fn classify_lines(&self, lines: &[&str], slide_index: usize) -> Vec<Classified> {
        let units = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(Unit::line)
            .collect();
        let items = self.group_lists(units);
        self.apply_rules(items, slide_index, slide_index + 1)
    }

    /// Flatten a draft into classifiable units.
    fn units(&self, draft: &SlideDraft) -> Vec<Unit> {
        let mut units = Vec::new();

        if let TitleCandidate::Found(title) = &draft.title {
            let title = strip_markdown_header(title.trim());
            if !title.is_empty() {
                units.push(Unit {
                    text: title.to_string(),
                    forced: Some(Role::Title),
                    title_allowed: false,
                });
            }
        }
        let title_allowed = draft.title == TitleCandidate::Unresolved;

        for block in &draft.blocks {
            let forced = block.hint.and_then(|h| h.forced_role());
            if let Some(role) = forced {
                let joined = block.lines().collect::<Vec<_>>().join(" ");
                if !joined.is_empty() {
                    units.push(Unit {
                        text: joined,
                        forced: Some(role),
                        title_allowed: false,
                    });
                }
                continue;
            }

            let block_allows_title = title_allowed && block.hint.is_none();
            units.extend(block.lines().map(|line| Unit {
                text: line.to_string(),
                forced: None,
                title_allowed: block_allows_title,
            }));
        }

        units
    }

    /// Group runs of same-kind list lines. Runs shorter than the configured
    /// minimum stay as plain body text.
    fn group_lists(&self, units: Vec<Unit>) -> Vec<Item> {
        let mut items = Vec::with_capacity(units.len());
        let mut i = 0;

        while i < units.len() {
            let kind = match (&units[i].forced, list_marker(&units[i].text)) {
                (None, Some((kind, _))) => kind,
                _ => {
                    let unit = units[i].clone();
                    items.push(match unit.forced {
                        Some(role) => Item::Fixed(Classified::new(role, unit.text)),
                        None => Item::Line(unit),
                    });
                    i += 1;
                    continue;
                }
            };

            let run_end = units[i..]
                .iter()
                .position(|u| {
                    u.forced.is_some() || list_marker(&u.text).map(|(k, _)| k) != Some(kind)
                })
                .map(|offset| i + offset)
                .unwrap_or(units.len());

            let run = &units[i..run_end];
            if run.len() >= self.config.list_min_run {
                let entries = run
                    .iter()
                    .filter_map(|u| list_marker(&u.text).map(|(_, item)| item.to_string()))
                    .collect();
                items.push(Item::List(kind, entries));
            } else {
                log::debug!("List run of {} lines is too short, keeping as body", run.len());
                items.extend(
                    run.iter()
                        .map(|u| Item::Fixed(Classified::new(Role::Body, u.text.as_str()))),
                );
            }
            i = run_end;
        }

        items
    }

    fn apply_rules(&self, items: Vec<Item>, slide_index: usize, slide_number: usize) -> Vec<Classified> {
        let total = items.len();
        let mut classified: Vec<Classified> = Vec::with_capacity(total);

        for (index, item) in items.iter().enumerate() {
            let next_is_list = matches!(items.get(index + 1), Some(Item::List(..)));
            let element = match item {
                Item::Fixed(fixed) => fixed.clone(),
                Item::List(kind, entries) => {
                    let mut list = Classified::new(kind.role(), entries.join("\n"));
                    list.list_items = Some(entries.clone());
                    list.list_kind = Some(*kind);
                    list
                }
                Item::Line(unit) => {
                    let ctx = RuleContext {
                        config: &self.config,
                        slide_index,
                        index,
                        total,
                        previous: classified.last().map(|c| c.role),
                        next_is_list,
                    };
                    let (rule, element) = RULES
                        .iter()
                        .find_map(|rule| (rule.apply)(unit, &ctx).map(|c| (rule.name, c)))
                        .unwrap_or_else(|| ("default-body", Classified::new(Role::Body, unit.text.as_str())));
                    if rule == "default-body" {
                        log::debug!(
                            "Slide {}: no specific rule matched '{}', using BODY (low confidence)",
                            slide_number,
                            unit.text
                        );
                    } else {
                        log::trace!("Slide {}: rule '{}' -> {:?}", slide_number, rule, element.role);
                    }
                    element
                }
            };
            classified.push(element);
        }

        classified
    }
}
