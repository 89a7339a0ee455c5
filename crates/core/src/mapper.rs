//! Template mapping: picks a slide layout variant and attaches typography
//! and color to every element.

use std::sync::{Arc, LazyLock};

use crate::config::EngineConfig;
use crate::template::{Template, TypographyRule, FALLBACK_MAPPING_KEY};
use crate::types::{ContentElement, Role, SlideKind};

/// Last resort when neither the template nor the built-in has a body rule.
static FALLBACK_RULE: LazyLock<TypographyRule> = LazyLock::new(|| TypographyRule {
    font: "Arial".to_string(),
    size: 18.0,
    bold: false,
    font_weight: None,
    color: None,
    line_height: None,
});

/// A content element with its typography resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedElement {
    pub content: ContentElement,
    pub font: String,
    pub size: f64,
    pub bold: bool,
    pub color: String,
    pub line_height: f64,
}

/// A slide with its layout variant chosen and its elements styled.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedSlide {
    pub number: usize,
    pub slide_kind: SlideKind,

    /// Layout name, present either in the template or in the built-in default.
    pub layout_type: String,

    pub elements: Vec<MappedElement>,
}

/// Maps classified content onto a template.
#[derive(Debug, Clone)]
pub struct TemplateMapper {
    config: EngineConfig,
    builtin: Arc<Template>,
}

impl Default for TemplateMapper {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TemplateMapper {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            builtin: Template::builtin(),
        }
    }

    /// Map the elements of one slide. Pure: the same inputs always give the
    /// same output.
    pub fn map(&self, elements: &[ContentElement], slide_number: usize, template: &Template) -> MappedSlide {
        let slide_kind = slide_kind(elements.iter().map(|e| e.role));
        let layout_type = resolve_layout_type(template, slide_kind);

        let elements = elements
            .iter()
            .map(|element| self.map_element(element, template, slide_number))
            .collect();

        MappedSlide {
            number: slide_number,
            slide_kind,
            layout_type,
            elements,
        }
    }

    fn map_element(&self, element: &ContentElement, template: &Template, slide_number: usize) -> MappedElement {
        let role = element.role;
        let (rule, inherited) = self.typography(role, template, slide_number);
        let color = rule
            .color
            .clone()
            .unwrap_or_else(|| template.colors.for_role(role).to_string());

        let size = if inherited && role.is_list() {
            self.list_size(rule.size)
        } else {
            rule.size
        };

        MappedElement {
            content: element.clone(),
            font: rule.font.clone(),
            size,
            bold: rule.is_bold(),
            color,
            line_height: rule.line_height.unwrap_or(self.config.default_line_height),
        }
    }

    /// Lists borrowing body typography are set slightly smaller, down to a
    /// floor, but never larger than the body.
    fn list_size(&self, body_size: f64) -> f64 {
        (body_size - self.config.list_size_reduction)
            .max(self.config.min_list_font_size)
            .min(body_size)
    }

    /// Typography for a role, falling back to the body rule. The flag is set
    /// when the role had no rule of its own in the template.
    fn typography<'a>(
        &'a self,
        role: Role,
        template: &'a Template,
        slide_number: usize,
    ) -> (&'a TypographyRule, bool) {
        if let Some(rule) = template.typography_for(role) {
            return (rule, false);
        }
        log::debug!(
            "Slide {}: template '{}' has no '{}' typography, using body",
            slide_number,
            template.name(),
            role
        );
        if let Some(rule) = template.typography_for(Role::Body) {
            return (rule, true);
        }
        let rule = self
            .builtin
            .typography_for(role)
            .or_else(|| self.builtin.typography_for(Role::Body))
            .unwrap_or(&FALLBACK_RULE);
        (rule, false)
    }
}

/// Decide the slide kind from the roles it contains.
pub fn slide_kind(roles: impl IntoIterator<Item = Role>) -> SlideKind {
    let roles: Vec<Role> = roles.into_iter().collect();
    if !roles.contains(&Role::Title) {
        return SlideKind::Section;
    }
    if roles.iter().all(|r| matches!(r, Role::Title | Role::Subtitle)) {
        return SlideKind::TitleSlide;
    }
    // Title with body, list or any other content
    SlideKind::ContentSlide
}

/// Resolve the layout name for a slide kind through the template's
/// mappings, then its `fallback` mapping, then the kind's own name (served
/// by the built-in template when the template lacks it).
pub fn resolve_layout_type(template: &Template, kind: SlideKind) -> String {
    let mappings = &template.slide_type_mappings;
    let wanted = mappings.get(kind.as_str()).map(String::as_str).unwrap_or(kind.as_str());
    if template.layout(wanted).is_some() {
        return wanted.to_string();
    }

    if let Some(fallback) = mappings.get(FALLBACK_MAPPING_KEY) {
        if template.layout(fallback).is_some() {
            log::debug!(
                "Template '{}' has no '{}' layout, using fallback '{}'",
                template.name(),
                wanted,
                fallback
            );
            return fallback.clone();
        }
    }

    log::debug!(
        "Template '{}' has no layout for {}, using the built-in one",
        template.name(),
        kind.as_str()
    );
    kind.as_str().to_string()
}
