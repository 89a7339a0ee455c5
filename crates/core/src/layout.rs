//! Absolute placement and readability checks.
//!
//! Elements are placed in the box their role maps to in the slide's layout
//! variant. Elements sharing a box stack top to bottom. Content that does
//! not fit is clamped to the box and flagged, never moved outside it.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::color::contrast_ratio;
use crate::config::EngineConfig;
use crate::mapper::{MappedElement, MappedSlide};
use crate::template::{LayoutBox, Template};
use crate::text::char_len;
use crate::types::{DesignedSlide, ElementWarning, Position, Role, SlideKind, StyledElement};

/// Used when no template, including the built-in one, has a usable box.
const LAST_RESORT_BOX: LayoutBox = LayoutBox::new(40.0, 96.0, 640.0, 256.0);

/// A slide with every element placed.
#[derive(Debug, Clone, PartialEq)]
pub struct LaidOutSlide {
    pub number: usize,
    pub layout_type: String,
    pub slide_kind: SlideKind,
    pub background: String,
    pub elements: Vec<StyledElement>,
}

impl LaidOutSlide {
    /// Number of boundary violations on this slide.
    pub fn boundary_violations(&self) -> usize {
        self.warnings()
            .filter(|w| matches!(w, ElementWarning::BoundaryViolation { .. }))
            .count()
    }

    /// Number of contrast warnings on this slide.
    pub fn contrast_warnings(&self) -> usize {
        self.warnings()
            .filter(|w| matches!(w, ElementWarning::LowContrast { .. }))
            .count()
    }

    fn warnings(&self) -> impl Iterator<Item = &ElementWarning> {
        self.elements.iter().flat_map(|e| e.warnings.iter())
    }

    pub fn into_designed(self) -> DesignedSlide {
        DesignedSlide {
            number: self.number,
            layout_type: self.layout_type,
            slide_kind: self.slide_kind,
            background: self.background,
            styled_elements: self.elements,
        }
    }
}

/// Which box an element was placed in, so that elements sharing one stack.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum BoxSource {
    Template(String),
    Builtin(String),
    LastResort,
}

/// Computes element positions and validates readability.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: EngineConfig,
    builtin: Arc<Template>,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl LayoutEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            builtin: Template::builtin(),
        }
    }

    /// Place every element of a mapped slide.
    pub fn layout(&self, mapped: &MappedSlide, template: &Template) -> LaidOutSlide {
        // Height already used in each box
        let mut used: BTreeMap<BoxSource, f64> = BTreeMap::new();
        let mut elements = Vec::with_capacity(mapped.elements.len());

        for element in &mapped.elements {
            let (source, layout_box) = self.resolve_box(&mapped.layout_type, element.content.role, template);
            let offset = used.get(&source).copied().unwrap_or(0.0);
            let available = (layout_box.height - offset).max(0.0);
            let required = self.estimate_height(element, layout_box.width);

            let mut warnings = Vec::new();
            let height = if required > available {
                log::debug!(
                    "Slide {}: {} needs {:.1}pt but only {:.1}pt remain in its box",
                    mapped.number,
                    element.content.role,
                    required,
                    available
                );
                warnings.push(ElementWarning::BoundaryViolation {
                    required_height: required,
                    available_height: available,
                });
                available
            } else {
                required
            };

            used.insert(
                source,
                (offset + height + self.config.element_spacing).min(layout_box.height),
            );

            elements.push(StyledElement {
                role: element.content.role,
                text: element.content.text.clone(),
                formatting_segments: element.content.formatting_segments.clone(),
                list_items: element.content.list_items.clone(),
                list_kind: element.content.list_kind,
                font: element.font.clone(),
                size: element.size,
                bold: element.bold,
                color: element.color.clone(),
                line_height: element.line_height,
                position: Position {
                    x: layout_box.x,
                    y: layout_box.y + offset,
                    width: layout_box.width,
                    height,
                },
                warnings,
            });
        }

        LaidOutSlide {
            number: mapped.number,
            layout_type: mapped.layout_type.clone(),
            slide_kind: mapped.slide_kind,
            background: template.colors.background.clone(),
            elements,
        }
    }

    /// Flag elements whose color is too close to the slide background.
    pub fn validate(&self, mut slide: LaidOutSlide) -> LaidOutSlide {
        let minimum = self.config.min_contrast_ratio;

        for element in &mut slide.elements {
            let ratio = match contrast_ratio(&element.color, &slide.background) {
                Ok(ratio) => ratio,
                Err(e) => {
                    log::warn!("Slide {}: cannot check contrast: {}", slide.number, e);
                    continue;
                }
            };
            if ratio < minimum {
                log::debug!(
                    "Slide {}: {} contrast {:.2} is below {:.1}",
                    slide.number,
                    element.role,
                    ratio,
                    minimum
                );
                element.warnings.push(ElementWarning::LowContrast {
                    ratio,
                    minimum,
                    foreground: element.color.clone(),
                    background: slide.background.clone(),
                });
            }
        }

        slide
    }

    /// Box for a role: the role's own box in the layout, then the layout's
    /// body box, then the same lookups in the built-in template. Built-in
    /// boxes are scaled from the built-in page to the template's page.
    fn resolve_box(&self, layout_type: &str, role: Role, template: &Template) -> (BoxSource, LayoutBox) {
        let lookup = |t: &Template| -> Option<(String, LayoutBox)> {
            let spec = t.layout(layout_type)?;
            spec.get(role.key())
                .map(|b| (role.key().to_string(), *b))
                .or_else(|| spec.get(Role::Body.key()).map(|b| (Role::Body.key().to_string(), *b)))
        };

        if let Some((key, layout_box)) = lookup(template) {
            return (BoxSource::Template(key), layout_box);
        }
        if let Some((key, layout_box)) = lookup(&self.builtin) {
            log::trace!("No '{}' box in '{}', using the built-in layout", role, layout_type);
            let scaled = layout_box.scaled(&self.builtin.page, &template.page);
            return (BoxSource::Builtin(key), scaled);
        }
        log::warn!("No layout box for {} in '{}'", role, layout_type);
        let scaled = LAST_RESORT_BOX.scaled(&self.builtin.page, &template.page);
        (BoxSource::LastResort, scaled)
    }

    /// Estimated rendered height of an element at the given width.
    fn estimate_height(&self, element: &MappedElement, width: f64) -> f64 {
        let glyph_width = (element.size * self.config.avg_char_width).max(f64::EPSILON);
        let chars_per_line = ((width / glyph_width).floor() as usize).max(1);

        let lines: usize = element
            .content
            .text
            .split('\n')
            .map(|line| char_len(line).div_ceil(chars_per_line).max(1))
            .sum();

        lines as f64 * element.size * element.line_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::TemplateMapper;
    use crate::template::tests::CORPORATE_JSON;
    use crate::types::ContentElement;

    fn element(role: Role, text: &str) -> ContentElement {
        ContentElement {
            role,
            text: text.to_string(),
            formatting_segments: Vec::new(),
            list_items: None,
            list_kind: None,
            heading_level: None,
            opens_list: false,
        }
    }

    fn lay_out(elements: &[ContentElement], template: &Template) -> LaidOutSlide {
        let mapped = TemplateMapper::default().map(elements, 1, template);
        let engine = LayoutEngine::default();
        engine.validate(engine.layout(&mapped, template))
    }

    #[test]
    fn test_elements_stack_in_shared_box() {
        let template = Template::from_json(CORPORATE_JSON).unwrap();
        let slide = lay_out(
            &[
                element(Role::Title, "Plan"),
                element(Role::Body, "First paragraph"),
                element(Role::Heading, "Next"),
            ],
            &template,
        );
        let body = slide.elements[1].position;
        let heading = slide.elements[2].position;
        // Heading has no box of its own and shares the body box
        assert_eq!((body.x, body.y, body.width), (40.0, 80.0, 640.0));
        assert_eq!(heading.y, body.y + body.height + 12.0);
        // 16pt * 1.4 line height, one line
        assert!((body.height - 22.4).abs() < 1e-9);
        assert_eq!(slide.boundary_violations(), 0);
    }

    #[test]
    fn test_overflow_is_flagged_and_clamped() {
        let template = Template::from_json(CORPORATE_JSON).unwrap();
        let long = "word ".repeat(400);
        let slide = lay_out(&[element(Role::Title, "Plan"), element(Role::Body, &long)], &template);
        let body = &slide.elements[1];
        assert_eq!(body.position.height, 260.0);
        assert!(matches!(
            body.warnings[0],
            ElementWarning::BoundaryViolation { required_height, available_height }
                if required_height > available_height && available_height == 260.0
        ));
        assert_eq!(slide.boundary_violations(), 1);
    }

    #[test]
    fn test_elements_stay_inside_their_box() {
        let template = Template::builtin();
        let lines: Vec<ContentElement> = (0..30)
            .map(|i| element(Role::Body, &format!("Paragraph number {}", i)))
            .collect();
        let slide = lay_out(&lines, &template);
        for styled in &slide.elements {
            let p = styled.position;
            assert!(p.y >= 120.0 && p.y + p.height <= 350.0 + 1e-9);
        }
        assert!(slide.boundary_violations() > 0);
    }

    #[test]
    fn test_white_on_white_is_flagged() {
        let json = CORPORATE_JSON.replace(r##""text": "#212121""##, r##""text": "#FFFFFF""##);
        let template = Template::from_json(&json).unwrap();
        let slide = lay_out(&[element(Role::Title, "Plan"), element(Role::Body, "Invisible")], &template);
        let body = &slide.elements[1];
        assert_eq!(body.color, "#FFFFFF");
        assert!(matches!(
            &body.warnings[..],
            [ElementWarning::LowContrast { ratio, .. }] if (*ratio - 1.0).abs() < 1e-9
        ));
        assert!(slide.elements[0].warnings.is_empty());
        assert_eq!(slide.contrast_warnings(), 1);
    }

    #[test]
    fn test_missing_layout_uses_builtin_boxes() {
        let mut template = Template::from_json(CORPORATE_JSON).unwrap();
        template.slide_type_mappings.clear();
        let slide = lay_out(&[element(Role::Heading, "Section")], &template);
        assert_eq!(slide.layout_type, "section");
        assert_eq!(slide.elements[0].position.x, 60.0);
        assert_eq!(slide.background, "#FFFFFF");
    }

    #[test]
    fn test_builtin_boxes_scale_to_small_page() {
        let json = r##"{
            "metadata": {"name": "small"},
            "page": {"width": 400, "height": 225},
            "colors": {"primary": "#000000", "secondary": "#000000", "background": "#FFFFFF", "text": "#000000"},
            "typography": {"body": {"font": "Arial", "size": 14}},
            "layouts": {"title_slide": {"title": {"x": 20, "y": 60, "width": 360, "height": 60}}}
        }"##;
        let template = Template::from_json(json).unwrap();
        let slide = lay_out(&[element(Role::Body, "Loose paragraph")], &template);
        assert_eq!(slide.layout_type, "section");

        let p = slide.elements[0].position;
        assert!(p.x >= 0.0 && p.x + p.width <= 400.0 + 1e-9);
        assert!(p.y >= 0.0 && p.y + p.height <= 225.0 + 1e-9);
        assert!((p.width - 600.0 * 400.0 / 720.0).abs() < 1e-9);
        assert!(slide.elements[0].warnings.is_empty());
    }

    #[test]
    fn test_empty_slide_has_no_elements() {
        let slide = lay_out(&[], &Template::builtin());
        assert!(slide.elements.is_empty());
        assert!(slide.into_designed().styled_elements.is_empty());
    }
}
