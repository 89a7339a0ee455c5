//! Design templates: schema, validation, the built-in default and the
//! read-only repository templates are looked up from.
//!
//! A template is loaded and validated once, then shared as
//! `Arc<Template>`. Nothing mutates a template after construction, so
//! concurrent pipelines can read it without locking.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use crate::color::RgbColor;
use crate::error::{Error, Result};
use crate::types::{Role, SlideKind};

/// Name under which the built-in default template is reported.
pub const BUILTIN_TEMPLATE_NAME: &str = "builtin-default";

/// Key in `slideTypeMappings` naming the layout used when nothing else fits.
pub const FALLBACK_MAPPING_KEY: &str = "fallback";

/// Descriptive template metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub version: Option<String>,
}

/// Slide page size in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl Default for PageSize {
    fn default() -> Self {
        // 16:9 at 720pt wide
        Self {
            width: 720.0,
            height: 405.0,
        }
    }
}

/// Named template colors as hex strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPalette {
    pub primary: String,
    pub secondary: String,

    #[serde(default)]
    pub accent: Option<String>,

    pub background: String,
    pub text: String,

    #[serde(default, rename = "textLight", alias = "text_light")]
    pub text_light: Option<String>,
}

impl ColorPalette {
    /// Default color for a role when its typography does not set one.
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Title | Role::Heading => &self.primary,
            Role::Subtitle => &self.secondary,
            Role::Body | Role::BulletList | Role::NumberedList => &self.text,
            Role::Footer => self.text_light.as_deref().unwrap_or(&self.text),
        }
    }
}

/// CSS-style font weight: a keyword or a number from 100 to 900.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontWeight {
    Numeric(u16),
    Named(String),
}

impl FontWeight {
    /// Numeric weights from 600 up and the `bold`/`bolder` keywords.
    pub fn is_bold(&self) -> bool {
        match self {
            FontWeight::Numeric(weight) => *weight >= 600,
            FontWeight::Named(name) => {
                let name = name.trim();
                name.eq_ignore_ascii_case("bold")
                    || name.eq_ignore_ascii_case("bolder")
                    || name.parse::<u16>().is_ok_and(|w| w >= 600)
            }
        }
    }
}

/// Font settings for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypographyRule {
    #[serde(alias = "font_family")]
    pub font: String,

    #[serde(alias = "font_size")]
    pub size: f64,

    #[serde(default)]
    pub bold: bool,

    #[serde(default, rename = "fontWeight", alias = "font_weight", skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<FontWeight>,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default, rename = "lineHeight", alias = "line_height")]
    pub line_height: Option<f64>,
}

impl TypographyRule {
    /// Bold either explicitly or through a heavy font weight.
    pub fn is_bold(&self) -> bool {
        self.bold || self.font_weight.as_ref().is_some_and(FontWeight::is_bold)
    }
}

/// A rectangular region of the slide, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl LayoutBox {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// The same region on a page of another size.
    pub fn scaled(&self, from: &PageSize, to: &PageSize) -> Self {
        let sx = to.width / from.width;
        let sy = to.height / from.height;
        Self::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// Whether the box lies entirely on a page of the given size.
    pub fn fits(&self, page: &PageSize) -> bool {
        self.x >= 0.0
            && self.y >= 0.0
            && self.x + self.width <= page.width + f64::EPSILON
            && self.y + self.height <= page.height + f64::EPSILON
    }
}

/// Role key → box, for one slide layout variant.
pub type LayoutSpec = BTreeMap<String, LayoutBox>;

/// A named bundle of typography, color and layout rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub metadata: TemplateMetadata,

    #[serde(default)]
    pub page: PageSize,

    pub colors: ColorPalette,

    pub typography: BTreeMap<String, TypographyRule>,

    pub layouts: BTreeMap<String, LayoutSpec>,

    #[serde(default, rename = "slideTypeMappings", alias = "slide_type_mappings")]
    pub slide_type_mappings: BTreeMap<String, String>,
}

static BUILTIN_TEMPLATE: LazyLock<Arc<Template>> = LazyLock::new(|| Arc::new(Template::minimal()));

impl Template {
    /// Parse and validate a template from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateValidation`] for malformed JSON, missing
    /// sections or invalid values.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut template: Template = serde_json::from_str(json)
            .map_err(|e| Error::TemplateValidation(format!("Malformed template JSON: {}", e)))?;
        template.normalize_layout_keys();
        template.validate()?;
        Ok(template)
    }

    /// Read, parse and validate a template file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| match e {
            Error::TemplateValidation(msg) => {
                Error::TemplateValidation(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// The shared built-in default template.
    pub fn builtin() -> Arc<Template> {
        Arc::clone(&BUILTIN_TEMPLATE)
    }

    /// Single font, default sizes, black on white.
    fn minimal() -> Self {
        let rule = |size: f64, bold: bool| TypographyRule {
            font: "Arial".to_string(),
            size,
            bold,
            font_weight: None,
            color: None,
            line_height: None,
        };
        let typography = BTreeMap::from([
            (Role::Title.key().to_string(), rule(40.0, true)),
            (Role::Subtitle.key().to_string(), rule(24.0, false)),
            (Role::Heading.key().to_string(), rule(28.0, true)),
            (Role::Body.key().to_string(), rule(18.0, false)),
            (Role::BulletList.key().to_string(), rule(18.0, false)),
            (Role::NumberedList.key().to_string(), rule(18.0, false)),
            (Role::Footer.key().to_string(), rule(12.0, false)),
        ]);

        let spec = |boxes: &[(&str, LayoutBox)]| -> LayoutSpec {
            boxes.iter().map(|(k, b)| (k.to_string(), *b)).collect()
        };
        let layouts = BTreeMap::from([
            (
                SlideKind::TitleSlide.as_str().to_string(),
                spec(&[
                    ("title", LayoutBox::new(60.0, 110.0, 600.0, 100.0)),
                    ("subtitle", LayoutBox::new(60.0, 220.0, 600.0, 60.0)),
                    ("body", LayoutBox::new(60.0, 290.0, 600.0, 60.0)),
                    ("footer", LayoutBox::new(60.0, 365.0, 600.0, 28.0)),
                ]),
            ),
            (
                SlideKind::ContentSlide.as_str().to_string(),
                spec(&[
                    ("title", LayoutBox::new(40.0, 24.0, 640.0, 60.0)),
                    ("body", LayoutBox::new(40.0, 96.0, 640.0, 256.0)),
                    ("footer", LayoutBox::new(40.0, 365.0, 640.0, 28.0)),
                ]),
            ),
            (
                SlideKind::Section.as_str().to_string(),
                spec(&[
                    ("title", LayoutBox::new(60.0, 120.0, 600.0, 80.0)),
                    ("body", LayoutBox::new(60.0, 120.0, 600.0, 230.0)),
                    ("footer", LayoutBox::new(60.0, 365.0, 600.0, 28.0)),
                ]),
            ),
        ]);

        Self {
            metadata: TemplateMetadata {
                name: BUILTIN_TEMPLATE_NAME.to_string(),
                description: Some("Minimal black-on-white fallback".to_string()),
                version: None,
            },
            page: PageSize::default(),
            colors: ColorPalette {
                primary: "#000000".to_string(),
                secondary: "#000000".to_string(),
                accent: None,
                background: "#FFFFFF".to_string(),
                text: "#000000".to_string(),
                text_light: None,
            },
            typography,
            layouts,
            slide_type_mappings: BTreeMap::new(),
        }
    }

    /// Template name from its metadata.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Whether this is the built-in fallback.
    pub fn is_builtin(&self) -> bool {
        self.metadata.name == BUILTIN_TEMPLATE_NAME
    }

    /// Typography declared for `role`, without fallback.
    pub fn typography_for(&self, role: Role) -> Option<&TypographyRule> {
        self.typography.get(role.key())
    }

    /// Boxes of a layout variant, without fallback.
    pub fn layout(&self, layout_type: &str) -> Option<&LayoutSpec> {
        self.layouts.get(layout_type)
    }

    /// Accept `body_position` style keys as `body`.
    fn normalize_layout_keys(&mut self) {
        for spec in self.layouts.values_mut() {
            let renamed: LayoutSpec = std::mem::take(spec)
                .into_iter()
                .map(|(key, layout_box)| {
                    let key = key.strip_suffix("_position").map(str::to_string).unwrap_or(key);
                    (key, layout_box)
                })
                .collect();
            *spec = renamed;
        }
    }

    /// Check the template against the schema rules.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::TemplateValidation(msg));

        if self.metadata.name.trim().is_empty() {
            return invalid("metadata.name must not be empty".to_string());
        }
        if self.page.width <= 0.0 || self.page.height <= 0.0 {
            return invalid(format!(
                "page size must be positive, got {}x{}",
                self.page.width, self.page.height
            ));
        }

        let colors = [
            ("primary", Some(&self.colors.primary)),
            ("secondary", Some(&self.colors.secondary)),
            ("accent", self.colors.accent.as_ref()),
            ("background", Some(&self.colors.background)),
            ("text", Some(&self.colors.text)),
            ("textLight", self.colors.text_light.as_ref()),
        ];
        for (name, value) in colors {
            if let Some(value) = value {
                if RgbColor::from_hex(value).is_err() {
                    return invalid(format!("colors.{} is not a hex color: '{}'", name, value));
                }
            }
        }

        if !self.typography.contains_key(Role::Body.key()) {
            return invalid("typography.body is required".to_string());
        }
        for (key, rule) in &self.typography {
            if !Role::ALL.iter().any(|r| r.key() == key) {
                log::warn!("Template '{}': typography for unknown role '{}' is ignored", self.name(), key);
            }
            if rule.font.trim().is_empty() {
                return invalid(format!("typography.{}.font must not be empty", key));
            }
            if rule.size <= 0.0 {
                return invalid(format!("typography.{}.size must be positive", key));
            }
            if let Some(color) = &rule.color {
                if RgbColor::from_hex(color).is_err() {
                    return invalid(format!("typography.{}.color is not a hex color: '{}'", key, color));
                }
            }
            if matches!(rule.line_height, Some(h) if h <= 0.0) {
                return invalid(format!("typography.{}.lineHeight must be positive", key));
            }
        }

        for (layout_name, spec) in &self.layouts {
            for (key, layout_box) in spec {
                if layout_box.width <= 0.0 || layout_box.height <= 0.0 {
                    return invalid(format!("layouts.{}.{} has an empty box", layout_name, key));
                }
                if !layout_box.fits(&self.page) {
                    return invalid(format!("layouts.{}.{} extends beyond the page", layout_name, key));
                }
            }
        }

        for (kind, target) in &self.slide_type_mappings {
            if !self.layouts.contains_key(target) {
                log::warn!(
                    "Template '{}': slideTypeMappings.{} points to missing layout '{}'",
                    self.name(),
                    kind,
                    target
                );
            }
        }

        Ok(())
    }
}

/// Immutable name → template lookup, built once and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct TemplateRepository {
    templates: BTreeMap<String, Arc<Template>>,
}

impl TemplateRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a template under `name`.
    pub fn with_template(mut self, name: impl Into<String>, template: Template) -> Self {
        self.templates.insert(name.into(), Arc::new(template));
        self
    }

    /// Load every `*.json` in `dir` and in `dir/designs`. The file stem is
    /// the template name.
    ///
    /// # Errors
    ///
    /// Fails on unreadable directories and on the first template that does
    /// not validate.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let mut repository = Self::new();

        for candidate in [dir.to_path_buf(), dir.join("designs")] {
            if !candidate.is_dir() {
                continue;
            }
            let mut paths: Vec<_> = fs::read_dir(&candidate)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
                .collect();
            paths.sort();

            for path in paths {
                let Some(name) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                    continue;
                };
                let template = Template::from_file(&path)?;
                log::info!("Loaded template '{}' from {}", name, path.display());
                repository = repository.with_template(name, template);
            }
        }

        Ok(repository)
    }

    /// Names of the loaded templates, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }

    /// Look up a template by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateNotFound`] if no template has that name.
    pub fn get(&self, name: &str) -> Result<Arc<Template>> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| Error::TemplateNotFound(name.to_string()))
    }

    /// Look up a template, falling back to the built-in default when it is
    /// missing.
    pub fn resolve(&self, name: &str) -> Arc<Template> {
        match self.get(name) {
            Ok(template) => template,
            Err(e) => {
                log::warn!("{}; using the built-in default template", e);
                Template::builtin()
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const CORPORATE_JSON: &str = r##"{
        "metadata": {"name": "corporate", "version": "1.0"},
        "colors": {
            "primary": "#1A237E",
            "secondary": "#3949AB",
            "accent": "#FFC107",
            "background": "#FFFFFF",
            "text": "#212121"
        },
        "typography": {
            "title": {"font": "Montserrat", "size": 36, "bold": true},
            "heading": {"font": "Montserrat", "size": 24, "bold": true},
            "body": {"font_family": "Open Sans", "font_size": 16, "lineHeight": 1.4}
        },
        "layouts": {
            "title_slide": {
                "title_position": {"x": 50, "y": 120, "width": 620, "height": 90},
                "subtitle_position": {"x": 50, "y": 220, "width": 620, "height": 50},
                "body_position": {"x": 50, "y": 280, "width": 620, "height": 60}
            },
            "content_slide": {
                "title": {"x": 40, "y": 20, "width": 640, "height": 50},
                "body": {"x": 40, "y": 80, "width": 640, "height": 260},
                "footer": {"x": 40, "y": 360, "width": 640, "height": 30}
            }
        },
        "slideTypeMappings": {"fallback": "content_slide"}
    }"##;

    #[test]
    fn test_parse_and_normalize() {
        let template = Template::from_json(CORPORATE_JSON).unwrap();
        assert_eq!(template.name(), "corporate");
        let title_slide = template.layout("title_slide").unwrap();
        assert!(title_slide.contains_key("title"));
        assert!(!title_slide.contains_key("title_position"));
        let body = template.typography_for(Role::Body).unwrap();
        assert_eq!(body.font, "Open Sans");
        assert_eq!(body.line_height, Some(1.4));
        assert!(template.typography_for(Role::Footer).is_none());
        assert_eq!(template.page, PageSize::default());
    }

    #[test]
    fn test_font_weight_sets_bold() {
        let rule: TypographyRule =
            serde_json::from_str(r#"{"font_family": "Arial", "font_size": 40, "font_weight": "bold"}"#).unwrap();
        assert!(rule.is_bold());
        assert!(!rule.bold);

        let rule: TypographyRule = serde_json::from_str(r#"{"font": "Arial", "size": 18, "fontWeight": 700}"#).unwrap();
        assert!(rule.is_bold());

        let rule: TypographyRule = serde_json::from_str(r#"{"font": "Arial", "size": 18, "font_weight": "400"}"#).unwrap();
        assert!(!rule.is_bold());

        let rule: TypographyRule = serde_json::from_str(r#"{"font": "Arial", "size": 18, "font_weight": "normal"}"#).unwrap();
        assert!(!rule.is_bold());
    }

    #[test]
    fn test_footer_color_prefers_text_light() {
        let mut template = Template::from_json(CORPORATE_JSON).unwrap();
        assert_eq!(template.colors.for_role(Role::Footer), "#212121");
        template.colors.text_light = Some("#9E9E9E".to_string());
        assert_eq!(template.colors.for_role(Role::Footer), "#9E9E9E");
        assert_eq!(template.colors.for_role(Role::Body), "#212121");
    }

    #[test]
    fn test_missing_section_is_invalid() {
        let err = Template::from_json(r#"{"metadata": {"name": "x"}}"#).unwrap_err();
        assert!(matches!(err, Error::TemplateValidation(_)));
    }

    #[test]
    fn test_missing_body_typography_is_invalid() {
        let json = CORPORATE_JSON.replace(r#""body": {"font_family""#, r#""footer": {"font_family""#);
        let err = Template::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("typography.body"));
    }

    #[test]
    fn test_bad_color_is_invalid() {
        let json = CORPORATE_JSON.replace("#FFC107", "yellow");
        let err = Template::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("colors.accent"));
    }

    #[test]
    fn test_box_off_page_is_invalid() {
        let json = CORPORATE_JSON.replace(r#""width": 640, "height": 260"#, r#""width": 900, "height": 260"#);
        let err = Template::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("beyond the page"));
    }

    #[test]
    fn test_builtin_is_valid_and_shared() {
        let builtin = Template::builtin();
        builtin.validate().unwrap();
        assert!(builtin.is_builtin());
        assert_eq!(builtin.colors.background, "#FFFFFF");
        assert!(Arc::ptr_eq(&builtin, &Template::builtin()));
        for kind in [SlideKind::TitleSlide, SlideKind::ContentSlide, SlideKind::Section] {
            assert!(builtin.layout(kind.as_str()).is_some());
        }
    }

    #[test]
    fn test_palette_role_colors() {
        let template = Template::from_json(CORPORATE_JSON).unwrap();
        assert_eq!(template.colors.for_role(Role::Title), "#1A237E");
        assert_eq!(template.colors.for_role(Role::Subtitle), "#3949AB");
        assert_eq!(template.colors.for_role(Role::Footer), "#212121");
    }

    #[test]
    fn test_repository_lookup_and_fallback() {
        let repo = TemplateRepository::new()
            .with_template("corporate", Template::from_json(CORPORATE_JSON).unwrap());
        assert_eq!(repo.names(), vec!["corporate"]);
        assert_eq!(repo.get("corporate").unwrap().name(), "corporate");
        assert!(matches!(repo.get("missing"), Err(Error::TemplateNotFound(_))));
        assert!(repo.resolve("missing").is_builtin());
    }

    #[test]
    fn test_repository_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        let designs = dir.path().join("designs");
        fs::create_dir(&designs).unwrap();
        let mut file = fs::File::create(designs.join("corporate.json")).unwrap();
        file.write_all(CORPORATE_JSON.as_bytes()).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a template").unwrap();

        let repo = TemplateRepository::from_dir(dir.path()).unwrap();
        assert_eq!(repo.names(), vec!["corporate"]);
    }

    #[test]
    fn test_repository_from_dir_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        let err = TemplateRepository::from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, Error::TemplateValidation(msg) if msg.contains("broken.json")));
    }

    #[test]
    fn test_repository_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TemplateRepository>();
        assert_send_sync::<Arc<Template>>();
    }
}
