//! End-to-end slide design: detection, classification, formatting,
//! mapping, layout and assembly.
//!
//! Each slide moves through [`SlideStage`]s independently, so slides can be
//! designed on separate threads. [`OutputAssembler`] puts the results back
//! in slide order.

use std::sync::Arc;

use crate::adapter::ExtractionAdapter;
use crate::boundary::BoundaryDetector;
use crate::classify::StructuralClassifier;
use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::inline::InlineFormatter;
use crate::layout::LayoutEngine;
use crate::mapper::TemplateMapper;
use crate::template::Template;
use crate::types::{
    DesignedPresentation, DesignedSlide, ElementWarning, ExtractedPresentation, PresentationReport,
    SlideDraft,
};

/// Where a slide is in the design process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideStage {
    Draft,
    Classified,
    Formatted,
    Mapped,
    LaidOut,
    Validated,
    Ready,
    Error,
}

impl SlideStage {
    /// The stage that normally follows this one.
    pub fn next(self) -> Option<SlideStage> {
        match self {
            SlideStage::Draft => Some(SlideStage::Classified),
            SlideStage::Classified => Some(SlideStage::Formatted),
            SlideStage::Formatted => Some(SlideStage::Mapped),
            SlideStage::Mapped => Some(SlideStage::LaidOut),
            SlideStage::LaidOut => Some(SlideStage::Validated),
            SlideStage::Validated => Some(SlideStage::Ready),
            SlideStage::Ready | SlideStage::Error => None,
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, SlideStage::Ready | SlideStage::Error)
    }

    /// Move to `to`, which must be the next stage or `Error`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StageTransition`] for any other move.
    pub fn advance(self, to: SlideStage) -> Result<SlideStage> {
        let allowed = self.next() == Some(to) || (to == SlideStage::Error && !self.is_terminal());
        if allowed {
            Ok(to)
        } else {
            Err(Error::StageTransition { from: self, to })
        }
    }
}

/// Designs presentations against one template.
pub struct DesignPipeline {
    template: Arc<Template>,
    detector: BoundaryDetector,
    adapter: ExtractionAdapter,
    classifier: StructuralClassifier,
    formatter: InlineFormatter,
    mapper: TemplateMapper,
    layout: LayoutEngine,
}

impl DesignPipeline {
    pub fn new(config: EngineConfig, template: Arc<Template>) -> Self {
        Self {
            template,
            detector: BoundaryDetector::new(&config),
            adapter: ExtractionAdapter::new(config.clone()),
            classifier: StructuralClassifier::new(config.clone()),
            formatter: InlineFormatter::new(),
            mapper: TemplateMapper::new(config.clone()),
            layout: LayoutEngine::new(config),
        }
    }

    /// The template slides are designed against.
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Split raw text into drafts without designing them.
    pub fn detect(&self, raw_text: &str) -> Vec<SlideDraft> {
        self.detector.detect(raw_text)
    }

    /// Design a presentation from raw pasted text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if the text holds no slide content.
    pub fn design_text(&self, raw_text: &str) -> Result<DesignedPresentation> {
        let drafts = self.detector.detect(raw_text);
        if drafts.is_empty() {
            return Err(Error::EmptyInput);
        }
        self.design_drafts(&drafts, OutputAssembler::new(self.template.name()))
    }

    /// Design a presentation from a structured extraction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] if no slide carries any text.
    pub fn design_extraction(&self, extraction: &ExtractedPresentation) -> Result<DesignedPresentation> {
        let drafts = self.adapter.to_drafts(extraction);
        if drafts.iter().all(SlideDraft::is_empty) {
            return Err(Error::EmptyInput);
        }

        let mut assembler = OutputAssembler::new(self.template.name());
        if let Some(id) = &extraction.presentation_id {
            assembler = assembler.with_presentation_id(id.clone());
        }
        if let Some(title) = &extraction.title {
            assembler = assembler.with_title(title.clone());
        }
        self.design_drafts(&drafts, assembler)
    }

    fn design_drafts(&self, drafts: &[SlideDraft], mut assembler: OutputAssembler) -> Result<DesignedPresentation> {
        for (index, draft) in drafts.iter().enumerate() {
            assembler.push(index, self.design_slide(index, draft)?);
        }
        Ok(assembler.finish())
    }

    /// Design a single slide. `index` is the 0-based slide position.
    ///
    /// Safe to call from several threads at once.
    pub fn design_slide(&self, index: usize, draft: &SlideDraft) -> Result<DesignedSlide> {
        let mut stage = SlideStage::Draft;

        let classified = self.classifier.classify(draft, index);
        stage = stage.advance(SlideStage::Classified)?;

        let elements: Vec<_> = classified
            .iter()
            .map(|c| self.formatter.format_element(c))
            .collect();
        stage = stage.advance(SlideStage::Formatted)?;

        let mapped = self.mapper.map(&elements, draft.number, &self.template);
        stage = stage.advance(SlideStage::Mapped)?;

        let laid_out = self.layout.layout(&mapped, &self.template);
        stage = stage.advance(SlideStage::LaidOut)?;

        let validated = self.layout.validate(laid_out);
        stage = stage.advance(SlideStage::Validated)?;

        let slide = validated.into_designed();
        stage = stage.advance(SlideStage::Ready)?;

        log::debug!(
            "Slide {} {:?}: {} elements, layout '{}', {} warnings",
            slide.number,
            stage,
            slide.styled_elements.len(),
            slide.layout_type,
            slide.warning_count()
        );
        Ok(slide)
    }
}

/// Collects designed slides in any order and emits them in slide order.
#[derive(Debug, Clone)]
pub struct OutputAssembler {
    template_name: String,
    presentation_id: Option<String>,
    title: Option<String>,
    slides: Vec<(usize, DesignedSlide)>,
}

impl OutputAssembler {
    pub fn new(template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            presentation_id: None,
            title: None,
            slides: Vec::new(),
        }
    }

    pub fn with_presentation_id(mut self, id: impl Into<String>) -> Self {
        self.presentation_id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add the slide designed for draft position `index`.
    pub fn push(&mut self, index: usize, slide: DesignedSlide) {
        self.slides.push((index, slide));
    }

    /// Order slides by index and build the warning report.
    pub fn finish(mut self) -> DesignedPresentation {
        self.slides.sort_by_key(|(index, _)| *index);

        let mut report = PresentationReport::default();
        for (_, slide) in &self.slides {
            for warning in slide.styled_elements.iter().flat_map(|e| &e.warnings) {
                match warning {
                    ElementWarning::BoundaryViolation { .. } => report.boundary_violations += 1,
                    ElementWarning::LowContrast { .. } => report.contrast_warnings += 1,
                }
            }
            if slide.warning_count() > 0 {
                report.slides_with_warnings.push(slide.number);
            }
        }

        if !report.slides_with_warnings.is_empty() {
            log::info!(
                "{} boundary violations and {} contrast warnings on slides {:?}",
                report.boundary_violations,
                report.contrast_warnings,
                report.slides_with_warnings
            );
        }

        DesignedPresentation {
            template_name: self.template_name,
            presentation_id: self.presentation_id,
            title: self.title,
            designed_slides: self.slides.into_iter().map(|(_, slide)| slide).collect(),
            report,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::tests::CORPORATE_JSON;
    use crate::types::{RawElement, Role, SlideKind, TitleCandidate};

    fn builtin_pipeline() -> DesignPipeline {
        DesignPipeline::new(EngineConfig::default(), Template::builtin())
    }

    fn corporate_pipeline() -> DesignPipeline {
        let template = Template::from_json(CORPORATE_JSON).unwrap();
        DesignPipeline::new(EngineConfig::default(), Arc::new(template))
    }

    #[test]
    fn test_stage_transitions() {
        let stage = SlideStage::Draft.advance(SlideStage::Classified).unwrap();
        assert_eq!(stage, SlideStage::Classified);
        assert!(matches!(
            SlideStage::Draft.advance(SlideStage::Mapped),
            Err(Error::StageTransition {
                from: SlideStage::Draft,
                to: SlideStage::Mapped
            })
        ));
        assert_eq!(SlideStage::LaidOut.advance(SlideStage::Error).unwrap(), SlideStage::Error);
        assert!(SlideStage::Ready.advance(SlideStage::Error).is_err());
        assert!(SlideStage::Error.advance(SlideStage::Draft).is_err());
        assert_eq!(SlideStage::Validated.next(), Some(SlideStage::Ready));
    }

    #[test]
    fn test_empty_text_is_an_error() {
        assert!(matches!(builtin_pipeline().design_text(" \n\t\n"), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_number_after_text_end_to_end() {
        let presentation = builtin_pipeline()
            .design_text("Q4 Review\n1\n\nDetails here\n2")
            .unwrap();
        assert_eq!(presentation.template_name, "builtin-default");
        let slides = &presentation.designed_slides;
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].styled_elements[0].role, Role::Title);
        assert_eq!(slides[0].styled_elements[0].text, "Q4 Review");
        assert_eq!(slides[0].slide_kind, SlideKind::TitleSlide);
        assert_eq!(slides[1].styled_elements[0].role, Role::Body);
        assert_eq!(slides[1].styled_elements[0].text, "Details here");
        assert_eq!(slides[1].slide_kind, SlideKind::Section);
        assert_eq!(presentation.report, PresentationReport::default());
    }

    #[test]
    fn test_numbered_list_and_formatting_end_to_end() {
        let text = "Slide 1 Plan\nOur **key** steps:\n1. Research\n2. Build\n3. Ship";
        let presentation = corporate_pipeline().design_text(text).unwrap();
        let slide = &presentation.designed_slides[0];
        let roles: Vec<Role> = slide.styled_elements.iter().map(|e| e.role).collect();
        assert_eq!(roles, vec![Role::Title, Role::Body, Role::NumberedList]);
        assert_eq!(slide.layout_type, "content_slide");
        assert_eq!(slide.styled_elements[1].text, "Our key steps:");
        assert!(slide.styled_elements[1].formatting_segments.iter().all(|s| s.bold));
        assert_eq!(
            slide.styled_elements[2].list_items,
            Some(vec!["Research".to_string(), "Build".to_string(), "Ship".to_string()])
        );
    }

    #[test]
    fn test_footer_falls_back_to_body_typography() {
        let text = "Slide 1 Quarterly Plan\nWe will expand into three new regions over the next two quarters with a focused team.\nConfidential";
        let presentation = corporate_pipeline().design_text(text).unwrap();
        let slide = &presentation.designed_slides[0];
        let footer = slide.styled_elements.last().unwrap();
        assert_eq!(footer.role, Role::Footer);
        assert_eq!(footer.font, "Open Sans");
        assert_eq!(footer.size, 16.0);
        assert_eq!(footer.color, "#212121");
    }

    #[test]
    fn test_contrast_warning_reaches_report() {
        let json = CORPORATE_JSON.replace(r##""text": "#212121""##, r##""text": "#FFFFFF""##);
        let template = Arc::new(Template::from_json(&json).unwrap());
        let pipeline = DesignPipeline::new(EngineConfig::default(), template);
        let presentation = pipeline
            .design_text("Slide 1 Plan\nWe will expand into three new regions over the next two quarters with a focused team.")
            .unwrap();
        assert_eq!(presentation.report.contrast_warnings, 1);
        assert_eq!(presentation.report.slides_with_warnings, vec![1]);
    }

    #[test]
    fn test_empty_draft_is_ready_with_no_elements() {
        let slide = builtin_pipeline().design_slide(0, &SlideDraft::new(1)).unwrap();
        assert!(slide.styled_elements.is_empty());
        assert_eq!(slide.slide_kind, SlideKind::Section);
        assert_eq!(slide.background, "#FFFFFF");
    }

    #[test]
    fn test_design_is_idempotent() {
        let pipeline = corporate_pipeline();
        let text = "# Goals\nGrow revenue\n\n# Team\nHire **two** engineers";
        assert_eq!(pipeline.design_text(text).unwrap(), pipeline.design_text(text).unwrap());
    }

    #[test]
    fn test_extraction_end_to_end() {
        let mut extraction = ExtractedPresentation::new(Some("abc".into()), Some("Deck".into()));
        let mut first = crate::types::ExtractedSlide::new(0);
        first.raw_elements.push(RawElement::text("Welcome", 100.0, "CENTERED_TITLE"));
        first.raw_elements.push(RawElement::text("A short intro", 900_000.0, "SUBTITLE"));
        extraction.add_slide(first);
        extraction.add_slide(crate::types::ExtractedSlide::new(1));

        let presentation = builtin_pipeline().design_extraction(&extraction).unwrap();
        assert_eq!(presentation.presentation_id.as_deref(), Some("abc"));
        assert_eq!(presentation.title.as_deref(), Some("Deck"));
        let slides = &presentation.designed_slides;
        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].slide_kind, SlideKind::TitleSlide);
        assert_eq!(slides[0].styled_elements[1].role, Role::Subtitle);
        assert!(slides[1].styled_elements.is_empty());
    }

    #[test]
    fn test_extraction_without_text_is_empty_input() {
        let mut extraction = ExtractedPresentation::default();
        extraction.add_slide(crate::types::ExtractedSlide::new(0));
        extraction.add_slide(crate::types::ExtractedSlide::new(1));
        assert!(matches!(
            builtin_pipeline().design_extraction(&extraction),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_assembler_orders_by_index() {
        let pipeline = builtin_pipeline();
        let drafts: Vec<SlideDraft> = (1..=4)
            .map(|n| SlideDraft::new(n).with_title(TitleCandidate::Found(format!("Slide {}", n))))
            .collect();

        let mut results: Vec<(usize, DesignedSlide)> = std::thread::scope(|scope| {
            let handles: Vec<_> = drafts
                .iter()
                .enumerate()
                .map(|(index, draft)| {
                    let pipeline = &pipeline;
                    scope.spawn(move || (index, pipeline.design_slide(index, draft).unwrap()))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        results.reverse();

        let mut assembler = OutputAssembler::new("builtin-default");
        for (index, slide) in results {
            assembler.push(index, slide);
        }
        let presentation = assembler.finish();
        let numbers: Vec<usize> = presentation.designed_slides.iter().map(|s| s.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }
}
