//! Turns a structured extraction into slide drafts.
//!
//! Slides reported by the extraction source are kept as they are. Only when
//! the source gives no structure at all (one slide, no placeholders) is its
//! text flattened and handed to boundary detection.

use crate::boundary::BoundaryDetector;
use crate::config::EngineConfig;
use crate::types::{ExtractedPresentation, ExtractedSlide, PlaceholderHint, RawBlock, RawElement, SlideDraft};

/// Converts [`ExtractedPresentation`]s into [`SlideDraft`]s.
pub struct ExtractionAdapter {
    config: EngineConfig,
    detector: BoundaryDetector,
}

impl Default for ExtractionAdapter {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ExtractionAdapter {
    pub fn new(config: EngineConfig) -> Self {
        let detector = BoundaryDetector::new(&config);
        Self { config, detector }
    }

    /// Build drafts from an extraction, in slide index order.
    pub fn to_drafts(&self, extraction: &ExtractedPresentation) -> Vec<SlideDraft> {
        let mut slides: Vec<&ExtractedSlide> = extraction.slides.iter().collect();
        slides.sort_by_key(|s| s.index);

        if let [only] = slides.as_slice() {
            if !has_placeholders(only) {
                let text = flatten(only);
                log::debug!("Extraction has one unstructured slide, running boundary detection");
                return self.detector.detect(&text);
            }
        }

        slides
            .iter()
            .enumerate()
            .map(|(position, slide)| self.slide_to_draft(position + 1, slide))
            .collect()
    }

    fn slide_to_draft(&self, number: usize, slide: &ExtractedSlide) -> SlideDraft {
        let mut draft = SlideDraft::new(number).with_source_label((slide.index + 1).to_string());

        for element in text_elements(slide) {
            let hint = PlaceholderHint::from_placeholder_type(&element.placeholder_type)
                .or_else(|| self.position_hint(element));
            draft.add_block(RawBlock::with_hint(
                element.content.clone(),
                hint,
                Some(element.position_y),
            ));
        }

        draft.sort_by_position();
        draft
    }

    /// Elements without a placeholder that sit near the bottom are footers.
    fn position_hint(&self, element: &RawElement) -> Option<PlaceholderHint> {
        match self.config.footer_position_threshold {
            Some(threshold) if element.position_y > threshold => Some(PlaceholderHint::Footer),
            _ => None,
        }
    }
}

fn text_elements(slide: &ExtractedSlide) -> impl Iterator<Item = &RawElement> {
    slide
        .raw_elements
        .iter()
        .filter(|e| e.element_type.eq_ignore_ascii_case("TEXT") && !e.content.trim().is_empty())
}

fn has_placeholders(slide: &ExtractedSlide) -> bool {
    text_elements(slide).any(|e| PlaceholderHint::from_placeholder_type(&e.placeholder_type).is_some())
}

/// Slide text top to bottom, one element per paragraph.
fn flatten(slide: &ExtractedSlide) -> String {
    let mut elements: Vec<&RawElement> = text_elements(slide).collect();
    elements.sort_by(|a, b| {
        a.position_y
            .partial_cmp(&b.position_y)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    elements
        .iter()
        .map(|e| e.content.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}
