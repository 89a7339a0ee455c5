//! Slide content structuring and template application.
//!
//! Raw presentation text is split into slides, every line gets a structural
//! role, inline emphasis becomes formatting spans, and a design template
//! supplies typography, colors and absolute positions.

pub mod adapter;
pub mod boundary;
pub mod classify;
pub mod color;
pub mod config;
pub mod error;
pub mod inline;
pub mod layout;
pub mod locale;
pub mod mapper;
pub mod pipeline;
pub mod template;
pub mod text;
pub mod types;

pub use adapter::ExtractionAdapter;
pub use boundary::{BoundaryDetector, BoundaryStrategy};
pub use classify::StructuralClassifier;
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use inline::InlineFormatter;
pub use layout::LayoutEngine;
pub use mapper::TemplateMapper;
pub use pipeline::{DesignPipeline, OutputAssembler, SlideStage};
pub use template::{Template, TemplateRepository};
pub use types::{
    ContentElement, DesignedPresentation, DesignedSlide, ExtractedPresentation, ExtractedSlide,
    InputFormat, RawBlock, RawElement, Role, SlideDraft, StyledElement,
};
