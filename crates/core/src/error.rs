//! Error types for slide structuring and template application.

use thiserror::Error;

use crate::pipeline::SlideStage;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning presentation text into designed slides.
///
/// Only structural impossibilities are errors. Layout overflow and poor
/// contrast are reported as warnings on the affected element instead.
#[derive(Error, Debug)]
pub enum Error {
    /// No content was left after every boundary strategy ran.
    #[error("Input contains no slide content")]
    EmptyInput,

    /// The requested template does not exist in the repository.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// A template was found but does not satisfy the schema.
    #[error("Invalid template: {0}")]
    TemplateValidation(String),

    /// A color value is not a `#RRGGBB` hex string.
    #[error("Invalid color value: {0}")]
    InvalidColor(String),

    /// A slide was moved between pipeline stages in an illegal order.
    #[error("Illegal slide stage transition from {from:?} to {to:?}")]
    StageTransition { from: SlideStage, to: SlideStage },

    /// Failed to read a template or input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to extract slide elements from a source document.
    #[error("Extraction error: {0}")]
    ExtractionError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),
}
