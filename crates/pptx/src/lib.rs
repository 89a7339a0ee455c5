//! PPTX (Office Open XML) reader.
//!
//! Reads slide text, placeholder types and vertical offsets from .pptx
//! archives into the structured extraction the design pipeline consumes.

pub mod parser;

pub use parser::PptxParser;
