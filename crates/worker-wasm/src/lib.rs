//! WASM-compatible wrapper for slide design.
//!
//! Exposes the design pipeline to JavaScript for use in Cloudflare Workers.
//! Templates are passed in as JSON; without one the built-in default is
//! used.

use deck_core::{DesignPipeline, DesignedPresentation, EngineConfig, ExtractedPresentation, InputFormat, Template};
use std::io::Cursor;
use std::sync::Arc;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Design slides from raw pasted text.
///
/// # Arguments
/// * `text` - The presentation text
/// * `template_json` - Optional template definition as a JSON string
///
/// # Returns
/// The designed presentation as a JavaScript object, or throws on error.
#[wasm_bindgen]
pub fn design_text(text: &str, template_json: Option<String>) -> Result<JsValue, JsValue> {
    let result = design_text_impl(text, template_json.as_deref()).map_err(|e| JsValue::from_str(&e))?;
    to_js(&result)
}

/// Design slides from a PPTX file.
///
/// # Arguments
/// * `data` - The raw bytes of the PPTX file
/// * `filename` - The original filename (used as the presentation id)
/// * `template_json` - Optional template definition as a JSON string
#[wasm_bindgen]
pub fn design_pptx(data: &[u8], filename: &str, template_json: Option<String>) -> Result<JsValue, JsValue> {
    let result =
        design_pptx_impl(data, filename, template_json.as_deref()).map_err(|e| JsValue::from_str(&e))?;
    to_js(&result)
}

/// Design slides from a structured extraction object.
#[wasm_bindgen]
pub fn design_extraction(extraction: JsValue, template_json: Option<String>) -> Result<JsValue, JsValue> {
    let extraction: ExtractedPresentation = serde_wasm_bindgen::from_value(extraction)
        .map_err(|e| JsValue::from_str(&format!("Invalid extraction: {}", e)))?;
    let pipeline = pipeline(template_json.as_deref()).map_err(|e| JsValue::from_str(&e))?;
    let result = pipeline
        .design_extraction(&extraction)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    to_js(&result)
}

fn to_js(presentation: &DesignedPresentation) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(presentation)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn pipeline(template_json: Option<&str>) -> Result<DesignPipeline, String> {
    let template = match template_json {
        Some(json) if !json.trim().is_empty() => Arc::new(Template::from_json(json).map_err(|e| e.to_string())?),
        _ => Template::builtin(),
    };
    Ok(DesignPipeline::new(EngineConfig::default(), template))
}

fn design_text_impl(text: &str, template_json: Option<&str>) -> Result<DesignedPresentation, String> {
    pipeline(template_json)?
        .design_text(text)
        .map_err(|e| e.to_string())
}

fn design_pptx_impl(
    data: &[u8],
    filename: &str,
    template_json: Option<&str>,
) -> Result<DesignedPresentation, String> {
    if InputFormat::from_magic(data) != Some(InputFormat::Pptx) {
        return Err("File is not a PPTX archive".to_string());
    }

    let extraction = deck_pptx::PptxParser::new()
        .parse(Cursor::new(data), filename)
        .map_err(|e| format!("PPTX parsing error: {}", e))?;

    pipeline(template_json)?
        .design_extraction(&extraction)
        .map_err(|e| e.to_string())
}
