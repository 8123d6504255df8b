//! OCR tool backed by the PaddleOCR service

use schemars::JsonSchema;
use serde::Deserialize;

use crate::{error::McpResult, types::ServerState};

/// Tool name as advertised to clients
pub const OCR_TOOL_NAME: &str = "image_ocr";

/// Parameters for the OCR tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct OcrParams {
    /// Local image path, image URL, or data:image base64 URL
    pub image: String,

    /// Recognition language, e.g. "en" or "ch" (default: auto)
    #[serde(default)]
    pub lang: Option<String>,
}

/// Handle an OCR request, returning pretty JSON
#[tracing::instrument(skip(state, params))]
pub async fn handle_ocr(state: &ServerState, params: OcrParams) -> McpResult<String> {
    let result = state
        .ocr
        .extract_text(&params.image, params.lang.as_deref())
        .await?;
    Ok(serde_json::to_string_pretty(&result)?)
}
