//! Vision tools: image understanding and image generation

use gatelink_core::Error;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::{error::McpResult, types::ServerState};

/// Tool name for image understanding
pub const UNDERSTAND_TOOL_NAME: &str = "image_understand";
/// Tool name for image generation
pub const GENERATE_TOOL_NAME: &str = "image_generate";

/// Parameters for the image understanding tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UnderstandParams {
    /// File path, URL, or base64 data (image, video, or PDF)
    pub file: String,

    /// Question or instruction for the visual content analysis
    pub prompt: String,

    /// Enable deep thinking mode for complex reasoning (default: true)
    #[serde(default)]
    pub thinking: Option<bool>,
}

/// Supported output sizes for generated images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
pub enum ImageSize {
    /// 1024x1024
    #[serde(rename = "1024x1024")]
    Square,
    /// 768x1344
    #[serde(rename = "768x1344")]
    Portrait,
    /// 864x1152
    #[serde(rename = "864x1152")]
    PortraitWide,
    /// 1344x768
    #[serde(rename = "1344x768")]
    Landscape,
    /// 1152x864
    #[serde(rename = "1152x864")]
    LandscapeTall,
    /// 1440x720
    #[serde(rename = "1440x720")]
    Panorama,
    /// 720x1440
    #[serde(rename = "720x1440")]
    Tall,
}

impl ImageSize {
    /// Size as sent to the API
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1024x1024",
            Self::Portrait => "768x1344",
            Self::PortraitWide => "864x1152",
            Self::Landscape => "1344x768",
            Self::LandscapeTall => "1152x864",
            Self::Panorama => "1440x720",
            Self::Tall => "720x1440",
        }
    }
}

/// Parameters for the image generation tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GenerateParams {
    /// Text description of the image to generate
    pub prompt: String,

    /// Image size (default: 1024x1024)
    #[serde(default)]
    pub size: Option<ImageSize>,
}

fn require_key(state: &ServerState, purpose: &str) -> McpResult<()> {
    if state.vision.has_api_key() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "ZHIPUAI_API_KEY environment variable is required for {purpose}"
        ))
        .into())
    }
}

/// Handle an image understanding request, returning the model's answer
#[tracing::instrument(skip(state, params))]
pub async fn handle_understand(state: &ServerState, params: UnderstandParams) -> McpResult<String> {
    require_key(state, "image understanding")?;
    let thinking = params.thinking.unwrap_or(true);
    Ok(state
        .vision
        .understand(&params.file, &params.prompt, thinking)
        .await?)
}

/// Handle an image generation request, returning the image URL
#[tracing::instrument(skip(state, params))]
pub async fn handle_generate(state: &ServerState, params: GenerateParams) -> McpResult<String> {
    require_key(state, "image generation")?;
    let size = params.size.map(ImageSize::as_str);
    Ok(state.vision.generate(&params.prompt, size).await?)
}
