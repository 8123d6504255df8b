//! Client for the vision (image understanding) and image generation API.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::classify::{self, Failure, FailureContext};
use crate::config::{Config, DEFAULT_VISION_BASE_URL, VISION_KEY_REQUIRED_MESSAGE};
use crate::files::{self, MediaKind};
use crate::http::build_client;
use crate::{Error, Result};

/// Model used for understanding images, videos and documents.
pub const VISION_MODEL: &str = "glm-4.6v-flash";

/// Model used for image generation.
pub const IMAGE_MODEL: &str = "cogview-3-flash";

/// Longest accepted generation prompt, in characters.
pub const MAX_PROMPT_CHARS: usize = 4000;

/// Size used when the caller does not pick one.
pub const DEFAULT_IMAGE_SIZE: &str = "1024x1024";

/// Accepted generation sizes.
pub const IMAGE_SIZES: &[&str] = &[
    "1024x1024",
    "768x1344",
    "864x1152",
    "1344x768",
    "1152x864",
    "1440x720",
    "720x1440",
];

/// One part of a multimodal user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
    /// An image by URL or data URL.
    ImageUrl {
        /// Location of the image.
        image_url: MediaUrl,
    },
    /// A video by URL or data URL.
    VideoUrl {
        /// Location of the video.
        video_url: MediaUrl,
    },
    /// Any other file by URL or data URL.
    FileUrl {
        /// Location of the file.
        file_url: MediaUrl,
    },
}

/// `{ "url": ... }` wrapper used by media parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaUrl {
    /// URL or data URL.
    pub url: String,
}

impl ContentPart {
    /// Media part for `url`, typed by the extension of the original input.
    pub fn media(url: String, original_input: &str) -> Self {
        let media = MediaUrl { url };
        match files::detect_media_kind(original_input) {
            Some(MediaKind::Image) => Self::ImageUrl { image_url: media },
            Some(MediaKind::Video) => Self::VideoUrl { video_url: media },
            Some(MediaKind::Document) | None => Self::FileUrl { file_url: media },
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

/// Bearer-authenticated client for the vision API.
#[derive(Debug, Clone)]
pub struct VisionClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl VisionClient {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_client(&config.proxy, None)?;
        Ok(Self::with_client(
            client,
            config.vision.base_url.clone(),
            config.vision.api_key.clone(),
        ))
    }

    /// Build a client around an existing HTTP client.
    pub const fn with_client(client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    /// Whether an API key is configured.
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Ask the vision model about `file` (path, URL or base64).
    #[instrument(skip(self, file, prompt))]
    pub async fn understand(&self, file: &str, prompt: &str, thinking: bool) -> Result<String> {
        if file.trim().is_empty() {
            return Err(Error::InvalidInput("At least one file is required".to_string()));
        }
        if prompt.trim().is_empty() {
            return Err(Error::InvalidInput("Prompt is required".to_string()));
        }

        let data_url = files::to_data_url(file).await?;
        let content = vec![
            ContentPart::media(data_url, file),
            ContentPart::Text {
                text: prompt.to_string(),
            },
        ];
        let body = json!({
            "model": VISION_MODEL,
            "messages": [{ "role": "user", "content": content }],
            "thinking": { "type": if thinking { "enabled" } else { "disabled" } },
        });

        let response = self.post("/chat/completions", &body).await?;
        let parsed: ChatResponse = response.json().await.map_err(|e| {
            Error::Unexpected(format!("Failed to parse vision API response: {e}"))
        })?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::Unexpected("No response from vision API".to_string()))?;

        info!(chars = answer.chars().count(), "vision answer received");
        Ok(answer)
    }

    /// Generate an image from `prompt`, returning its URL.
    #[instrument(skip(self, prompt))]
    pub async fn generate(&self, prompt: &str, size: Option<&str>) -> Result<String> {
        validate_generation(prompt, size)?;
        let size = size.unwrap_or(DEFAULT_IMAGE_SIZE);

        let body = json!({
            "model": IMAGE_MODEL,
            "prompt": prompt,
            "size": size,
        });

        let response = self.post("/images/generations", &body).await?;
        let parsed: ImageResponse = response.json().await.map_err(|e| {
            Error::Unexpected(format!("Failed to parse image generation response: {e}"))
        })?;

        let url = parsed
            .data
            .into_iter()
            .next()
            .and_then(|image| image.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| Error::Unexpected("No images generated".to_string()))?;

        info!(%url, "image generated");
        Ok(url)
    }

    async fn post(&self, endpoint: &str, body: &serde_json::Value) -> Result<Response> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config(VISION_KEY_REQUIRED_MESSAGE.to_string()))?;
        let base = if self.base_url.is_empty() {
            DEFAULT_VISION_BASE_URL
        } else {
            self.base_url.trim_end_matches('/')
        };

        let url = format!("{base}{endpoint}");
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| classify::classify(&Failure::from(&e), &FailureContext::new(&url)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ApiErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .and_then(|detail| detail.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        warn!(status = status.as_u16(), %message, "vision API rejected request");

        Err(Error::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Check a generation request before it is sent.
pub fn validate_generation(prompt: &str, size: Option<&str>) -> Result<()> {
    if prompt.trim().is_empty() {
        return Err(Error::InvalidInput("Prompt is required".to_string()));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(Error::InvalidInput(format!(
            "Prompt is too long (max {MAX_PROMPT_CHARS} characters)"
        )));
    }
    if let Some(size) = size.filter(|s| !IMAGE_SIZES.contains(s)) {
        return Err(Error::InvalidInput(format!(
            "Invalid size: {size}. Must be one of: {}",
            IMAGE_SIZES.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ErrorCategory;
    use crate::config::ProxyConfig;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> VisionClient {
        let http = build_client(&ProxyConfig::default(), None).unwrap();
        VisionClient::with_client(http, server.uri(), key.map(str::to_string))
    }

    #[tokio::test]
    async fn test_understand_sends_media_then_prompt() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": VISION_MODEL,
                "thinking": {"type": "disabled"},
                "messages": [{
                    "role": "user",
                    "content": [
                        {"type": "image_url", "image_url": {"url": "https://example.com/cat.png"}},
                        {"type": "text", "text": "What is this?"}
                    ]
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "A cat."}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = client_for(&server, Some("sk-test"))
            .understand("https://example.com/cat.png", "What is this?", false)
            .await?;
        assert_eq!(answer, "A cat.");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k"))
            .understand("https://example.com/a.mp4", "describe", true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("No response from vision API"));
    }

    #[tokio::test]
    async fn test_generate_returns_first_url() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/images/generations"))
            .and(body_partial_json(json!({"model": IMAGE_MODEL, "size": "768x1344"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"url": "https://cdn.example.com/1.png"}, {"url": "https://cdn.example.com/2.png"}]
            })))
            .mount(&server)
            .await;

        let url = client_for(&server, Some("k"))
            .generate("a lighthouse at dusk", Some("768x1344"))
            .await?;
        assert_eq!(url, "https://cdn.example.com/1.png");
        Ok(())
    }

    #[tokio::test]
    async fn test_no_images_generated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let err = client_for(&server, Some("k")).generate("x", None).await.unwrap_err();
        assert_eq!(err.to_string(), "❓ Unexpected Error: No images generated");
    }

    #[tokio::test]
    async fn test_error_prefix_mapping() {
        let cases = [
            (401_u16, Some("invalid api key"), "Authentication failed: invalid api key"),
            (503, None, "Server error: HTTP 503"),
            (400, Some("bad size"), "API error: bad size"),
        ];

        for (status, message, expected) in cases {
            let server = MockServer::start().await;
            let template = match message {
                Some(m) => ResponseTemplate::new(status)
                    .set_body_json(json!({"error": {"code": "1", "message": m}})),
                None => ResponseTemplate::new(status).set_body_string("upstream down"),
            };
            Mock::given(method("POST")).respond_with(template).mount(&server).await;

            let err = client_for(&server, Some("k")).generate("x", None).await.unwrap_err();
            assert_eq!(err.category(), ErrorCategory::ServerHttp);
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_missing_key_is_configuration_error() {
        let server = MockServer::start().await;
        let err = client_for(&server, None).generate("x", None).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains(VISION_KEY_REQUIRED_MESSAGE));
    }

    #[test]
    fn test_generation_validation() {
        assert!(validate_generation("ok", None).is_ok());
        assert!(validate_generation("ok", Some("1440x720")).is_ok());
        assert!(validate_generation("   ", None).is_err());
        assert!(validate_generation(&"x".repeat(MAX_PROMPT_CHARS + 1), None).is_err());
        let err = validate_generation("ok", Some("999x999")).unwrap_err();
        assert!(err.to_string().contains("Invalid size: 999x999"));
    }

    #[test]
    fn test_content_part_serialization() {
        let part = ContentPart::media("data:video/mp4;base64,AA".into(), "clip.mp4");
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value, json!({"type": "video_url", "video_url": {"url": "data:video/mp4;base64,AA"}}));

        let doc = ContentPart::media("https://x/report".into(), "https://x/report");
        assert!(matches!(doc, ContentPart::FileUrl { .. }));
    }
}
