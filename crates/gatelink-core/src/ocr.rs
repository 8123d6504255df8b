//! Client for the PaddleOCR text extraction service.
//!
//! The service only decodes `data:image/...;base64` payloads, so local files
//! are inlined before the request is sent. Remote URLs and data URLs pass
//! through untouched.

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::classify::TransportFailure;
use crate::config::{Config, DEFAULT_MAX_IMAGE_BYTES, DEFAULT_OCR_BASE_URL, DEFAULT_OCR_TIMEOUT};
use crate::error::ErrorCategory;
use crate::files;
use crate::http::build_client;
use crate::{Error, Result};

/// Extensions accepted for local images.
pub const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Confidence assumed when the service omits one.
pub const DEFAULT_CONFIDENCE: f64 = 0.9;

/// Below this confidence the result carries a warning.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Warning attached to low-confidence results.
pub const LOW_CONFIDENCE_WARNING: &str = "Low confidence score, image quality may be poor";

/// Message used when the service refuses connections.
pub const SERVICE_DOWN_MESSAGE: &str = "OCR service is not running. Start the paddleocr-service container using: docker-compose up -d paddleocr-service";

/// One recognized line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrBlock {
    /// Recognized text.
    pub text: String,
    /// Bounding polygon as reported by the service.
    #[serde(rename = "box")]
    pub bounding_box: Value,
    /// Recognition confidence.
    pub confidence: f64,
}

/// Extracted text plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OcrResult {
    /// Always `true` for a returned result.
    pub success: bool,
    /// Full text, one line per block.
    pub text: String,
    /// Average confidence.
    pub confidence: f64,
    /// Detected language.
    pub language: String,
    /// Wall time, formatted as seconds with two decimals (`"1.25s"`).
    pub processing_time: String,
    /// Engine name.
    pub engine: &'static str,
    /// Per-line details, when the service provides them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Vec<OcrBlock>>,
    /// Quality warning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceResponse {
    text: Option<String>,
    confidence: Option<f64>,
    language: Option<String>,
    blocks: Option<Vec<OcrBlock>>,
}

/// HTTP client for the OCR service.
#[derive(Debug, Clone)]
pub struct OcrClient {
    client: Client,
    base_url: String,
    max_image_bytes: u64,
    timeout: Duration,
}

fn ocr_error(kind: ErrorCategory, message: impl Into<String>) -> Error {
    Error::Ocr {
        kind,
        message: message.into(),
    }
}

impl OcrClient {
    /// Build a client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_client(&config.proxy, None)?;
        Ok(Self::with_client(client, config.ocr.base_url.clone())
            .with_max_image_bytes(config.ocr.max_image_bytes)
            .with_timeout(config.ocr.timeout))
    }

    /// Build a client around an existing HTTP client.
    pub const fn with_client(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }

    /// Largest local image accepted.
    #[must_use]
    pub const fn with_max_image_bytes(mut self, bytes: u64) -> Self {
        self.max_image_bytes = bytes;
        self
    }

    /// Request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract text from `image` (local path, http(s) URL or image data URL).
    #[instrument(skip(self, image))]
    pub async fn extract_text(&self, image: &str, lang: Option<&str>) -> Result<OcrResult> {
        let started = Instant::now();
        let payload = self.prepare_image(image).await?;
        let lang = lang.filter(|l| !l.is_empty()).unwrap_or("auto");

        let base = if self.base_url.is_empty() {
            DEFAULT_OCR_BASE_URL
        } else {
            self.base_url.trim_end_matches('/')
        };
        let request = self
            .client
            .post(format!("{base}/ocr"))
            .json(&json!({ "image": payload, "lang": lang }))
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Err(_) => {
                warn!(timeout_ms = self.timeout.as_millis(), "ocr request timed out");
                return Err(ocr_error(
                    ErrorCategory::Timeout,
                    format!("OCR request timeout ({}ms)", self.timeout.as_millis()),
                ));
            },
            Ok(Err(e)) => return Err(transport_error(&e)),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ocr_error(
                ErrorCategory::ServerHttp,
                format!(
                    "OCR service error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or_default()
                ),
            ));
        }

        let parsed: ServiceResponse = response.json().await.map_err(|e| {
            ocr_error(
                ErrorCategory::ContentMissing,
                format!("OCR request failed: {e}"),
            )
        })?;

        let confidence = parsed.confidence.unwrap_or(DEFAULT_CONFIDENCE);
        let result = OcrResult {
            success: true,
            text: parsed.text.unwrap_or_default(),
            confidence,
            language: parsed.language.unwrap_or_else(|| "unknown".to_string()),
            processing_time: format_processing_time(started.elapsed()),
            engine: "paddleocr",
            blocks: parsed.blocks,
            warning: (confidence < LOW_CONFIDENCE_THRESHOLD)
                .then(|| LOW_CONFIDENCE_WARNING.to_string()),
        };

        info!(
            chars = result.text.chars().count(),
            confidence,
            language = %result.language,
            "ocr completed"
        );
        Ok(result)
    }

    async fn prepare_image(&self, image: &str) -> Result<String> {
        if image.starts_with("http://")
            || image.starts_with("https://")
            || image.starts_with("data:image")
        {
            return Ok(image.to_string());
        }

        let ext = files::file_extension(image);
        if !ext.as_deref().is_some_and(|e| SUPPORTED_FORMATS.contains(&e)) {
            return Err(ocr_error(
                ErrorCategory::Input,
                format!(
                    "Unsupported image format: {}. Supported formats: {}",
                    ext.as_deref().unwrap_or("none"),
                    SUPPORTED_FORMATS.join(", ")
                ),
            ));
        }

        let path = Path::new(image);
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ocr_error(ErrorCategory::Input, format!("Image file not found: {image}"))
            } else {
                ocr_error(ErrorCategory::Io, format!("Failed to access image file: {image}"))
            }
        })?;
        if metadata.len() > self.max_image_bytes {
            return Err(ocr_error(
                ErrorCategory::Input,
                format!(
                    "Image too large: {} bytes (max: {} bytes)",
                    metadata.len(),
                    self.max_image_bytes
                ),
            ));
        }

        let encoded = files::read_as_base64(path).await?;
        Ok(format!("data:{};base64,{encoded}", files::mime_type(image)))
    }
}

fn transport_error(err: &reqwest::Error) -> Error {
    match TransportFailure::from_reqwest(err) {
        TransportFailure::ConnectionRefused => ocr_error(ErrorCategory::Network, SERVICE_DOWN_MESSAGE),
        TransportFailure::TimedOut => ocr_error(ErrorCategory::Timeout, format!("OCR request failed: {err}")),
        TransportFailure::Dns => ocr_error(ErrorCategory::Dns, format!("OCR request failed: {err}")),
        TransportFailure::Tls(_) => ocr_error(ErrorCategory::Tls, format!("OCR request failed: {err}")),
        TransportFailure::FetchFailed | TransportFailure::Other(_) => {
            ocr_error(ErrorCategory::Network, format!("OCR request failed: {err}"))
        },
    }
}

/// `1234ms` → `"1.23s"`.
pub fn format_processing_time(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}
