//! Helpers for file-like tool inputs.
//!
//! Vision and OCR tools accept a local path, an http(s) URL, a `data:` URL or
//! bare base64. [`InputSource::classify`] tells them apart and
//! [`to_data_url`] turns anything local into something the upstream API can
//! fetch.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose::STANDARD};
use mime_guess::Mime;
use regex::Regex;

use crate::{Error, Result};

#[allow(clippy::unwrap_used)]
static BARE_BASE64: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/=]{20,}$").unwrap());

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "webm"];
const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "txt", "doc", "docx", "xls", "xlsx"];

/// Fallback MIME type for unknown extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Broad kind of media a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// PDF, text or office document.
    Document,
}

impl MediaKind {
    /// MIME type assumed for bare base64 of this kind.
    pub const fn default_mime(self) -> &'static str {
        match self {
            Self::Image => "image/png",
            Self::Video => "video/mp4",
            Self::Document => OCTET_STREAM,
        }
    }
}

/// Where a file input points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// A `data:` URL, used as-is.
    DataUrl(String),
    /// An http(s) URL the upstream fetches itself.
    Remote(String),
    /// Bare base64 without a MIME prefix.
    Base64(String),
    /// A path on the local filesystem.
    Local(PathBuf),
}

impl InputSource {
    /// Classify a raw tool input.
    ///
    /// ```rust
    /// use gatelink_core::files::InputSource;
    ///
    /// assert!(matches!(InputSource::classify("https://x.io/a.png"), InputSource::Remote(_)));
    /// assert!(matches!(InputSource::classify("./shot.png"), InputSource::Local(_)));
    /// ```
    pub fn classify(input: &str) -> Self {
        if input.starts_with("data:") {
            Self::DataUrl(input.to_string())
        } else if input.starts_with("http://") || input.starts_with("https://") {
            Self::Remote(input.to_string())
        } else if BARE_BASE64.is_match(input) {
            Self::Base64(input.to_string())
        } else {
            Self::Local(PathBuf::from(input))
        }
    }

    /// Whether the input names a local file.
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

/// Lowercased extension of `path` without the dot, if any.
pub fn file_extension(path: &str) -> Option<String> {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Media kind implied by the extension of `path`.
pub fn detect_media_kind(path: &str) -> Option<MediaKind> {
    let ext = file_extension(path)?;
    let ext = ext.as_str();
    if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else if DOCUMENT_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Document)
    } else {
        None
    }
}

/// MIME type implied by the extension of `path`, or `application/octet-stream`.
pub fn mime_type(path: &str) -> Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}

/// Read a local file as standard base64.
pub async fn read_as_base64(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        Error::InvalidInput(format!("Failed to read file: {}. Error: {e}", path.display()))
    })?;
    Ok(STANDARD.encode(bytes))
}

/// Turn any file input into a URL the upstream API accepts.
///
/// Local files are inlined as `data:` URLs; remote and `data:` URLs pass
/// through unchanged; bare base64 gets a MIME prefix.
pub async fn to_data_url(input: &str) -> Result<String> {
    match InputSource::classify(input) {
        InputSource::Local(path) => {
            let encoded = read_as_base64(&path).await?;
            Ok(format!("data:{};base64,{encoded}", mime_type(input)))
        },
        InputSource::Base64(raw) => {
            let mime = detect_media_kind(&raw).map_or(OCTET_STREAM, MediaKind::default_mime);
            Ok(format!("data:{mime};base64,{raw}"))
        },
        InputSource::DataUrl(url) | InputSource::Remote(url) => Ok(url),
    }
}
