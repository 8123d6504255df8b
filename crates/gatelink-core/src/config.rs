//! Runtime configuration.
//!
//! Configuration is an explicit value passed into the reader, the search
//! client and the other upstream clients at construction time. It is usually
//! built from the process environment with [`Config::from_env`], but tests
//! (and embedders) can assemble it directly or through [`Config::from_lookup`].
//!
//! ## Environment variables
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `GATEWAY_URL` | Base URL of the search/read gateway |
//! | `AUTH_USERNAME` / `AUTH_PASSWORD` | Basic auth for gateway search |
//! | `USER_AGENT` | User-Agent sent to the gateway |
//! | `HTTP_PROXY` / `HTTPS_PROXY` / `NO_PROXY` | Outbound proxy (lowercase forms accepted) |
//! | `ZHIPUAI_API_KEY` | Key for the vision and image generation API |
//! | `PADDLEOCR_URL` | Base URL of the OCR service |
//! | `MAX_IMAGE_SIZE` | Largest local image accepted for OCR, in bytes |
//! | `GATELINK_READ_TIMEOUT_MS` | Timer applied to URL reads |
//! | `GATELINK_CACHE_TTL_SECS` | Lifetime of cached pages |
//!
//! ```rust
//! use gatelink_core::Config;
//!
//! let config = Config::from_lookup(|key| match key {
//!     "GATEWAY_URL" => Some("http://gateway.local:80".to_string()),
//!     _ => None,
//! });
//! assert!(config.validate().is_ok());
//! assert_eq!(config.gateway.base_url.as_deref(), Some("http://gateway.local:80"));
//! ```

use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::{Error, Result};

/// Default timer applied to URL reads.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Default lifetime of a cached page.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Default vision API base.
pub const DEFAULT_VISION_BASE_URL: &str = "https://open.bigmodel.cn/api/paas/v4";

/// Default OCR service base.
pub const DEFAULT_OCR_BASE_URL: &str = "http://paddleocr-service:8080";

/// Default OCR image size limit (10 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// Default OCR request timeout.
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

/// Message used when a gateway-backed tool runs without `GATEWAY_URL`.
pub const GATEWAY_URL_REQUIRED_MESSAGE: &str =
    "GATEWAY_URL is required. Set it to your Gateway API URL (e.g., http://your-gateway.com:80)";

/// Message used when a vision tool runs without `ZHIPUAI_API_KEY`.
pub const VISION_KEY_REQUIRED_MESSAGE: &str = "ZHIPUAI_API_KEY environment variable is required";

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Gateway (search and read) settings.
    pub gateway: GatewayConfig,
    /// Outbound proxy settings.
    pub proxy: ProxyConfig,
    /// Vision / image generation API settings.
    pub vision: VisionConfig,
    /// OCR service settings.
    pub ocr: OcrConfig,
    /// URL reader settings.
    pub reader: ReaderConfig,
}

/// Gateway connection settings.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Base URL, e.g. `http://gateway.local:80`.
    pub base_url: Option<String>,
    /// Basic auth username for search requests.
    pub username: Option<String>,
    /// Basic auth password for search requests.
    pub password: Option<String>,
    /// User-Agent header override.
    pub user_agent: Option<String>,
}

impl GatewayConfig {
    /// Credentials, only when both halves are present.
    pub fn auth(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }

    /// Base URL or a configuration error.
    pub fn require_base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .ok_or_else(|| Error::Config(GATEWAY_URL_REQUIRED_MESSAGE.to_string()))
    }
}

/// Outbound proxy settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy for plain HTTP requests.
    pub http: Option<String>,
    /// Proxy for HTTPS requests.
    pub https: Option<String>,
    /// Comma separated hosts that bypass the proxy.
    pub no_proxy: Option<String>,
}

impl ProxyConfig {
    /// Whether any proxy is configured.
    pub const fn is_configured(&self) -> bool {
        self.http.is_some() || self.https.is_some()
    }
}

/// Vision API settings.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Bearer key; vision tools fail with a configuration error without it.
    pub api_key: Option<String>,
    /// API base URL.
    pub base_url: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_VISION_BASE_URL.to_string(),
        }
    }
}

/// OCR service settings.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Service base URL; requests go to `{base_url}/ocr`.
    pub base_url: String,
    /// Largest local image accepted, in bytes.
    pub max_image_bytes: u64,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OCR_BASE_URL.to_string(),
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }
}

/// URL reader settings.
#[derive(Debug, Clone, Copy)]
pub struct ReaderConfig {
    /// Timer applied to each gateway read.
    pub timeout: Duration,
    /// Cache entry lifetime.
    pub cache_ttl: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_READ_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Redacted view of the configuration for diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSummary {
    /// Gateway URL or `"Not configured"`.
    pub gateway_url: String,
    /// Both auth credentials are set.
    pub has_auth: bool,
    /// A proxy is set.
    pub has_proxy: bool,
    /// A proxy bypass list is set.
    pub has_no_proxy: bool,
    /// The vision API key is set.
    pub has_vision_key: bool,
    /// OCR service base URL.
    pub ocr_url: String,
    /// Read timer in milliseconds.
    pub read_timeout_ms: u128,
    /// Cache lifetime in seconds.
    pub cache_ttl_secs: u64,
}

impl Config {
    /// Build configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. Unparsable numeric values fall back
    /// to their defaults with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let either = |upper: &str, lower: &str| get(upper).or_else(|| get(lower));

        let reader = ReaderConfig {
            timeout: parse_number(&get, "GATELINK_READ_TIMEOUT_MS")
                .map_or(DEFAULT_READ_TIMEOUT, Duration::from_millis),
            cache_ttl: parse_number(&get, "GATELINK_CACHE_TTL_SECS")
                .map_or(DEFAULT_CACHE_TTL, Duration::from_secs),
        };

        Self {
            gateway: GatewayConfig {
                base_url: get("GATEWAY_URL"),
                username: get("AUTH_USERNAME"),
                password: get("AUTH_PASSWORD"),
                user_agent: get("USER_AGENT"),
            },
            proxy: ProxyConfig {
                http: either("HTTP_PROXY", "http_proxy"),
                https: either("HTTPS_PROXY", "https_proxy"),
                no_proxy: either("NO_PROXY", "no_proxy"),
            },
            vision: VisionConfig {
                api_key: get("ZHIPUAI_API_KEY"),
                ..VisionConfig::default()
            },
            ocr: OcrConfig {
                base_url: get("PADDLEOCR_URL").unwrap_or_else(|| DEFAULT_OCR_BASE_URL.to_string()),
                max_image_bytes: parse_number(&get, "MAX_IMAGE_SIZE")
                    .unwrap_or(DEFAULT_MAX_IMAGE_BYTES),
                ..OcrConfig::default()
            },
            reader,
        }
    }

    /// Check for problems that would make gateway tools fail.
    ///
    /// Reports an invalid `GATEWAY_URL` (bad format or non-HTTP protocol) and
    /// auth credentials that are only half set. A missing gateway URL is not
    /// an issue here; gateway tools report it when they are called.
    pub fn validate(&self) -> Result<()> {
        let mut issues = Vec::new();

        if let Some(base) = &self.gateway.base_url {
            match url::Url::parse(base) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {},
                Ok(parsed) => {
                    issues.push(format!(
                        "GATEWAY_URL has invalid protocol: {}:",
                        parsed.scheme()
                    ));
                },
                Err(_) => issues.push(format!("GATEWAY_URL has invalid format: {base}")),
            }
        }

        match (&self.gateway.username, &self.gateway.password) {
            (Some(_), None) => {
                issues.push("AUTH_USERNAME is set but AUTH_PASSWORD is missing".to_string());
            },
            (None, Some(_)) => {
                issues.push("AUTH_PASSWORD is set but AUTH_USERNAME is missing".to_string());
            },
            _ => {},
        }

        if issues.is_empty() {
            return Ok(());
        }

        Err(Error::Config(format!(
            "Configuration Issues: {}. GATEWAY_URL must be set to a valid HTTP(S) URL",
            issues.join(", ")
        )))
    }

    /// Redacted summary suitable for logging or a config resource.
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            gateway_url: self
                .gateway
                .base_url
                .clone()
                .unwrap_or_else(|| "Not configured".to_string()),
            has_auth: self.gateway.auth().is_some(),
            has_proxy: self.proxy.is_configured(),
            has_no_proxy: self.proxy.no_proxy.is_some(),
            has_vision_key: self.vision.api_key.is_some(),
            ocr_url: self.ocr.base_url.clone(),
            read_timeout_ms: self.reader.timeout.as_millis(),
            cache_ttl_secs: self.reader.cache_ttl.as_secs(),
        }
    }
}

fn parse_number<G>(get: &G, key: &str) -> Option<u64>
where
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key)?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = key, value = %raw, "ignoring non-numeric setting");
            None
        },
    }
}
