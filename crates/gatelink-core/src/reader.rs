//! URL reading through the gateway.
//!
//! [`UrlReader::fetch_and_convert`] is the whole pipeline: cache lookup,
//! URL validation, a gateway fetch raced against a timer, cache population
//! and finally extraction of the requested view.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatelink_core::{Config, ContentCache, PaginationOptions, UrlReader};
//!
//! # async fn example() -> gatelink_core::Result<()> {
//! let config = Config::from_env();
//! let cache = Arc::new(ContentCache::new(config.reader.cache_ttl));
//! let reader = UrlReader::new(&config, cache)?;
//!
//! let outcome = reader
//!     .fetch_and_convert(
//!         "https://example.com/docs",
//!         None,
//!         &PaginationOptions::new().with_read_headings(true),
//!     )
//!     .await?;
//! println!("{}", outcome.into_text()?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{debug, info, instrument, warn};

use crate::cache::ContentCache;
use crate::classify::{self, Failure, FailureContext};
use crate::config::{Config, DEFAULT_READ_TIMEOUT};
use crate::extract::{PaginationOptions, extract};
use crate::http::build_client;
use crate::{Error, Result};

/// Result of a successful read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    /// URL as requested.
    pub url: String,
    /// Extracted view of the page.
    pub content: String,
    /// Length of `content` in characters.
    pub char_count: usize,
    /// Time spent serving the request, rendered as `"<n>ms"`.
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
    /// Whether the page came from the cache.
    pub cached: bool,
}

pub(crate) fn serialize_millis<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{}ms", duration.as_millis()))
}

/// What a read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The page was read and extracted.
    Page(ReadResult),
    /// The gateway returned blank content; `warning` explains it.
    EmptyContent {
        /// URL as requested.
        url: String,
        /// Human-readable warning.
        warning: String,
    },
}

impl ReadOutcome {
    /// Render the outcome as tool output: pretty JSON for a page, the
    /// warning text otherwise.
    pub fn into_text(self) -> Result<String> {
        match self {
            Self::Page(result) => Ok(serde_json::to_string_pretty(&result)?),
            Self::EmptyContent { warning, .. } => Ok(warning),
        }
    }

    /// The page result, if any.
    pub const fn as_page(&self) -> Option<&ReadResult> {
        match self {
            Self::Page(result) => Some(result),
            Self::EmptyContent { .. } => None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayReadResponse {
    content: Option<String>,
    title: Option<String>,
    word_count: Option<u64>,
}

/// Reads pages through the gateway's `/api/read` endpoint.
#[derive(Debug, Clone)]
pub struct UrlReader {
    client: Client,
    gateway_url: Option<String>,
    default_timeout: Duration,
    cache: Arc<ContentCache>,
}

impl UrlReader {
    /// Build a reader from configuration, sharing `cache`.
    pub fn new(config: &Config, cache: Arc<ContentCache>) -> Result<Self> {
        let client = build_client(&config.proxy, config.gateway.user_agent.as_deref())?;
        Ok(Self::with_client(client, config.gateway.base_url.clone(), cache)
            .with_default_timeout(config.reader.timeout))
    }

    /// Build a reader around an existing client.
    pub const fn with_client(
        client: Client,
        gateway_url: Option<String>,
        cache: Arc<ContentCache>,
    ) -> Self {
        Self {
            client,
            gateway_url,
            default_timeout: DEFAULT_READ_TIMEOUT,
            cache,
        }
    }

    /// Timer used when a call does not pass its own.
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// The shared cache.
    pub const fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// Read `url` and return the requested view of it.
    ///
    /// A cached page is served without touching the network. On a miss the
    /// page is fetched from the gateway within `timeout` (or the reader's
    /// default), cached under `url` and then extracted.
    #[instrument(skip(self, options), fields(url = %url))]
    pub async fn fetch_and_convert(
        &self,
        url: &str,
        timeout: Option<Duration>,
        options: &PaginationOptions,
    ) -> Result<ReadOutcome> {
        let started = Instant::now();

        if let Some(cached) = self.cache.get(url).await {
            let content = extract(&cached, options);
            let result = ReadResult {
                url: url.to_string(),
                char_count: content.chars().count(),
                content,
                duration: started.elapsed(),
                cached: true,
            };
            info!(
                chars = result.char_count,
                elapsed_ms = result.duration.as_millis(),
                cached = true,
                "served url from cache"
            );
            return Ok(ReadOutcome::Page(result));
        }

        if url::Url::parse(url).is_err() {
            warn!("invalid url format");
            return Err(Error::InvalidUrl {
                url: url.to_string(),
            });
        }

        let gateway = self.gateway_base()?;
        let endpoint = format!(
            "{}/api/read/{}",
            gateway.trim_end_matches('/'),
            urlencoding::encode(url)
        );
        let timeout = timeout.unwrap_or(self.default_timeout);
        let ctx = FailureContext::new(url)
            .with_gateway(gateway)
            .with_timeout(timeout);

        debug!(%endpoint, timeout_ms = timeout.as_millis(), "fetching through gateway");

        // Dropping the request future on expiry aborts the in-flight fetch.
        let fetched = tokio::time::timeout(timeout, self.fetch_markdown(&endpoint, &ctx)).await;
        let markdown = match fetched {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis(), "gateway read timed out");
                return Err(classify::timeout_error(url, timeout));
            },
        };

        if markdown.trim().is_empty() {
            warn!("gateway returned empty content");
            return Ok(ReadOutcome::EmptyContent {
                url: url.to_string(),
                warning: classify::empty_content_warning(url),
            });
        }

        let markdown: Arc<str> = Arc::from(markdown);
        self.cache.set(url, Arc::clone(&markdown)).await;

        let content = extract(&markdown, options);
        let result = ReadResult {
            url: url.to_string(),
            char_count: content.chars().count(),
            content,
            duration: started.elapsed(),
            cached: false,
        };
        info!(
            chars = result.char_count,
            elapsed_ms = result.duration.as_millis(),
            cached = false,
            "fetched and converted url"
        );
        Ok(ReadOutcome::Page(result))
    }

    fn gateway_base(&self) -> Result<&str> {
        self.gateway_url.as_deref().ok_or_else(|| {
            Error::Config(crate::config::GATEWAY_URL_REQUIRED_MESSAGE.to_string())
        })
    }

    async fn fetch_markdown(&self, endpoint: &str, ctx: &FailureContext) -> Result<String> {
        let response = self
            .client
            .get(endpoint)
            .send()
            .await
            .map_err(|e| classify::classify(&Failure::from(&e), ctx))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "gateway returned failure status");
            return Err(classify::classify(&Failure::from_status(status), ctx));
        }

        let body = response.bytes().await.map_err(|e| content_error(&e, ctx))?;
        let parsed: GatewayReadResponse =
            serde_json::from_slice(&body).map_err(|e| content_error(&e, ctx))?;

        debug!(
            title = parsed.title.as_deref().unwrap_or_default(),
            word_count = parsed.word_count.unwrap_or_default(),
            "gateway response parsed"
        );

        parsed.content.ok_or_else(|| Error::Content {
            message: "Gateway API returned empty content field.".to_string(),
            url: ctx.url.clone(),
        })
    }
}

fn content_error(err: &dyn std::fmt::Display, ctx: &FailureContext) -> Error {
    Error::Content {
        message: format!("Failed to read gateway response: {err}"),
        url: ctx.url.clone(),
    }
}
