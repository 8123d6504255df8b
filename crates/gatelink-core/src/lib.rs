//! # gatelink-core
//!
//! Core functionality for gatelink - web search, URL reading and image tools
//! routed through a self-hosted gateway.
//!
//! The gateway turns any web page into markdown (`/api/read/{url}`) and runs
//! web searches (`/api/firecrawl-search`). This crate wraps both endpoints,
//! keeps recently read pages in a TTL cache, and lets callers slice large
//! pages by section, paragraph range or character window without refetching.
//! It also carries clients for the vision model API and a PaddleOCR service.
//!
//! ## Architecture
//!
//! - **Configuration**: environment-driven settings with validation ([`config`])
//! - **Reading**: gateway fetch, caching and slicing ([`reader`], [`cache`], [`extract`])
//! - **Search**: gateway web search ([`search`])
//! - **Images**: vision understanding and generation ([`vision`]), OCR ([`ocr`])
//! - **Error Handling**: categorized errors with user-facing guidance ([`error`], [`classify`])
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatelink_core::{Config, ContentCache, PaginationOptions, UrlReader};
//!
//! # async fn run() -> gatelink_core::Result<()> {
//! let config = Config::from_env();
//! config.validate()?;
//!
//! let cache = Arc::new(ContentCache::new(config.reader.cache_ttl));
//! let reader = UrlReader::new(&config, cache)?;
//!
//! let options = PaginationOptions::new().with_section("Installation");
//! let outcome = reader
//!     .fetch_and_convert("https://example.com/docs", None, &options)
//!     .await?;
//! println!("{}", outcome.into_text()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure maps to an [`ErrorCategory`], and its display text is the
//! message shown to the end user:
//!
//! ```rust
//! use gatelink_core::{Error, ErrorCategory};
//!
//! let err = Error::InvalidUrl { url: "not a url".into() };
//! assert_eq!(err.category(), ErrorCategory::UrlFormat);
//! assert!(err.to_string().contains("Invalid URL"));
//! ```

/// In-memory TTL cache for fetched page content
pub mod cache;
/// Translation of transport and status failures into user-facing errors
pub mod classify;
/// Environment-driven configuration
pub mod config;
/// Error types and result aliases
pub mod error;
/// Markdown slicing: headings, sections, paragraph ranges, character windows
pub mod extract;
/// File input classification and base64 encoding
pub mod files;
/// Shared HTTP client construction
pub mod http;
/// PaddleOCR client
pub mod ocr;
/// Gateway URL reader
pub mod reader;
/// Gateway web search
pub mod search;
/// Vision model client
pub mod vision;

// Re-export commonly used types
pub use cache::{Clock, ContentCache, ManualClock, SystemClock};
pub use config::{Config, ConfigSummary};
pub use error::{Error, ErrorCategory, Party, Result};
pub use extract::PaginationOptions;
pub use ocr::{OcrClient, OcrResult};
pub use reader::{ReadOutcome, ReadResult, UrlReader};
pub use search::{GatewaySearch, SearchHit, SearchResults};
pub use vision::VisionClient;
