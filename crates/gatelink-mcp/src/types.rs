//! Common types for the gatelink MCP server

use std::sync::Arc;

use gatelink_core::{Config, ContentCache, GatewaySearch, OcrClient, UrlReader, VisionClient};

use crate::error::McpResult;

/// Clients and configuration shared by every tool call
#[derive(Debug)]
pub struct ServerState {
    /// Configuration the server was started with
    pub config: Config,
    /// Gateway URL reader, owning the shared content cache
    pub reader: UrlReader,
    /// Gateway web search
    pub search: GatewaySearch,
    /// Vision model client
    pub vision: VisionClient,
    /// OCR service client
    pub ocr: OcrClient,
}

impl ServerState {
    /// Build every client from `config`.
    pub fn from_config(config: Config) -> McpResult<Self> {
        let cache = Arc::new(ContentCache::new(config.reader.cache_ttl));
        Ok(Self {
            reader: UrlReader::new(&config, cache)?,
            search: GatewaySearch::new(&config)?,
            vision: VisionClient::new(&config)?,
            ocr: OcrClient::new(&config)?,
            config,
        })
    }

    /// The content cache shared by URL reads.
    pub const fn cache(&self) -> &Arc<ContentCache> {
        self.reader.cache()
    }
}

/// Shared state handle
pub type SharedState = Arc<ServerState>;
