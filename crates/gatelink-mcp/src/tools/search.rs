//! Web search tool backed by the gateway's search endpoint

use gatelink_core::Error;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::{error::McpResult, types::ServerState};

/// Tool name as advertised to clients
pub const SEARCH_TOOL_NAME: &str = "searxng_web_search";

const GATEWAY_REQUIRED: &str = "GATEWAY_URL environment variable is required for web search. Configure it or use image tools only.";

/// Parameters for the web search tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// The search query string
    pub query: String,

    /// Maximum number of results to return (default: 10, max: 100)
    #[serde(default)]
    #[schemars(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

/// Handle a web search, returning pretty JSON results
#[tracing::instrument(skip(state))]
pub async fn handle_search(state: &ServerState, params: SearchParams) -> McpResult<String> {
    if state.config.gateway.base_url.is_none() {
        return Err(Error::Config(GATEWAY_REQUIRED.to_string()).into());
    }

    let results = state.search.search(&params.query, params.limit).await?;
    Ok(serde_json::to_string_pretty(&results)?)
}
