//! URL reading tool: fetch a page through the gateway and return a slice of it

use gatelink_core::{Error, PaginationOptions};
use schemars::JsonSchema;
use serde::Deserialize;

use crate::{
    error::{McpError, McpResult},
    types::ServerState,
};

/// Tool name as advertised to clients
pub const READ_TOOL_NAME: &str = "web_url_read";

const GATEWAY_REQUIRED: &str = "GATEWAY_URL environment variable is required for URL reading. Configure it or use image tools only.";

/// Parameters for the URL reading tool
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadParams {
    /// URL
    pub url: String,

    /// Starting character position for content extraction (default: 0)
    #[serde(default)]
    pub start_char: Option<usize>,

    /// Maximum number of characters to return
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub max_length: Option<usize>,

    /// Extract content under a specific heading (searches for heading text)
    #[serde(default)]
    pub section: Option<String>,

    /// Return specific paragraph ranges (e.g., '1-5', '3', '10-')
    #[serde(default)]
    pub paragraph_range: Option<String>,

    /// Return only a list of headings instead of full content
    #[serde(default)]
    pub read_headings: Option<bool>,
}

impl ReadParams {
    /// Pagination options carried by these parameters
    pub fn options(&self) -> PaginationOptions {
        PaginationOptions {
            start_char: self.start_char,
            max_length: self.max_length,
            section: self.section.clone(),
            paragraph_range: self.paragraph_range.clone(),
            read_headings: self.read_headings.unwrap_or(false),
        }
    }
}

/// Handle a URL read, returning pretty JSON or the empty-content warning
#[tracing::instrument(skip(state, params), fields(url = %params.url))]
pub async fn handle_read(state: &ServerState, params: ReadParams) -> McpResult<String> {
    if state.config.gateway.base_url.is_none() {
        return Err(Error::Config(GATEWAY_REQUIRED.to_string()).into());
    }
    if params.max_length == Some(0) {
        return Err(McpError::InvalidParams(
            "Invalid arguments for URL reading: maxLength must be at least 1".to_string(),
        ));
    }

    let outcome = state
        .reader
        .fetch_and_convert(&params.url, None, &params.options())
        .await?;
    Ok(outcome.into_text()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use gatelink_core::{Config, ErrorCategory};
    use serde_json::json;
    use wiremock::matchers::{method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = "# Intro\n\nHello there.\n\n## Install\n\nRun the installer.\n\n## Usage\n\nCall it.";

    fn state_for(gateway: Option<String>) -> ServerState {
        let mut config = Config::default();
        config.gateway.base_url = gateway;
        ServerState::from_config(config).unwrap()
    }

    fn params(url: &str) -> ReadParams {
        serde_json::from_value(json!({ "url": url })).unwrap()
    }

    #[tokio::test]
    async fn test_read_section_then_cached_headings() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/api/read/.+"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": PAGE })))
            .expect(1)
            .mount(&server)
            .await;

        let state = state_for(Some(server.uri()));

        let mut first = params("https://example.com/docs");
        first.section = Some("install".into());
        let text = handle_read(&state, first).await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["content"], "## Install\n\nRun the installer.\n");
        assert_eq!(value["cached"], false);

        let mut second = params("https://example.com/docs");
        second.read_headings = Some(true);
        let text = handle_read(&state, second).await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["content"], "# Intro\n## Install\n## Usage");
        assert_eq!(value["cached"], true);
        assert_eq!(state.cache().len().await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_page_returns_warning_text() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": "  " })))
            .mount(&server)
            .await;

        let state = state_for(Some(server.uri()));
        let text = handle_read(&state, params("https://example.com/empty")).await?;
        assert!(text.contains("https://example.com/empty"));
        assert!(serde_json::from_str::<serde_json::Value>(&text).is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_read_without_gateway() {
        let err = handle_read(&state_for(None), params("https://example.com"))
            .await
            .unwrap_err();
        let McpError::Core(core) = err else {
            panic!("expected core error");
        };
        assert_eq!(core.category(), ErrorCategory::Configuration);
        assert!(core.to_string().contains("required for URL reading"));
    }

    #[test]
    fn test_params_map_to_options() {
        let params: ReadParams = serde_json::from_value(json!({
            "url": "https://example.com",
            "startChar": 5,
            "maxLength": 10,
            "paragraphRange": "2-3"
        }))
        .unwrap();
        let options = params.options();
        assert_eq!(options.start_char, Some(5));
        assert_eq!(options.max_length, Some(10));
        assert_eq!(options.paragraph_range.as_deref(), Some("2-3"));
        assert!(!options.read_headings);
    }
}
