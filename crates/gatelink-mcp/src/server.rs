//! MCP server implementation for gatelink

use std::sync::Arc;

use gatelink_core::Config;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    AnnotateAble, CallToolResult, Content, Implementation, ListResourcesResult,
    PaginatedRequestParam, ProtocolVersion, RawResource, ReadResourceRequestParam,
    ReadResourceResult, Resource, ResourceContents, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, tool, tool_handler, tool_router};

use crate::error::{McpError, McpResult};
use crate::resources::{self, CONFIG_URI, HELP_URI};
use crate::tools::{
    self, GenerateParams, OcrParams, ReadParams, SearchParams, UnderstandParams,
};
use crate::types::{ServerState, SharedState};

const INSTRUCTIONS: &str = "Web search and page reading through a gateway, plus image understanding, \
     generation and OCR. Read config://server-config for live settings and help://usage-guide \
     for tool usage.";

/// MCP server for gatelink
#[derive(Clone)]
pub struct McpServer {
    state: SharedState,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for McpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpServer").field("state", &self.state).finish_non_exhaustive()
    }
}

/// Core failures become tool error results; everything else is a protocol error.
fn into_tool_result(result: McpResult<String>) -> Result<CallToolResult, ErrorData> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(McpError::Core(err)) => {
            tracing::warn!(category = %err.category(), error = %err, "tool execution failed");
            Ok(CallToolResult::error(vec![Content::text(err.to_string())]))
        },
        Err(other) => {
            tracing::error!(error = %other, "tool request rejected");
            Err(other.into())
        },
    }
}

fn resource(uri: &str, name: &str, description: &str, mime_type: &str) -> Resource {
    let mut raw = RawResource::new(uri, name.to_string());
    raw.description = Some(description.to_string());
    raw.mime_type = Some(mime_type.to_string());
    raw.no_annotation()
}

#[tool_router]
impl McpServer {
    /// Create a new MCP server from configuration
    pub fn new(config: Config) -> McpResult<Self> {
        Ok(Self::with_state(ServerState::from_config(config)?))
    }

    /// Create a server around prepared state
    pub fn with_state(state: ServerState) -> Self {
        Self {
            state: Arc::new(state),
            tool_router: Self::tool_router(),
        }
    }

    /// Shared state
    pub fn state(&self) -> &ServerState {
        &self.state
    }

    /// Resources advertised by `resources/list`
    pub fn resource_list() -> Vec<Resource> {
        vec![
            resource(
                CONFIG_URI,
                "Server Configuration",
                "Current server configuration and environment variables",
                "application/json",
            ),
            resource(
                HELP_URI,
                "Usage Guide",
                "How to use the gatelink MCP server effectively",
                "text/markdown",
            ),
        ]
    }

    /// Text of the resource at `uri`
    pub async fn resource_text(&self, uri: &str) -> McpResult<String> {
        match uri {
            CONFIG_URI => resources::handle_config_resource(&self.state, uri).await,
            HELP_URI => resources::handle_help_resource(uri).map(str::to_string),
            other => Err(McpError::UnknownResource(other.to_string())),
        }
    }

    /// Serve the MCP protocol over stdio
    pub async fn serve_stdio(&self) -> McpResult<()> {
        tracing::info!("gatelink MCP server starting");

        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();

        let service = rmcp::serve_server(self.clone(), (stdin, stdout))
            .await
            .map_err(|e| {
                tracing::error!("server initialization error: {}", e);
                McpError::Protocol(e.to_string())
            })?;

        // Keep the service running until the client disconnects
        service.waiting().await.map_err(|e| {
            tracing::error!("server runtime error: {}", e);
            McpError::Protocol(e.to_string())
        })?;

        tracing::info!("gatelink MCP server stopped");
        Ok(())
    }

    #[tool(
        description = "Performs web search using the Gateway API Firecrawl search. Returns search results with title, content, and URL. Use this for general queries, news, articles, and online content."
    )]
    async fn searxng_web_search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_tool_result(tools::handle_search(&self.state, params).await)
    }

    #[tool(
        description = "Read the content from an URL. Use this for further information retrieving to understand the content of each URL. Supports reading only the headings, one section, a paragraph range, or a character window of the page."
    )]
    async fn web_url_read(
        &self,
        Parameters(params): Parameters<ReadParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_tool_result(tools::handle_read(&self.state, params).await)
    }

    #[tool(
        description = "Understand and analyze images, videos, and documents using the GLM-4.6V-Flash model. Supports visual Q&A, content description, OCR, document parsing, video understanding, and frontend code replication from screenshots. Accepts file paths, URLs, or base64 data."
    )]
    async fn image_understand(
        &self,
        Parameters(params): Parameters<UnderstandParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_tool_result(tools::handle_understand(&self.state, params).await)
    }

    #[tool(
        description = "Generate images from text descriptions using the CogView-3-Flash model. Supports multiple resolutions. Returns the URL of the generated image."
    )]
    async fn image_generate(
        &self,
        Parameters(params): Parameters<GenerateParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_tool_result(tools::handle_generate(&self.state, params).await)
    }

    #[tool(
        description = "Extract text from an image using PaddleOCR. Accepts a local image path (png, jpg, jpeg, webp, bmp), an image URL, or a data:image URL. Returns the text with confidence, language and per-line blocks."
    )]
    async fn image_ocr(
        &self,
        Parameters(params): Parameters<OcrParams>,
    ) -> Result<CallToolResult, ErrorData> {
        into_tool_result(tools::handle_ocr(&self.state, params).await)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: crate::SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        tracing::debug!("listing resources");
        Ok(ListResourcesResult::with_all_items(Self::resource_list()))
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        tracing::debug!(uri = %uri, "reading resource");
        let text = self.resource_text(&uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use gatelink_core::vision::VISION_MODEL;
    use rmcp::model::RawContent;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_with(config: Config) -> McpServer {
        McpServer::new(config).unwrap()
    }

    fn text_of(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(text) => text.text.clone(),
            other => panic!("unexpected content: {other:?}"),
        }
    }

    #[test]
    fn test_server_info_response() {
        let info = server_with(Config::default()).get_info();

        assert_eq!(info.server_info.name, "gatelink-mcp");
        assert!(!info.server_info.version.is_empty());
        assert_eq!(info.protocol_version, ProtocolVersion::default());
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }

    #[test]
    fn test_all_tools_registered() {
        let server = server_with(Config::default());
        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        let mut expected: Vec<String> = tools::TOOL_NAMES.iter().map(ToString::to_string).collect();
        expected.sort();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_resource_list() {
        let resources = McpServer::resource_list();
        let uris: Vec<&str> = resources.iter().map(|r| r.raw.uri.as_str()).collect();
        assert_eq!(uris, vec![CONFIG_URI, HELP_URI]);
        assert_eq!(resources[0].raw.mime_type.as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_unknown_resource_is_invalid_params() {
        let server = server_with(Config::default());
        let err = server.resource_text("file:///etc/passwd").await.unwrap_err();
        assert_eq!(err.error_code(), -32602);
        assert_eq!(err.to_string(), "Unknown resource: file:///etc/passwd");
    }

    #[tokio::test]
    async fn test_help_resource_text() -> anyhow::Result<()> {
        let server = server_with(Config::default());
        let text = server.resource_text(HELP_URI).await?;
        assert!(text.starts_with("# Gatelink MCP Server Help"));
        Ok(())
    }

    #[tokio::test]
    async fn test_core_failure_is_error_result() -> anyhow::Result<()> {
        let server = server_with(Config::default());
        let result = server
            .searxng_web_search(Parameters(SearchParams {
                query: "rust".into(),
                limit: None,
            }))
            .await?;

        assert_eq!(result.is_error, Some(true));
        assert!(text_of(&result).starts_with("🔧 Configuration Error: GATEWAY_URL"));
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_params_is_protocol_error() {
        let mut config = Config::default();
        config.gateway.base_url = Some("http://127.0.0.1:9".into());
        let server = server_with(config);
        let params: ReadParams =
            serde_json::from_value(json!({"url": "https://example.com", "maxLength": 0})).unwrap();

        let err = server.web_url_read(Parameters(params)).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }

    #[tokio::test]
    async fn test_successful_tool_call() -> anyhow::Result<()> {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": VISION_MODEL,
                "choices": [{"message": {"content": "two dogs"}}]
            })))
            .expect(1)
            .mount(&upstream)
            .await;

        let mut config = Config::default();
        config.vision.base_url = upstream.uri();
        config.vision.api_key = Some("key".into());
        let server = server_with(config);

        let result = server
            .image_understand(Parameters(UnderstandParams {
                file: "https://example.com/dogs.jpg".into(),
                prompt: "How many dogs?".into(),
                thinking: Some(false),
            }))
            .await?;
        assert_ne!(result.is_error, Some(true));
        assert_eq!(text_of(&result), "two dogs");
        Ok(())
    }
}
