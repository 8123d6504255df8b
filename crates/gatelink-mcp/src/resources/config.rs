//! Server configuration resource
//!
//! Exposes a redacted view of the running configuration via
//! `config://server-config`.

use serde_json::json;

use crate::error::{McpError, McpResult};
use crate::tools::TOOL_NAMES;
use crate::types::ServerState;

/// URI of the configuration resource
pub const CONFIG_URI: &str = "config://server-config";

/// Handle configuration resource read request
///
/// Returns pretty JSON with:
/// - `serverInfo` (name, version, description)
/// - `environment` (gateway URL, which credentials/proxies/keys are set, timeouts)
/// - `capabilities` (tool names, resources, transports)
/// - `cache` (live entry count)
#[tracing::instrument(skip(state))]
pub async fn handle_config_resource(state: &ServerState, uri: &str) -> McpResult<String> {
    if uri != CONFIG_URI {
        return Err(McpError::InvalidParams(format!(
            "Invalid config resource URI: {uri}"
        )));
    }

    let payload = json!({
        "serverInfo": {
            "name": crate::SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "MCP server for web search and page reading via Gateway API",
        },
        "environment": state.config.summary(),
        "capabilities": {
            "tools": TOOL_NAMES,
            "logging": true,
            "resources": true,
            "transports": ["stdio"],
        },
        "cache": {
            "entries": state.cache().len().await,
            "ttlSecs": state.cache().ttl().as_secs(),
        },
    });

    Ok(serde_json::to_string_pretty(&payload)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use gatelink_core::Config;

    #[tokio::test]
    async fn test_config_resource_is_redacted() -> anyhow::Result<()> {
        let mut config = Config::default();
        config.gateway.base_url = Some("http://gateway.local:80".into());
        config.gateway.username = Some("alice".into());
        config.gateway.password = Some("hunter2".into());
        config.vision.api_key = Some("sk-secret".into());
        let state = ServerState::from_config(config)?;
        state.cache().set("https://example.com", "cached page").await;

        let text = handle_config_resource(&state, CONFIG_URI).await?;
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("sk-secret"));

        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["environment"]["gatewayUrl"], "http://gateway.local:80");
        assert_eq!(value["environment"]["hasAuth"], true);
        assert_eq!(value["environment"]["hasVisionKey"], true);
        assert_eq!(value["capabilities"]["tools"].as_array().unwrap().len(), 5);
        assert_eq!(value["cache"]["entries"], 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_is_reported() -> anyhow::Result<()> {
        let state = ServerState::from_config(Config::default())?;
        let text = handle_config_resource(&state, CONFIG_URI).await?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(value["environment"]["gatewayUrl"], "Not configured");
        assert_eq!(value["environment"]["hasAuth"], false);
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_uri_is_rejected() {
        let state = ServerState::from_config(Config::default()).unwrap();
        assert!(handle_config_resource(&state, "config://other").await.is_err());
    }
}
