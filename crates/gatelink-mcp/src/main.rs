//! gatelink-mcp - MCP server for gateway web search, URL reading and image tools
//!
//! Speaks MCP over stdio. Logs go to stderr because stdout carries the
//! protocol.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use gatelink_core::Config;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Command-line arguments; every setting also reads its environment variable.
#[derive(Debug, Parser)]
#[command(name = "gatelink-mcp", version, about)]
struct Cli {
    /// Gateway API base URL
    #[arg(long, env = "GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Basic auth username for gateway search
    #[arg(long, env = "AUTH_USERNAME")]
    auth_username: Option<String>,

    /// Basic auth password for gateway search
    #[arg(long, env = "AUTH_PASSWORD", hide_env_values = true)]
    auth_password: Option<String>,

    /// User-Agent header for gateway requests
    #[arg(long, env = "USER_AGENT")]
    user_agent: Option<String>,

    /// API key for the vision and image generation tools
    #[arg(long, env = "ZHIPUAI_API_KEY", hide_env_values = true)]
    zhipuai_api_key: Option<String>,

    /// PaddleOCR service URL
    #[arg(long, env = "PADDLEOCR_URL")]
    paddleocr_url: Option<String>,

    /// URL read timeout in milliseconds
    #[arg(long, env = "GATELINK_READ_TIMEOUT_MS")]
    read_timeout_ms: Option<u64>,

    /// Page cache lifetime in seconds
    #[arg(long, env = "GATELINK_CACHE_TTL_SECS")]
    cache_ttl_secs: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Cli {
    /// Environment configuration with explicit arguments layered on top.
    fn into_config(self, mut config: Config) -> Config {
        if let Some(url) = non_empty(self.gateway_url) {
            config.gateway.base_url = Some(url);
        }
        if let Some(user) = non_empty(self.auth_username) {
            config.gateway.username = Some(user);
        }
        if let Some(pass) = non_empty(self.auth_password) {
            config.gateway.password = Some(pass);
        }
        if let Some(agent) = non_empty(self.user_agent) {
            config.gateway.user_agent = Some(agent);
        }
        if let Some(key) = non_empty(self.zhipuai_api_key) {
            config.vision.api_key = Some(key);
        }
        if let Some(url) = non_empty(self.paddleocr_url) {
            config.ocr.base_url = url;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.reader.timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = self.cache_ttl_secs {
            config.reader.cache_ttl = Duration::from_secs(secs);
        }
        config
    }
}

fn initialize_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    if json {
        tracing_subscriber::registry()
            .with(layer.json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry().with(layer).with(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_logging(cli.verbose, cli.log_json);

    let config = cli.into_config(Config::from_env());
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return Err(e.into());
    }
    if config.vision.api_key.is_none() {
        tracing::warn!("ZHIPUAI_API_KEY is not set; image_understand and image_generate will fail");
    }

    let summary = config.summary();
    tracing::info!(
        gateway = %summary.gateway_url,
        has_auth = summary.has_auth,
        has_proxy = summary.has_proxy,
        "configuration loaded"
    );

    gatelink_mcp::serve_stdio(config).await?;
    Ok(())
}
