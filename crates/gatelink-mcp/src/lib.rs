//! Gatelink MCP Server
//!
//! A Rust-native MCP (Model Context Protocol) server exposing gateway web
//! search, cached URL reading, image understanding, image generation and OCR.

pub mod error;
pub mod resources;
pub mod server;
pub mod tools;
pub mod types;

use gatelink_core::Config;

pub use error::{McpError, McpResult};
pub use server::McpServer;

/// Name reported in the MCP handshake and the config resource
pub const SERVER_NAME: &str = "gatelink-mcp";

/// Main entry point for the MCP server
///
/// Builds every client from `config` and serves over stdio until the client
/// disconnects. Tracing must already be initialized and must not write to
/// stdout.
///
/// # Errors
///
/// Returns an error if the server fails to initialize or run.
pub async fn serve_stdio(config: Config) -> McpResult<()> {
    tracing::debug!("initializing gatelink MCP server");

    let server = McpServer::new(config)?;
    server.serve_stdio().await
}
