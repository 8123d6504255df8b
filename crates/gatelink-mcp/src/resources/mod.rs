//! MCP resources for gatelink
//!
//! Exposes live configuration (`config://server-config`) and the usage guide
//! (`help://usage-guide`).

pub mod config;
pub mod help;

pub use config::{CONFIG_URI, handle_config_resource};
pub use help::{HELP_URI, handle_help_resource};
