//! Usage guide resource, served from `help://usage-guide`.

use crate::error::{McpError, McpResult};

/// URI of the usage guide resource
pub const HELP_URI: &str = "help://usage-guide";

const USAGE_GUIDE: &str = include_str!("../../data/usage_guide.md");

/// Handle usage guide resource read request
pub fn handle_help_resource(uri: &str) -> McpResult<&'static str> {
    if uri == HELP_URI {
        Ok(USAGE_GUIDE)
    } else {
        Err(McpError::InvalidParams(format!("Invalid help resource URI: {uri}")))
    }
}
