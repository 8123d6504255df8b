//! Error types for the gatelink MCP server with MCP error code mapping

use rmcp::ErrorData;
use rmcp::model::ErrorCode;
use thiserror::Error;

/// Errors that can occur in the MCP server
#[derive(Debug, Error)]
pub enum McpError {
    /// A core operation failed; the message is already user-facing
    #[error(transparent)]
    Core(#[from] gatelink_core::Error),

    /// JSON serialization/deserialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Protocol error
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Invalid parameter provided
    #[error("invalid parameter: {0}")]
    InvalidParams(String),

    /// Resource URI not served by this server
    #[error("Unknown resource: {0}")]
    UnknownResource(String),
}

impl McpError {
    /// Map error to MCP error code
    pub const fn error_code(&self) -> i32 {
        match self {
            Self::Core(_) => -32603,     // Internal error
            Self::Json(_) => -32700,     // Parse error
            Self::Protocol(_) => -32600, // Invalid request
            Self::InvalidParams(_) | Self::UnknownResource(_) => {
                -32602 // Invalid params
            },
        }
    }
}

impl From<McpError> for ErrorData {
    fn from(err: McpError) -> Self {
        Self::new(ErrorCode(err.error_code()), err.to_string(), None)
    }
}

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let core = McpError::from(gatelink_core::Error::Config("missing".into()));
        assert_eq!(core.error_code(), -32603);
        assert_eq!(McpError::InvalidParams("x".into()).error_code(), -32602);
        assert_eq!(McpError::UnknownResource("foo://bar".into()).error_code(), -32602);
        assert_eq!(McpError::Protocol("x".into()).error_code(), -32600);

        let json = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(McpError::from(json).error_code(), -32700);
    }

    #[test]
    fn test_core_message_is_passed_through() {
        let err = McpError::from(gatelink_core::Error::InvalidInput("Prompt is required".into()));
        assert_eq!(err.to_string(), "❌ Invalid Input: Prompt is required");

        let data = ErrorData::from(McpError::UnknownResource("foo://bar".into()));
        assert_eq!(data.code, ErrorCode(-32602));
        assert_eq!(data.message, "Unknown resource: foo://bar");
    }
}
