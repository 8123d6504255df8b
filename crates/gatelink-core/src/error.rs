//! Error types and handling for gatelink-core operations.
//!
//! Every failure surfaced to a tool caller is a variant of [`Error`]. Variants
//! are grouped into [`ErrorCategory`] values so callers (and tests) can branch
//! on the kind of failure without inspecting message text.
//!
//! ## Error Categories
//!
//! - **Configuration**: missing or invalid setup (gateway URL, API keys)
//! - **Network / DNS / Timeout / TLS**: transport-level failures
//! - **ServerHttp**: an upstream answered with a failure status
//! - **ContentMissing**: the upstream response broke its contract
//! - **UrlFormat**: the caller supplied an unparsable URL
//! - **Input**: invalid tool arguments or unreadable local files
//! - **Io**: local filesystem failures
//! - **Unexpected**: anything else, message passed through
//!
//! Messages carry a short tag prefix per category (for example
//! `🌐 Connection Error: ...`). The prefix is cosmetic; the category is the
//! contract.
//!
//! ```rust
//! use gatelink_core::{Error, ErrorCategory};
//!
//! let err = Error::InvalidUrl { url: "not a url".to_string() };
//! assert_eq!(err.category(), ErrorCategory::UrlFormat);
//! assert!(err.to_string().contains("Invalid URL"));
//! ```

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Missing or invalid configuration.
    Configuration,
    /// Connection-level network failure.
    Network,
    /// Hostname could not be resolved.
    Dns,
    /// A transport or request timeout elapsed.
    Timeout,
    /// TLS handshake or certificate problem.
    Tls,
    /// Upstream responded with a non-success HTTP status.
    ServerHttp,
    /// Upstream response lacked the expected content or could not be read.
    ContentMissing,
    /// The requested URL is not well-formed.
    UrlFormat,
    /// Invalid tool input or inaccessible local file.
    Input,
    /// Local filesystem failure.
    Io,
    /// Anything not covered by the other categories.
    Unexpected,
}

impl ErrorCategory {
    /// Stable identifier for logging and structured output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Network => "network",
            Self::Dns => "dns",
            Self::Timeout => "timeout",
            Self::Tls => "tls",
            Self::ServerHttp => "server_http",
            Self::ContentMissing => "content_missing",
            Self::UrlFormat => "url_format",
            Self::Input => "input",
            Self::Io => "io",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a proxied request a failure is attributed to.
///
/// Requests routed through the gateway blame the "Gateway server"; direct
/// requests blame the target (a "target server" for transport failures, a
/// "Website" for HTTP status failures).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    /// The configured gateway answered (or failed to).
    Gateway,
    /// The request went straight to its target.
    Target,
}

impl Party {
    /// Label used in transport-level messages.
    pub const fn server_label(self) -> &'static str {
        match self {
            Self::Gateway => "Gateway server",
            Self::Target => "target server",
        }
    }

    /// Label used in HTTP status messages.
    pub const fn responder_label(self) -> &'static str {
        match self {
            Self::Gateway => "Gateway server",
            Self::Target => "Website",
        }
    }
}

/// The main error type for gatelink-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Required configuration is missing or malformed.
    ///
    /// Fatal to the request; the message is surfaced verbatim.
    #[error("🔧 Configuration Error: {0}")]
    Config(String),

    /// The URL handed to the reader could not be parsed.
    ///
    /// Raised before any network activity.
    #[error("🔧 URL Format Error: Invalid URL \"{url}\"")]
    InvalidUrl {
        /// URL exactly as supplied by the caller.
        url: String,
    },

    /// The remote end refused the connection.
    #[error("🌐 Connection Error: {} is not responding ({url})", .party.server_label())]
    ConnectionRefused {
        /// Side the failure is attributed to.
        party: Party,
        /// URL that was being requested.
        url: String,
    },

    /// DNS resolution failed.
    #[error("🌐 DNS Error: Cannot resolve hostname \"{hostname}\"")]
    Dns {
        /// Hostname that could not be resolved.
        hostname: String,
    },

    /// The transport layer gave up waiting for the peer.
    ///
    /// Distinct from [`Error::Timeout`], which is raised by the reader's own timer.
    #[error("🌐 Timeout Error: {} is too slow to respond", .party.server_label())]
    TransportTimeout {
        /// Side the failure is attributed to.
        party: Party,
    },

    /// TLS handshake or certificate validation failed.
    #[error("🌐 SSL Error: Certificate problem with {}", .party.server_label())]
    Tls {
        /// Side the failure is attributed to.
        party: Party,
    },

    /// Generic network failure.
    #[error("🌐 Network Error: {message}{}", guidance_suffix(.guidance))]
    Network {
        /// Underlying failure description.
        message: String,
        /// Optional hint on what to check next.
        guidance: Option<String>,
    },

    /// The request timer elapsed before the upstream finished responding.
    #[error("⏱️ Timeout Error: {host} took longer than {timeout_ms}ms to respond")]
    Timeout {
        /// Hostname of the URL being read.
        host: String,
        /// Timer duration in milliseconds.
        timeout_ms: u128,
    },

    /// Upstream responded with a non-success status.
    #[error("🚫 {} Error ({status}): {reason}", .party.responder_label())]
    Http {
        /// Side that responded.
        party: Party,
        /// HTTP status code.
        status: u16,
        /// Status-specific explanation.
        reason: String,
    },

    /// Upstream API (vision / image generation) rejected the request.
    #[error("{}: {message}", api_prefix(.status))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Upstream error message or `HTTP <status>`.
        message: String,
    },

    /// Upstream response was missing content or could not be decoded.
    #[error("📄 Content Error: {message} ({url})")]
    Content {
        /// What went wrong with the response.
        message: String,
        /// URL whose content was requested.
        url: String,
    },

    /// OCR service failure, tagged with the category it belongs to.
    #[error("🔍 OCR Error: {message}")]
    Ocr {
        /// Category of the failure.
        kind: ErrorCategory,
        /// Failure description.
        message: String,
    },

    /// Tool arguments were invalid or a referenced local file is unusable.
    #[error("❌ Invalid Input: {0}")]
    InvalidInput(String),

    /// Local I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing a result failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Anything unmatched; the original message is passed through.
    #[error("❓ Unexpected Error: {0}")]
    Unexpected(String),
}

// thiserror hands format arguments over by reference.
#[allow(clippy::ref_option)]
fn guidance_suffix(guidance: &Option<String>) -> String {
    guidance
        .as_deref()
        .map(|g| format!(". {g}"))
        .unwrap_or_default()
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn api_prefix(status: &u16) -> &'static str {
    match *status {
        401 => "Authentication failed",
        500.. => "Server error",
        _ => "API error",
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl Error {
    /// Get the category this error belongs to.
    ///
    /// ```rust
    /// use gatelink_core::{Error, ErrorCategory, Party};
    ///
    /// let err = Error::Http { party: Party::Gateway, status: 429, reason: "Rate limit exceeded".into() };
    /// assert_eq!(err.category(), ErrorCategory::ServerHttp);
    /// ```
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Configuration,
            Self::InvalidUrl { .. } => ErrorCategory::UrlFormat,
            Self::ConnectionRefused { .. } | Self::Network { .. } => ErrorCategory::Network,
            Self::Dns { .. } => ErrorCategory::Dns,
            Self::TransportTimeout { .. } | Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Tls { .. } => ErrorCategory::Tls,
            Self::Http { .. } | Self::Api { .. } => ErrorCategory::ServerHttp,
            Self::Content { .. } => ErrorCategory::ContentMissing,
            Self::Ocr { kind, .. } => *kind,
            Self::InvalidInput(_) => ErrorCategory::Input,
            Self::Io(_) => ErrorCategory::Io,
            Self::Serialization(_) | Self::Unexpected(_) => ErrorCategory::Unexpected,
        }
    }
}

/// Convenience alias for `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_cover_every_variant() {
        let cases = vec![
            (Error::Config("x".into()), ErrorCategory::Configuration),
            (
                Error::InvalidUrl { url: "x".into() },
                ErrorCategory::UrlFormat,
            ),
            (
                Error::ConnectionRefused {
                    party: Party::Gateway,
                    url: "x".into(),
                },
                ErrorCategory::Network,
            ),
            (Error::Dns { hostname: "x".into() }, ErrorCategory::Dns),
            (
                Error::TransportTimeout {
                    party: Party::Target,
                },
                ErrorCategory::Timeout,
            ),
            (
                Error::Timeout {
                    host: "x".into(),
                    timeout_ms: 10,
                },
                ErrorCategory::Timeout,
            ),
            (Error::Tls { party: Party::Target }, ErrorCategory::Tls),
            (
                Error::Network {
                    message: "x".into(),
                    guidance: None,
                },
                ErrorCategory::Network,
            ),
            (
                Error::Http {
                    party: Party::Target,
                    status: 500,
                    reason: "x".into(),
                },
                ErrorCategory::ServerHttp,
            ),
            (
                Error::Api {
                    status: 401,
                    message: "x".into(),
                },
                ErrorCategory::ServerHttp,
            ),
            (
                Error::Content {
                    message: "x".into(),
                    url: "y".into(),
                },
                ErrorCategory::ContentMissing,
            ),
            (
                Error::Ocr {
                    kind: ErrorCategory::Timeout,
                    message: "x".into(),
                },
                ErrorCategory::Timeout,
            ),
            (Error::InvalidInput("x".into()), ErrorCategory::Input),
            (
                Error::Io(std::io::Error::other("disk")),
                ErrorCategory::Io,
            ),
            (Error::Serialization("x".into()), ErrorCategory::Unexpected),
            (Error::Unexpected("x".into()), ErrorCategory::Unexpected),
        ];

        for (error, expected) in cases {
            assert_eq!(error.category(), expected, "wrong category for {error:?}");
        }
    }

    #[test]
    fn test_party_labels_differ_by_message_family() {
        let refused = Error::ConnectionRefused {
            party: Party::Target,
            url: "https://example.com".into(),
        };
        assert_eq!(
            refused.to_string(),
            "🌐 Connection Error: target server is not responding (https://example.com)"
        );

        let http = Error::Http {
            party: Party::Target,
            status: 404,
            reason: "Page not found".into(),
        };
        assert_eq!(http.to_string(), "🚫 Website Error (404): Page not found");
    }

    #[test]
    fn test_network_guidance_is_appended() {
        let with = Error::Network {
            message: "fetch failed".into(),
            guidance: Some("Check the gateway".into()),
        };
        assert_eq!(
            with.to_string(),
            "🌐 Network Error: fetch failed. Check the gateway"
        );

        let without = Error::Network {
            message: "reset".into(),
            guidance: None,
        };
        assert_eq!(without.to_string(), "🌐 Network Error: reset");
    }

    #[test]
    fn test_api_prefix_by_status() {
        let auth = Error::Api {
            status: 401,
            message: "bad key".into(),
        };
        assert_eq!(auth.to_string(), "Authentication failed: bad key");

        let server = Error::Api {
            status: 503,
            message: "HTTP 503".into(),
        };
        assert_eq!(server.to_string(), "Server error: HTTP 503");

        let other = Error::Api {
            status: 400,
            message: "bad size".into(),
        };
        assert_eq!(other.to_string(), "API error: bad size");
    }

    #[test]
    fn test_serde_json_error_converts() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Unexpected);
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorCategory::ServerHttp).unwrap();
        assert_eq!(json, "\"server_http\"");
    }
}
