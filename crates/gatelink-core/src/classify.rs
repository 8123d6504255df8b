//! Failure classification.
//!
//! The HTTP layer never hands raw `reqwest` errors to callers. Instead it
//! reduces them to a [`TransportFailure`] (or a status code) and asks
//! [`classify`] to turn that into a categorized [`Error`] with wording that
//! depends on whether the request went through the gateway.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use crate::error::{Error, Party};

/// Guidance appended to generic network failures on gateway requests.
pub const GATEWAY_GUIDANCE: &str =
    "Check if the GATEWAY_URL is correct and the Gateway server is available";

/// Guidance appended to generic network failures on direct requests.
pub const TARGET_GUIDANCE: &str = "Check if the target URL is accessible";

/// Source-chain fragments that only TLS failures produce.
const TLS_MARKERS: &[&str] = &["certificate", "handshake"];

/// Transport-level reason a request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// The peer actively refused the connection.
    ConnectionRefused,
    /// Hostname resolution failed.
    Dns,
    /// The transport's own timeout elapsed.
    TimedOut,
    /// TLS handshake or certificate failure.
    Tls(String),
    /// The request could not be sent for some other connection reason.
    FetchFailed,
    /// Anything else, with the underlying message.
    Other(String),
}

impl TransportFailure {
    /// Reduce a `reqwest` error to its transport reason.
    ///
    /// The error's source chain is walked so that failures buried inside
    /// hyper or the resolver are still recognized.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::TimedOut;
        }

        let mut chain = String::new();
        let mut source: Option<&(dyn StdError + 'static)> = Some(err);
        while let Some(current) = source {
            if let Some(io_err) = current.downcast_ref::<io::Error>() {
                match io_err.kind() {
                    io::ErrorKind::ConnectionRefused => return Self::ConnectionRefused,
                    io::ErrorKind::TimedOut => return Self::TimedOut,
                    _ => {},
                }
            }
            chain.push_str(&current.to_string().to_lowercase());
            chain.push(' ');
            source = current.source();
        }

        if chain.contains("connection refused") {
            Self::ConnectionRefused
        } else if chain.contains("dns error")
            || chain.contains("failed to lookup address")
            || chain.contains("name or service not known")
            || chain.contains("no such host")
        {
            Self::Dns
        } else if is_tls_chain(&chain) {
            Self::Tls(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::FetchFailed
        } else {
            Self::Other(err.to_string())
        }
    }
}

fn is_tls_chain(chain: &str) -> bool {
    TLS_MARKERS.iter().any(|marker| chain.contains(marker))
}

/// A failure awaiting classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No response was received.
    Transport(TransportFailure),
    /// A response arrived with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, if any.
        status_text: String,
    },
    /// Unmatched failure; the message is passed through.
    Other(String),
}

impl Failure {
    /// Build a status failure from a `reqwest` status code.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        Self::Status {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}

impl From<&reqwest::Error> for Failure {
    fn from(err: &reqwest::Error) -> Self {
        Self::Transport(TransportFailure::from_reqwest(err))
    }
}

/// What was being requested when a failure happened.
#[derive(Debug, Clone, Default)]
pub struct FailureContext {
    /// URL the caller asked for.
    pub url: String,
    /// Gateway base URL, when the request went through the gateway.
    pub gateway_url: Option<String>,
    /// Timer duration, if one applied.
    pub timeout: Option<Duration>,
}

impl FailureContext {
    /// Context for a request to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Mark the request as routed through the given gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self
    }

    /// Record the timer that applied to the request.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    const fn party(&self) -> Party {
        if self.gateway_url.is_some() {
            Party::Gateway
        } else {
            Party::Target
        }
    }

    fn hostname(&self) -> String {
        host_of(&self.url)
    }

    /// Host the client had to resolve: the gateway's when there is one.
    fn resolved_hostname(&self) -> String {
        self.gateway_url
            .as_deref()
            .map_or_else(|| self.hostname(), host_of)
    }
}

fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

/// Classify a failure into a categorized [`Error`].
///
/// ```rust
/// use gatelink_core::classify::{classify, Failure, FailureContext, TransportFailure};
/// use gatelink_core::ErrorCategory;
///
/// let ctx = FailureContext::new("https://example.com").with_gateway("http://gw:80");
/// let err = classify(&Failure::Transport(TransportFailure::ConnectionRefused), &ctx);
/// assert_eq!(err.category(), ErrorCategory::Network);
/// assert!(err.to_string().contains("Gateway server"));
/// ```
pub fn classify(failure: &Failure, ctx: &FailureContext) -> Error {
    let party = ctx.party();
    match failure {
        Failure::Transport(transport) => match transport {
            TransportFailure::ConnectionRefused => Error::ConnectionRefused {
                party,
                url: ctx.url.clone(),
            },
            TransportFailure::Dns => Error::Dns {
                hostname: ctx.resolved_hostname(),
            },
            TransportFailure::TimedOut => Error::TransportTimeout { party },
            TransportFailure::Tls(_) => Error::Tls { party },
            TransportFailure::FetchFailed => Error::Network {
                message: "fetch failed".to_string(),
                guidance: Some(
                    match party {
                        Party::Gateway => GATEWAY_GUIDANCE,
                        Party::Target => TARGET_GUIDANCE,
                    }
                    .to_string(),
                ),
            },
            TransportFailure::Other(message) => Error::Network {
                message: message.clone(),
                guidance: None,
            },
        },
        Failure::Status {
            status,
            status_text,
        } => Error::Http {
            party,
            status: *status,
            reason: status_reason(*status, status_text),
        },
        Failure::Other(message) => Error::Unexpected(message.clone()),
    }
}

fn status_reason(status: u16, status_text: &str) -> String {
    match status {
        403 => "Access blocked (bot detection or geo-restriction)".to_string(),
        404 => "Page not found".to_string(),
        429 => "Rate limit exceeded".to_string(),
        500.. => "Internal server error".to_string(),
        _ if status_text.is_empty() => format!("HTTP {status}"),
        _ => status_text.to_string(),
    }
}

/// Error raised when the reader's own timer expires.
pub fn timeout_error(url: &str, timeout: Duration) -> Error {
    let host = url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string());
    Error::Timeout {
        host,
        timeout_ms: timeout.as_millis(),
    }
}

/// Warning returned in place of content when a page converts to nothing.
pub fn empty_content_warning(url: &str) -> String {
    format!(
        "📄 Content Warning: Page fetched but appears empty after conversion ({url}). May contain only media or require JavaScript."
    )
}
