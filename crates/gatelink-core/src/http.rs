//! Shared HTTP client construction.

use reqwest::{Client, NoProxy, Proxy};
use tracing::debug;

use crate::config::ProxyConfig;
use crate::{Error, Result};

/// User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("gatelink/", env!("CARGO_PKG_VERSION"));

/// Build the client used for every upstream request.
///
/// Proxy settings come only from `proxy`; ambient proxy variables are not
/// consulted a second time by reqwest.
pub fn build_client(proxy: &ProxyConfig, user_agent: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
        .gzip(true)
        .brotli(true)
        .no_proxy();

    let bypass = proxy.no_proxy.as_deref().and_then(NoProxy::from_string);

    if let Some(http) = &proxy.http {
        debug!(proxy = %http, "routing http requests through proxy");
        let p = Proxy::http(http)
            .map_err(|e| Error::Config(format!("Invalid HTTP_PROXY \"{http}\": {e}")))?;
        builder = builder.proxy(p.no_proxy(bypass.clone()));
    }

    if let Some(https) = &proxy.https {
        debug!(proxy = %https, "routing https requests through proxy");
        let p = Proxy::https(https)
            .map_err(|e| Error::Config(format!("Invalid HTTPS_PROXY \"{https}\": {e}")))?;
        builder = builder.proxy(p.no_proxy(bypass));
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))
}
