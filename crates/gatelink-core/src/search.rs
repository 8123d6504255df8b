//! Web search through the gateway's `/api/firecrawl-search` endpoint.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::classify::{self, Failure, FailureContext};
use crate::config::{Config, GATEWAY_URL_REQUIRED_MESSAGE};
use crate::http::build_client;
use crate::reader::serialize_millis;
use crate::{Error, Result};

/// Result count used when the caller does not ask for one.
pub const DEFAULT_SEARCH_LIMIT: u32 = 10;

/// Largest accepted result count.
pub const MAX_SEARCH_LIMIT: u32 = 100;

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Page title.
    pub title: String,
    /// Snippet or description.
    pub content: String,
    /// Page URL.
    pub url: String,
}

/// A completed search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    /// Query as submitted.
    pub query: String,
    /// Hits in gateway order.
    pub results: Vec<SearchHit>,
    /// Number of hits.
    pub total_count: usize,
    /// Round-trip time, rendered as `"<n>ms"`.
    #[serde(serialize_with = "serialize_millis")]
    pub duration: Duration,
}

/// Client for gateway search.
#[derive(Debug, Clone)]
pub struct GatewaySearch {
    client: Client,
    gateway_url: Option<String>,
    auth: Option<(String, String)>,
}

impl GatewaySearch {
    /// Build a search client from configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = build_client(&config.proxy, config.gateway.user_agent.as_deref())?;
        let auth = config
            .gateway
            .auth()
            .map(|(user, pass)| (user.to_string(), pass.to_string()));
        Ok(Self::with_client(client, config.gateway.base_url.clone()).with_auth(auth))
    }

    /// Build a search client around an existing HTTP client.
    pub const fn with_client(client: Client, gateway_url: Option<String>) -> Self {
        Self {
            client,
            gateway_url,
            auth: None,
        }
    }

    /// Send basic auth with every search.
    #[must_use]
    pub fn with_auth(mut self, auth: Option<(String, String)>) -> Self {
        self.auth = auth;
        self
    }

    /// Run a search for `query`, returning at most `limit` hits.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: Option<u32>) -> Result<SearchResults> {
        let started = Instant::now();
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

        if query.trim().is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }
        if !(1..=MAX_SEARCH_LIMIT).contains(&limit) {
            return Err(Error::InvalidInput(format!(
                "limit must be between 1 and {MAX_SEARCH_LIMIT}, got {limit}"
            )));
        }

        let gateway = self
            .gateway_url
            .as_deref()
            .ok_or_else(|| Error::Config(GATEWAY_URL_REQUIRED_MESSAGE.to_string()))?;
        let endpoint = url::Url::parse(gateway)
            .and_then(|base| base.join("/api/firecrawl-search"))
            .map_err(|_| {
                Error::Config(format!(
                    "Invalid GATEWAY_URL format: {gateway}. Use format: http://your-gateway.com:80"
                ))
            })?;
        let ctx = FailureContext::new(endpoint.as_str()).with_gateway(gateway);

        let mut request = self
            .client
            .post(endpoint.clone())
            .json(&serde_json::json!({ "query": query, "limit": limit }));
        if let Some((user, pass)) = &self.auth {
            request = request.basic_auth(user, Some(pass));
        }

        info!(endpoint = %endpoint, "sending search request");
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "search request failed");
            classify::classify(&Failure::from(&e), &ctx)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify::classify(&Failure::from_status(status), &ctx));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Unexpected(format!("Failed to read search response: {e}")))?;
        let body: Value = serde_json::from_str(&text)
            .map_err(|_| Error::Unexpected(format!("Failed to parse JSON response: {text}")))?;

        let results = parse_hits(&body)?;
        if results.is_empty() {
            info!("no results found");
        }

        let outcome = SearchResults {
            query: query.to_string(),
            total_count: results.len(),
            results,
            duration: started.elapsed(),
        };
        info!(
            hits = outcome.total_count,
            elapsed_ms = outcome.duration.as_millis(),
            "search completed"
        );
        Ok(outcome)
    }
}

/// JSON truthiness: null, false, zero and empty strings are false.
fn truthy(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

fn text_field(item: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| {
            item.get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_default()
        .to_string()
}

/// Accepts `{results: [...]}`, `{data: [...]}` and `{success, data: [...]}`.
fn parse_hits(body: &Value) -> Result<Vec<SearchHit>> {
    let mut results = truthy(body.get("results")).or_else(|| truthy(body.get("data")));
    if let (Some(_), Some(data)) = (truthy(body.get("success")), truthy(body.get("data"))) {
        results = Some(data);
    }

    let Some(results) = results else {
        return Ok(Vec::new());
    };
    let items = results.as_array().ok_or_else(|| {
        Error::Unexpected("Invalid response format: results is not an array".to_string())
    })?;

    Ok(items
        .iter()
        .map(|item| SearchHit {
            title: text_field(item, &["title"]),
            content: text_field(item, &["description", "content"]),
            url: text_field(item, &["url", "link"]),
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ErrorCategory;
    use crate::config::ProxyConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn search_for(server: &MockServer) -> GatewaySearch {
        let client = build_client(&ProxyConfig::default(), Some("gatelink-test")).unwrap();
        GatewaySearch::with_client(client, Some(server.uri()))
    }

    #[tokio::test]
    async fn test_search_posts_query_and_maps_hits() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/firecrawl-search"))
            .and(body_json(json!({"query": "rust async", "limit": 3})))
            .and(header("user-agent", "gatelink-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [
                    {"title": "Tokio", "description": "Async runtime", "url": "https://tokio.rs"},
                    {"title": "Book", "content": "Async book", "link": "https://rust-lang.github.io/async-book"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = search_for(&server).search("rust async", Some(3)).await?;
        assert_eq!(results.total_count, 2);
        assert_eq!(
            results.results[0],
            SearchHit {
                title: "Tokio".into(),
                content: "Async runtime".into(),
                url: "https://tokio.rs".into(),
            }
        );
        assert_eq!(results.results[1].content, "Async book");
        assert_eq!(results.results[1].url, "https://rust-lang.github.io/async-book");
        Ok(())
    }

    #[tokio::test]
    async fn test_basic_auth_header_is_sent() -> anyhow::Result<()> {
        let server = MockServer::start().await;
        // base64("alice:secret")
        Mock::given(method("POST"))
            .and(header("authorization", "Basic YWxpY2U6c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        let search = search_for(&server).with_auth(Some(("alice".into(), "secret".into())));
        let results = search.search("q", None).await?;
        assert!(results.results.is_empty());
        assert_eq!(results.total_count, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_non_array_results_are_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": "nope"})))
            .mount(&server)
            .await;

        let err = search_for(&server).search("q", None).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Unexpected);
        assert!(err.to_string().contains("Invalid response format: results is not an array"));
    }

    #[tokio::test]
    async fn test_status_failure_names_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let err = search_for(&server).search("q", None).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ServerHttp);
        assert!(err.to_string().starts_with("🚫 Gateway server Error (403)"));
    }

    #[tokio::test]
    async fn test_limit_and_query_validation() {
        let search = GatewaySearch::with_client(Client::new(), Some("http://unused".into()));
        for limit in [0, 101] {
            let err = search.search("q", Some(limit)).await.unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Input);
        }
        let err = search.search("  ", None).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Input);
    }

    #[tokio::test]
    async fn test_missing_gateway() {
        let search = GatewaySearch::with_client(Client::new(), None);
        let err = search.search("q", None).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_envelope_variants() {
        let hits = parse_hits(&json!({"data": [{"title": "a"}]})).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "");

        // An empty `results` array is still preferred over `data`.
        let hits = parse_hits(&json!({"results": [], "data": [{"title": "b"}]})).unwrap();
        assert!(hits.is_empty());

        let hits = parse_hits(&json!({"success": true, "results": [], "data": [{"title": "c"}]})).unwrap();
        assert_eq!(hits[0].title, "c");

        assert!(parse_hits(&json!({})).unwrap().is_empty());
    }

    #[test]
    fn test_results_serialize_camel_case() {
        let results = SearchResults {
            query: "q".into(),
            results: vec![],
            total_count: 0,
            duration: Duration::from_millis(42),
        };
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["totalCount"], 0);
        assert_eq!(value["duration"], "42ms");
    }
}
