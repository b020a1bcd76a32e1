//! Outbound dispatch to the resolved upstream

use crate::config::Route;
use crate::gate::error::ProxyError;
use reqwest::header;
use reqwest::Client as HttpClient;
use std::time::Duration;
use tracing::{debug, error};

/// User-Agent presented to upstreams
pub const USER_AGENT: &str = "llmp-proxy/1.0";

/// Total timeout for non-streaming upstream calls. Streaming calls carry no
/// total timeout; an open stream may legitimately outlive any fixed bound.
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build an HTTP client; `timeout` of `None` leaves the response duration
/// unbounded.
pub fn build_http_client(timeout: Option<Duration>) -> Result<HttpClient, reqwest::Error> {
    let mut builder = HttpClient::builder().connect_timeout(CONNECT_TIMEOUT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

/// Client for non-streaming requests, bounded at 30 seconds.
pub fn build_client() -> Result<HttpClient, reqwest::Error> {
    build_http_client(Some(UPSTREAM_TIMEOUT))
}

/// Client for streaming requests, unbounded.
pub fn build_streaming_client() -> Result<HttpClient, reqwest::Error> {
    build_http_client(None)
}

/// Forward the rewritten body to the route's upstream, preserving the inbound
/// request path. A transport-level failure maps to 502; an upstream HTTP
/// error status is returned as a normal response for the relay to pass
/// through.
pub async fn dispatch(
    client: &HttpClient,
    route: &Route,
    path: &str,
    body: Vec<u8>,
) -> Result<reqwest::Response, ProxyError> {
    let url = format!("{}{}", route.api_base.trim_end_matches('/'), path);
    debug!("forwarding request to {}", url);

    let mut request = client
        .post(&url)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::USER_AGENT, USER_AGENT)
        .body(body);

    if !route.api_key.is_empty() {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", route.api_key));
    }

    request.send().await.map_err(|e| {
        error!("upstream request to {} failed: {}", url, e);
        ProxyError::Upstream(e)
    })
}
