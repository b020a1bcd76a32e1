//! HTTP request handlers for the gateway

use crate::config::{Config, ProviderType, RouteTable};
use crate::gate::dispatch::{self, dispatch};
use crate::gate::error::ProxyError;
use crate::gate::relay::relay;
use crate::gate::rewrite::ProxyRequest;
use axum::body::Bytes;
use axum::extract::{OriginalUri, State};
use axum::response::Response;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// Gateway state shared across handlers.
///
/// Everything here is immutable after startup, so request tasks share it
/// without synchronization.
#[derive(Clone)]
pub struct GatewayState {
    /// Logical model name to upstream route
    pub routes: Arc<RouteTable>,
    /// Shared secret; `None` disables authentication
    pub auth_token: Option<Arc<str>>,
    /// Client for non-streaming upstream calls (bounded timeout)
    pub http: reqwest::Client,
    /// Client for streaming upstream calls (unbounded)
    pub http_stream: reqwest::Client,
}

impl GatewayState {
    /// Build the state from configuration: routing table, effective shared
    /// secret, and the two upstream clients.
    pub fn new(config: &Config) -> crate::Result<Self> {
        Ok(GatewayState {
            routes: Arc::new(RouteTable::from_config(config)),
            auth_token: config
                .auth_token
                .as_deref()
                .filter(|token| !token.is_empty())
                .map(Arc::from),
            http: dispatch::build_client()?,
            http_stream: dispatch::build_streaming_client()?,
        })
    }
}

/// Proxy one chat request: rewrite the body against the routing table,
/// dispatch to the upstream, relay the response.
pub async fn proxy_handler(
    State(state): State<GatewayState>,
    OriginalUri(uri): OriginalUri,
    body: Bytes,
) -> Result<Response, ProxyError> {
    let mut request = ProxyRequest::parse(&body).map_err(ProxyError::InvalidBody)?;

    let model = request
        .model()
        .filter(|m| !m.is_empty())
        .ok_or(ProxyError::MissingModel)?;

    let route = state.routes.resolve(&model).ok_or(ProxyError::UnknownModel)?;

    // This instance only relays Anthropic-style routes; OpenAI-style routes
    // are refused on all endpoints, matching the deployed split.
    if route.provider_type != ProviderType::Anthropic {
        return Err(ProxyError::OpenAiRoute);
    }

    let is_stream = request.stream();
    info!("proxying model {} (stream: {})", model, is_stream);

    request.set_model(route.bare_model()).map_err(ProxyError::Rewrite)?;
    let body = request.into_bytes().map_err(ProxyError::Rewrite)?;

    let client = if is_stream { &state.http_stream } else { &state.http };
    let upstream = dispatch(client, route, uri.path(), body).await?;

    relay(upstream, is_stream).await
}

/// Handle model list request
pub async fn list_models(State(state): State<GatewayState>) -> Json<Value> {
    let data: Vec<Value> = state
        .routes
        .iter()
        .map(|(name, route)| {
            json!({
                "id": name,
                "object": "model",
                "owned_by": route.provider_type.config_key(),
                "permission": [],
                "created": 1677610602
            })
        })
        .collect();

    Json(json!({
        "object": "list",
        "data": data
    }))
}
