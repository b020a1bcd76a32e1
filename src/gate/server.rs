//! Gateway HTTP server

use crate::gate::auth;
use crate::gate::handlers::{self, GatewayState};
use axum::{
    extract::Request,
    middleware::{self, Next},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::info;

/// Listening port; fixed, not configurable.
pub const LISTEN_PORT: u16 = 8400;

/// Build the gateway router.
///
/// The three chat routes share one handler and, together with the model
/// list, sit behind the shared-secret middleware. `/health` stays open.
pub fn app(state: GatewayState) -> Router {
    let proxied = Router::new()
        // OpenAI-compatible endpoints
        .route("/v1/chat/completions", post(handlers::proxy_handler))
        .route("/chat/completions", post(handlers::proxy_handler))
        // Anthropic-compatible endpoint
        .route("/v1/messages", post(handlers::proxy_handler))
        // Utility endpoints
        .route("/v1/models", get(handlers::list_models))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    Router::new()
        .merge(proxied)
        .route("/health", get(health_check))
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
}

/// Start the gateway server
pub async fn start_server(state: GatewayState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], LISTEN_PORT));

    info!("Starting proxy server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

/// Health check handler
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Logging middleware
async fn logging_middleware(req: Request, next: Next) -> axum::response::Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    info!("{} {} {} {:?}", method, uri, status, duration);

    response
}
