//! Shared-secret authentication middleware

use crate::gate::handlers::GatewayState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Middleware enforcing the shared bearer token.
///
/// With no secret configured every request passes through; this is an
/// explicit operational mode, not a fallback.
pub async fn require_auth(
    State(state): State<GatewayState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.auth_token.as_deref() else {
        return next.run(req).await;
    };

    match credential(req.headers()) {
        None => (
            StatusCode::UNAUTHORIZED,
            "Authorization or x-api-key header required",
        )
            .into_response(),
        Some(token) if token != expected => {
            (StatusCode::UNAUTHORIZED, "Invalid token").into_response()
        }
        Some(_) => next.run(req).await,
    }
}

/// Extract the client credential from the request headers.
///
/// `Authorization` wins when present and non-empty: its value with a
/// `Bearer ` prefix stripped, or the raw value when the prefix is missing.
/// Only an absent/empty `Authorization` falls back to `x-api-key`.
fn credential(headers: &HeaderMap) -> Option<&str> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !authorization.is_empty() {
        return Some(authorization.strip_prefix("Bearer ").unwrap_or(authorization));
    }

    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !api_key.is_empty() {
        return Some(api_key);
    }

    None
}
