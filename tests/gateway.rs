//! End-to-end tests for the llmp gateway
//!
//! Drives the real router against wiremock upstreams: auth, body rewriting,
//! non-streaming and streaming relays, and the error paths.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use llmp::{Config, GatewayState, LitellmParams, ModelConfig};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn model_entry(name: &str, model: &str, api_base: &str, api_key: &str) -> ModelConfig {
    ModelConfig {
        model_name: name.to_string(),
        litellm_params: LitellmParams {
            model: model.to_string(),
            api_base: api_base.to_string(),
            api_key: api_key.to_string(),
        },
    }
}

fn gateway(auth_token: Option<&str>, model_list: Vec<ModelConfig>) -> axum::Router {
    let config = Config {
        model_list,
        auth_token: auth_token.map(str::to_string),
    };
    let state = GatewayState::new(&config).unwrap();
    llmp::gate::server::app(state)
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn non_streaming_response_relayed_verbatim() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("authorization", "Bearer sk-upstream"))
        .and(header("user-agent", "llmp-proxy/1.0"))
        .and(body_string_contains(r#""model":"claude-3-opus""#))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"id":"abc"}"#.as_bytes().to_vec(), "application/json")
                .insert_header("x-upstream-marker", "relayed"),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = gateway(
        None,
        vec![model_entry(
            "claude-x",
            "anthropic/claude-3-opus",
            &upstream.uri(),
            "sk-upstream",
        )],
    );

    let request = post_json(
        "/v1/messages",
        r#"{"model":"claude-x","messages":[{"role":"user","content":"hi"}]}"#,
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-upstream-marker").unwrap(),
        "relayed"
    );
    assert_eq!(body_bytes(response).await, br#"{"id":"abc"}"#);
}

#[tokio::test]
async fn rewritten_body_keeps_other_fields() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(r#""model":"claude-3-opus""#))
        .and(body_string_contains(r#""temperature":0.25"#))
        .and(body_string_contains(r#""stream":true"#))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"ok\n".to_vec(), "text/plain"))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = gateway(
        None,
        vec![model_entry(
            "claude-x",
            "anthropic/claude-3-opus",
            &upstream.uri(),
            "",
        )],
    );

    let request = post_json(
        "/v1/chat/completions",
        r#"{"model":"claude-x","temperature":0.25,"stream":true}"#,
    );
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn streaming_relays_lines_in_order_and_drops_framing_headers() {
    let upstream = MockServer::start().await;
    // CRLF-terminated SSE from the upstream; the relay normalizes to LF.
    let sse = b"data: one\r\n\r\ndata: two\r\n\r\ndata: [DONE]\r\n".to_vec();
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&upstream)
        .await;

    let app = gateway(
        None,
        vec![model_entry(
            "claude-x",
            "anthropic/claude-3-opus",
            &upstream.uri(),
            "",
        )],
    );

    let request = post_json(
        "/v1/chat/completions",
        r#"{"model":"claude-x","stream":true}"#,
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("content-length").is_none());
    assert!(response.headers().get("transfer-encoding").is_none());
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/event-stream"
    );
    assert_eq!(
        body_bytes(response).await,
        b"data: one\n\ndata: two\n\ndata: [DONE]\n"
    );
}

#[tokio::test]
async fn upstream_error_status_passes_through() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_raw(br#"{"error":"rate limited"}"#.to_vec(), "application/json"),
        )
        .mount(&upstream)
        .await;

    let app = gateway(
        None,
        vec![model_entry(
            "claude-x",
            "anthropic/claude-3-opus",
            &upstream.uri(),
            "",
        )],
    );

    let response = app
        .oneshot(post_json("/v1/messages", r#"{"model":"claude-x"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_bytes(response).await, br#"{"error":"rate limited"}"#);
}

#[tokio::test]
async fn unreachable_upstream_yields_502() {
    // Nothing listens on port 9; the connection is refused immediately.
    let app = gateway(
        None,
        vec![model_entry(
            "claude-x",
            "anthropic/claude-3-opus",
            "http://127.0.0.1:9",
            "",
        )],
    );

    let response = app
        .oneshot(post_json("/v1/messages", r#"{"model":"claude-x"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_bytes(response).await, b"Error forwarding request");
}

#[tokio::test]
async fn openai_route_rejected_on_every_endpoint() {
    let app = gateway(
        None,
        vec![model_entry(
            "gpt-4o",
            "openai/gpt-4o",
            "http://127.0.0.1:9",
            "",
        )],
    );

    for uri in ["/v1/chat/completions", "/chat/completions", "/v1/messages"] {
        let response = app
            .clone()
            .oneshot(post_json(uri, r#"{"model":"gpt-4o"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_bytes(response).await,
            b"OpenAI models should use /chat/completions endpoint"
        );
    }
}

#[tokio::test]
async fn missing_or_unknown_model_rejected() {
    let app = gateway(
        None,
        vec![model_entry(
            "claude-x",
            "anthropic/claude-3-opus",
            "http://127.0.0.1:9",
            "",
        )],
    );

    let response = app
        .clone()
        .oneshot(post_json("/v1/messages", r#"{"messages":[]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"Model field is required");

    let response = app
        .clone()
        .oneshot(post_json("/v1/messages", r#"{"model":""}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"Model field is required");

    let response = app
        .oneshot(post_json("/v1/messages", r#"{"model":"nope"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"Model not found");
}

#[tokio::test]
async fn auth_disabled_allows_everything() {
    let app = gateway(None, vec![]);

    // No credential at all still reaches the handler (which then 400s).
    let response = app
        .oneshot(post_json("/v1/messages", r#"{"model":"nope"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn auth_matrix_with_secret_configured() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"{}".to_vec(), "application/json"))
        .mount(&upstream)
        .await;

    let routes = vec![model_entry(
        "claude-x",
        "anthropic/claude-3-opus",
        &upstream.uri(),
        "",
    )];
    let app = gateway(Some("sesame"), routes);
    let body = r#"{"model":"claude-x"}"#;

    // No credential
    let response = app
        .clone()
        .oneshot(post_json("/v1/messages", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_bytes(response).await,
        b"Authorization or x-api-key header required"
    );

    // Wrong bearer token
    let mut request = post_json("/v1/messages", body);
    request
        .headers_mut()
        .insert("authorization", "Bearer wrong".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_bytes(response).await, b"Invalid token");

    // Correct bearer token
    let mut request = post_json("/v1/messages", body);
    request
        .headers_mut()
        .insert("authorization", "Bearer sesame".parse().unwrap());
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Correct x-api-key, no Authorization header
    let mut request = post_json("/v1/messages", body);
    request
        .headers_mut()
        .insert("x-api-key", "sesame".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn health_is_open_even_with_auth_enabled() {
    let app = gateway(Some("sesame"), vec![]);

    let request = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn model_list_reflects_configuration() {
    let app = gateway(
        Some("sesame"),
        vec![
            model_entry("claude-x", "anthropic/claude-3-opus", "http://a", ""),
            model_entry("gpt-4o", "openai/gpt-4o", "http://b", ""),
        ],
    );

    let request = Request::builder()
        .method("GET")
        .uri("/v1/models")
        .header("authorization", "Bearer sesame")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["object"], "list");
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["claude-x", "gpt-4o"]);
    assert_eq!(body["data"][0]["owned_by"], "anthropic");
    assert_eq!(body["data"][1]["owned_by"], "openai");
}
