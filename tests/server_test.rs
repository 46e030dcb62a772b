use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use deepseek_proxy::config::{default_models, Config, UpstreamConfig};
use deepseek_proxy::server::{create_router, AppState};
use deepseek_proxy::services::automation::DisabledReauthenticator;
use deepseek_proxy::services::build_driver;
use deepseek_proxy::services::session::SessionStore;
use deepseek_proxy::services::streaming::IdGenerator;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_state(upstream_url: String) -> AppState {
    let config = Config {
        upstream: UpstreamConfig {
            target_url: upstream_url,
            ..UpstreamConfig::default()
        },
        ids: IdGenerator::Seeded { seed: 42 },
        ..Config::default()
    };

    let driver = build_driver(
        &config,
        Arc::new(SessionStore::new()),
        Arc::new(DisabledReauthenticator),
    )
    .unwrap();

    AppState::new(driver, default_models())
}

fn json_request(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// -- Health endpoint --

#[tokio::test]
async fn health_returns_ok() {
    let app = create_router(test_state("http://127.0.0.1:9/api/chat".to_string()));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// -- Models --

#[tokio::test]
async fn models_lists_catalog() {
    let app = create_router(test_state("http://127.0.0.1:9/api/chat".to_string()));
    let req = Request::builder()
        .uri("/v1/models")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["object"], "list");
    assert_eq!(body["data"][0]["id"], "deepseek-chat");
    assert_eq!(body["data"][1]["id"], "deepseek-coder");
}

// -- Chat completions --

#[tokio::test]
async fn chat_completion_streams_chunks() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({
            "messages": [{"role": "user", "content": "Hello"}],
            "turnstileToken": ""
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(
                "data:{\"text\":\"Hi\"}\n\ndata:{\"text\":\" there\"}\n\n".to_string(),
                "text/event-stream",
            ),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let app = create_router(test_state(format!("{}/api/chat", upstream.uri())));
    let req = json_request(
        "/v1/chat/completions",
        json!({
            "model": "deepseek-chat",
            "stream": true,
            "messages": [{"role": "user", "content": "Hello"}]
        }),
    );

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "text/event-stream"
    );

    let body = body_string(resp).await;
    let events: Vec<&str> = body
        .split("\n\n")
        .filter(|e| !e.is_empty())
        .collect();
    assert_eq!(events.len(), 4);
    assert_eq!(events[3], "data: [DONE]");

    let contents: Vec<Value> = events[..3]
        .iter()
        .map(|e| serde_json::from_str(e.strip_prefix("data: ").unwrap()).unwrap())
        .collect();

    assert_eq!(contents[0]["choices"][0]["delta"]["content"], "Hi");
    assert_eq!(contents[1]["choices"][0]["delta"]["content"], " there");
    assert_eq!(contents[2]["choices"][0]["finish_reason"], "stop");
    assert_eq!(contents[2]["choices"][0]["index"], 2);
    assert_eq!(contents[0]["id"], contents[2]["id"]);
    assert!(contents[0]["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert!(contents[0]["system_fingerprint"]
        .as_str()
        .unwrap()
        .starts_with("fp_"));
}

#[tokio::test]
async fn chat_completion_without_messages_is_rejected() {
    let app = create_router(test_state("http://127.0.0.1:9/api/chat".to_string()));
    let req = json_request("/v1/chat/completions", json!({"model": "deepseek-chat"}));

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = serde_json::from_str(&body_string(resp).await).unwrap();
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn expired_session_without_automation_ends_stream_early() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&upstream)
        .await;

    let app = create_router(test_state(format!("{}/api/chat", upstream.uri())));
    let req = json_request(
        "/v1/chat/completions",
        json!({"messages": [{"role": "user", "content": "Hello"}]}),
    );

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let collected = resp.into_body().collect().await;
    assert!(collected.is_err());
}
