mod common;

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use configs::AppConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{build_app, send, test_config};

// 故意在行中间和 JSON 中间切开
const STREAM_CHUNKS: [&str; 3] = [
    "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\ndata: {\"choi",
    "ces\":[{\"delta\":{\"content\":\"lo\"}}]}\n",
    "\n: keepalive\n\ndata: [DONE]\n\n",
];

async fn completions(Json(body): Json<Value>) -> Response {
    if body["stream"].as_bool().unwrap_or(false) {
        let chunks: Vec<Result<&'static str, Infallible>> = STREAM_CHUNKS.iter().map(|c| Ok(*c)).collect();
        ([(CONTENT_TYPE, "text/event-stream")], Body::from_stream(futures_util::stream::iter(chunks))).into_response()
    } else {
        let model = body["model"].as_str().unwrap_or_default().to_string();
        Json(json!({"choices": [{"message": {"role": "assistant", "content": format!("Hello from {model}")}}]})).into_response()
    }
}

async fn fake_upstream() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/v1/chat/completions", post(completions));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn with_upstream(addr: SocketAddr) -> AppConfig {
    let mut cfg = test_config();
    cfg.ai.api_url = format!("http://{addr}/v1/chat/completions");
    cfg.ai.api_key = Some("sk-test".into());
    cfg.ai.timeout_secs = 5;
    cfg.zeroclaw.url = format!("http://{addr}/v1/chat/completions");
    cfg
}

async fn raw_post(app: &Router, uri: &str, body: Value) -> (StatusCode, String, String) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

fn hello() -> Value {
    json!([{"role": "user", "content": "hi"}])
}

#[tokio::test]
async fn chat_stream_is_reframed_and_terminated() {
    let addr = fake_upstream().await;
    let app = build_app(&with_upstream(addr)).await;
    let (status, content_type, body) = raw_post(&app, "/api/ai/chat", json!({"messages": hello(), "stream": true})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/event-stream"));
    assert!(body.contains("data: {\"content\":\"Hel\"}"), "{body}");
    assert!(body.contains("data: {\"content\":\"lo\"}"), "{body}");
    assert!(body.trim_end().ends_with("data: [DONE]"), "{body}");
    assert!(!body.contains("keepalive"));
}

#[tokio::test]
async fn chat_without_stream_returns_content() {
    let addr = fake_upstream().await;
    let app = build_app(&with_upstream(addr)).await;
    let (status, body) = send(&app, "POST", "/api/ai/chat", None, Some(json!({"messages": hello()}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Hello from deepseek-chat");
}

#[tokio::test]
async fn chat_requires_api_key() {
    let app = build_app(&test_config()).await;
    let (status, body) = send(&app, "POST", "/api/ai/chat", None, Some(json!({"messages": hello()}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("API Configuration Error"), "{body}");
}

#[tokio::test]
async fn chat_rejects_empty_messages() {
    let addr = fake_upstream().await;
    let app = build_app(&with_upstream(addr)).await;
    let (status, _) = send(&app, "POST", "/api/ai/chat", None, Some(json!({"messages": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreachable_llm_serves_fallback_text() {
    let mut cfg = test_config();
    cfg.ai.api_url = "http://127.0.0.1:1/v1/chat/completions".into();
    cfg.ai.api_key = Some("sk-test".into());
    cfg.ai.timeout_secs = 2;
    cfg.ai.fallback_text = Some("AI 助手暂时不可用".into());
    let app = build_app(&cfg).await;
    let (status, body) = send(&app, "POST", "/api/ai/chat", None, Some(json!({"messages": hello()}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fallback"], true);
    assert_eq!(body["content"], "AI 助手暂时不可用");

    cfg.ai.fallback_text = None;
    let app = build_app(&cfg).await;
    let (status, body) = send(&app, "POST", "/api/ai/chat", None, Some(json!({"messages": hello()}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "AI Service Unavailable");
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn zeroclaw_stream_passes_bytes_through() {
    let addr = fake_upstream().await;
    let app = build_app(&with_upstream(addr)).await;
    let (status, content_type, body) =
        raw_post(&app, "/api/zeroclaw/agent", json!({"messages": hello(), "agentId": "tutor"})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("text/event-stream"));
    assert_eq!(body, STREAM_CHUNKS.concat());
}

#[tokio::test]
async fn zeroclaw_complete_uses_agent_as_model() {
    let addr = fake_upstream().await;
    let app = build_app(&with_upstream(addr)).await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/zeroclaw/agent",
        None,
        Some(json!({"messages": hello(), "agent_id": "tutor", "stream": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Hello from tutor");
}

#[tokio::test]
async fn zeroclaw_rejects_empty_messages() {
    let addr = fake_upstream().await;
    let app = build_app(&with_upstream(addr)).await;
    let (status, body) = send(&app, "POST", "/api/zeroclaw/agent", None, Some(json!({"messages": [], "agentId": "tutor"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "messages must not be empty");
}

#[tokio::test]
async fn zeroclaw_down_is_503_or_falls_back() {
    let addr = fake_upstream().await;
    let mut cfg = with_upstream(addr);
    cfg.zeroclaw.url = "http://127.0.0.1:1/v1/chat/completions".into();
    cfg.zeroclaw.stream_connect_timeout_secs = 1;
    let app = build_app(&cfg).await;
    let (status, body) = send(&app, "POST", "/api/zeroclaw/agent", None, Some(json!({"messages": hello()}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "ZeroClaw Service Unavailable");

    cfg.zeroclaw.fallback_to_llm = true;
    let app = build_app(&cfg).await;
    let (status, _, body) = raw_post(&app, "/api/zeroclaw/agent", json!({"messages": hello()})).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("data: {\"content\":\"Hel\"}"), "{body}");
}
