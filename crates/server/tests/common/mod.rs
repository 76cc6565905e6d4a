#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use configs::AppConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.database.url = "sqlite::memory:".into();
    cfg.auth.jwt_secret = "test-secret".into();
    cfg.orders.auto_ship_after_secs = 0;
    cfg
}

pub async fn build_app(cfg: &AppConfig) -> Router {
    server::startup::build_app(cfg).await.expect("build app")
}

pub async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header("authorization", format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&b).expect("encode body"))),
        None => req.body(Body::empty()),
    }
    .expect("request");
    let resp = app.clone().oneshot(req).await.expect("call router");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("read body");
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    (status, value)
}

/// Register and return the bearer token.
pub async fn register(app: &Router, email: &str, role: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"email": email, "username": format!("user-{}", email.split('@').next().unwrap_or("x")), "password": "secret123", "role": role})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
    body["token"].as_str().expect("token").to_string()
}

pub async fn top_up(app: &Router, token: &str, amount_cents: i64) {
    let (status, body) = send(app, "POST", "/api/user/wallet/topup", Some(token), Some(json!({"amount_cents": amount_cents}))).await;
    assert_eq!(status, StatusCode::OK, "top up: {body}");
}

pub async fn publish(app: &Router, token: &str, title: &str, price_cents: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/maker/services",
        Some(token),
        Some(json!({"title": title, "description": "desc", "price_cents": price_cents, "type": "3d_print"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "publish: {body}");
    body
}
