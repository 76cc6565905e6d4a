use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::errors::ApiError;
use crate::state::AppState;

/// Bearer-token middleware for protected routes.
/// 缺失或格式错误返回 401，签名无效或过期返回 403；校验通过后把 `CurrentUser` 放入扩展
pub async fn require_bearer(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let Some(token) = token else {
        tracing::debug!(path = %req.uri().path(), "missing bearer token");
        return Err(ApiError::unauthorized("Access token required"));
    };
    let user = state.auth.verify_token(&token)?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
