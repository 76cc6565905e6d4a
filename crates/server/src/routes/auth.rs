use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use service::auth::domain::{AuthSession, CurrentUser, LoginInput, RegisterInput, User};

use crate::errors::{ApiError, ApiJson};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<AuthSession>), ApiError> {
    let session = state.auth.register(input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(State(state): State<AppState>, ApiJson(input): ApiJson<LoginInput>) -> Result<Json<AuthSession>, ApiError> {
    Ok(Json(state.auth.login(input).await?))
}

pub async fn me(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<User>, ApiError> {
    Ok(Json(state.auth.me(user.id).await?))
}
