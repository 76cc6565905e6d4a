use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use service::auth::domain::CurrentUser;
use service::wallet::domain::{Address, AddressInput, CheckinOutcome, Profile, ProfileUpdate, WalletView};

use crate::errors::{ApiError, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TopUp {
    pub amount_cents: i64,
}

pub async fn profile(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.wallet.profile(user).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(state.wallet.update_profile(user, update).await?))
}

pub async fn addresses(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<Vec<Address>>, ApiError> {
    Ok(Json(state.wallet.addresses(user).await?))
}

pub async fn add_address(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    let addr = state.wallet.add_address(user, input).await?;
    Ok((StatusCode::CREATED, Json(addr)))
}

pub async fn wallet(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<WalletView>, ApiError> {
    Ok(Json(state.wallet.wallet(user).await?))
}

pub async fn top_up(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(body): ApiJson<TopUp>,
) -> Result<Json<WalletView>, ApiError> {
    Ok(Json(state.wallet.top_up(user, body.amount_cents).await?))
}

pub async fn check_in(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<CheckinOutcome>, ApiError> {
    Ok(Json(state.wallet.check_in(user).await?))
}
