use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde_json::{json, Value};
use service::auth::domain::CurrentUser;
use service::catalog::domain::{Listing, ListingInput, MakerStats};
use service::orders::domain::Order;
use tracing::info;
use uuid::Uuid;

use crate::errors::{ApiError, ApiJson};
use crate::state::AppState;

pub async fn my_listings(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(state.catalog.my_listings(user).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(input): ApiJson<ListingInput>,
) -> Result<(StatusCode, Json<Listing>), ApiError> {
    let listing = state.catalog.create(user, input).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ApiJson(input): ApiJson<ListingInput>,
) -> Result<Json<Listing>, ApiError> {
    Ok(Json(state.catalog.update(user, id, input).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let outcome = state.catalog.delete(user, id).await?;
    info!(listing_id = %id, outcome = ?outcome, "listing removed");
    Ok(Json(json!({ "success": true })))
}

pub async fn sales(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.sales(user).await?))
}

pub async fn stats(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<MakerStats>, ApiError> {
    Ok(Json(state.catalog.stats(user).await?))
}
