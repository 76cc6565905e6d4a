use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use service::auth::domain::CurrentUser;
use service::orders::domain::{CreateOrderInput, Order, OrderStatus};
use uuid::Uuid;

use crate::errors::{ApiError, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(input): ApiJson<CreateOrderInput>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.orders.place(user, input).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn mine(State(state): State<AppState>, Extension(user): Extension<CurrentUser>) -> Result<Json<Vec<Order>>, ApiError> {
    Ok(Json(state.orders.my_orders(user).await?))
}

pub async fn detail(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    Ok(Json(state.orders.get(user, id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    ApiJson(body): ApiJson<StatusUpdate>,
) -> Result<Json<Order>, ApiError> {
    let next: OrderStatus = body.status.parse()?;
    Ok(Json(state.orders.update_status(user, id, next).await?))
}
