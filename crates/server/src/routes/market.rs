use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use service::catalog::domain::{Listing, ListingQuery};
use service::pagination::{Page, Pagination};
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    #[serde(rename = "type")]
    pub listing_type: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<BrowseParams> for ListingQuery {
    fn from(p: BrowseParams) -> Self {
        let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        ListingQuery {
            listing_type: non_empty(p.listing_type),
            q: non_empty(p.q),
            pagination: Pagination::new(p.page, p.per_page),
        }
    }
}

pub async fn list(State(state): State<AppState>, Query(params): Query<BrowseParams>) -> Result<Json<Page<Listing>>, ApiError> {
    Ok(Json(state.catalog.browse(params.into()).await?))
}

pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Listing>>, ApiError> {
    Ok(Json(state.catalog.featured().await?))
}

pub async fn detail(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Listing>, ApiError> {
    Ok(Json(state.catalog.view(id).await?))
}
