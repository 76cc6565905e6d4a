use chrono::{DateTime, Utc};
use models::listing as lm;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::pagination::Pagination;

const MAX_TAGS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub listing_type: String,
    pub status: String,
    pub production_mode: Option<String>,
    pub image: Option<String>,
    pub details: Option<String>,
    pub tags: Vec<String>,
    pub sales: i32,
    pub views: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_active(&self) -> bool {
        self.status == lm::STATUS_ACTIVE
    }
}

/// Create/update payload. Update replaces every field.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingInput {
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    #[serde(rename = "type", alias = "listing_type")]
    pub listing_type: String,
    #[serde(default)]
    pub production_mode: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ListingInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        lm::validate_fields(&self.title, self.price_cents, &self.listing_type)?;
        if self.description.trim().is_empty() {
            return Err(ServiceError::validation("description required"));
        }
        if let Some(mode) = self.production_mode.as_deref() {
            if !lm::is_valid_mode(mode) {
                return Err(ServiceError::validation("production_mode must be self or factory"));
            }
        }
        if let Some(image) = self.image.as_deref() {
            if !image.is_empty() && !(image.starts_with("http://") || image.starts_with("https://")) {
                return Err(ServiceError::validation("image must be an http(s) url"));
            }
        }
        if self.tags.len() > MAX_TAGS {
            return Err(ServiceError::validation(format!("at most {} tags", MAX_TAGS)));
        }
        if let Some(status) = self.status.as_deref() {
            if !lm::is_valid_status(status) {
                return Err(ServiceError::validation("status must be active, pending or offline"));
            }
        }
        Ok(())
    }

    fn clean_image(&self) -> Option<String> {
        self.image.clone().filter(|s| !s.trim().is_empty())
    }

    /// Build a brand-new active listing owned by `provider`.
    pub fn into_new_listing(self, provider_id: Uuid, provider_name: &str, now: DateTime<Utc>) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            provider_id,
            provider_name: provider_name.to_string(),
            image: self.clean_image(),
            title: self.title.trim().to_string(),
            description: self.description,
            price_cents: self.price_cents,
            listing_type: self.listing_type,
            status: lm::STATUS_ACTIVE.to_string(),
            production_mode: self.production_mode,
            details: self.details,
            tags: self.tags,
            sales: 0,
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the editable fields of `existing`; counters and ownership stay.
    pub fn apply_to(self, existing: &Listing, now: DateTime<Utc>) -> Listing {
        Listing {
            image: self.clean_image(),
            title: self.title.trim().to_string(),
            description: self.description,
            price_cents: self.price_cents,
            listing_type: self.listing_type,
            status: self.status.unwrap_or_else(|| existing.status.clone()),
            production_mode: self.production_mode,
            details: self.details,
            tags: self.tags,
            updated_at: now,
            ..existing.clone()
        }
    }
}

/// Market browse filters
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub listing_type: Option<String>,
    pub q: Option<String>,
    pub pagination: Pagination,
}

impl ListingQuery {
    /// In-memory predicate matching the SQL filter of the relational backend.
    pub fn matches(&self, l: &Listing) -> bool {
        if !l.is_active() {
            return false;
        }
        if let Some(t) = self.listing_type.as_deref() {
            if l.listing_type != t {
                return false;
            }
        }
        if let Some(q) = self.q.as_deref() {
            let q = q.to_lowercase();
            if !l.title.to_lowercase().contains(&q) && !l.description.to_lowercase().contains(&q) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// 已有订单，只能下架
    Retired,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MakerStats {
    pub earnings_cents: i64,
    pub views: i64,
    pub orders: u64,
    pub sales: i64,
}
