use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{DeleteOutcome, Listing, ListingQuery, MakerStats};
use crate::errors::ServiceError;
use crate::pagination::Page;

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Active listings, newest first.
    async fn list_active(&self, query: &ListingQuery) -> Result<Page<Listing>, ServiceError>;
    /// Active listings with the most sales.
    async fn featured(&self, limit: u64) -> Result<Vec<Listing>, ServiceError>;
    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, ServiceError>;
    /// Increment `views` and return the updated listing.
    async fn view_listing(&self, id: Uuid) -> Result<Option<Listing>, ServiceError>;
    async fn listings_by_provider(&self, provider_id: Uuid) -> Result<Vec<Listing>, ServiceError>;
    async fn insert_listing(&self, listing: Listing) -> Result<Listing, ServiceError>;
    async fn update_listing(&self, listing: Listing) -> Result<Listing, ServiceError>;
    /// Remove the listing, or take it offline when orders reference it.
    async fn delete_or_retire_listing(&self, id: Uuid) -> Result<DeleteOutcome, ServiceError>;
    async fn maker_stats(&self, provider_id: Uuid) -> Result<MakerStats, ServiceError>;
}
