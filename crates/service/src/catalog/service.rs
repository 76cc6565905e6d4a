use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use super::domain::{DeleteOutcome, Listing, ListingInput, ListingQuery, MakerStats};
use super::repository::CatalogRepository;
use crate::auth::domain::CurrentUser;
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;
use crate::pagination::Page;

const FEATURED_LIMIT: u64 = 4;

pub struct CatalogService<R: CatalogRepository + AuthRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: CatalogRepository + AuthRepository + ?Sized> CatalogService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    pub async fn browse(&self, query: ListingQuery) -> Result<Page<Listing>, ServiceError> {
        self.repo.list_active(&query).await
    }

    pub async fn featured(&self) -> Result<Vec<Listing>, ServiceError> {
        self.repo.featured(FEATURED_LIMIT).await
    }

    /// Detail view; counts as one view.
    pub async fn view(&self, id: Uuid) -> Result<Listing, ServiceError> {
        self.repo.view_listing(id).await?.ok_or_else(|| ServiceError::not_found("service"))
    }

    pub async fn my_listings(&self, actor: CurrentUser) -> Result<Vec<Listing>, ServiceError> {
        self.repo.listings_by_provider(actor.id).await
    }

    #[instrument(skip(self, input), fields(user_id = %actor.id))]
    pub async fn create(&self, actor: CurrentUser, input: ListingInput) -> Result<Listing, ServiceError> {
        if !actor.role.can_publish() {
            return Err(ServiceError::forbidden("Only makers can publish services"));
        }
        input.validate()?;
        let provider = self.repo
            .find_user(actor.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        let listing = self.repo
            .insert_listing(input.into_new_listing(provider.id, &provider.username, Utc::now()))
            .await?;
        info!(listing_id = %listing.id, price_cents = listing.price_cents, event = "listing_created", "listing_created");
        Ok(listing)
    }

    #[instrument(skip(self, input), fields(user_id = %actor.id, listing_id = %id))]
    pub async fn update(&self, actor: CurrentUser, id: Uuid, input: ListingInput) -> Result<Listing, ServiceError> {
        input.validate()?;
        let existing = self.owned_listing(actor, id, "edit").await?;
        self.repo.update_listing(input.apply_to(&existing, Utc::now())).await
    }

    #[instrument(skip(self), fields(user_id = %actor.id, listing_id = %id))]
    pub async fn delete(&self, actor: CurrentUser, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        self.owned_listing(actor, id, "delete").await?;
        let outcome = self.repo.delete_or_retire_listing(id).await?;
        info!(?outcome, event = "listing_removed", "listing_removed");
        Ok(outcome)
    }

    pub async fn stats(&self, actor: CurrentUser) -> Result<MakerStats, ServiceError> {
        self.repo.maker_stats(actor.id).await
    }

    async fn owned_listing(&self, actor: CurrentUser, id: Uuid, action: &str) -> Result<Listing, ServiceError> {
        let listing = self.repo
            .get_listing(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("service"))?;
        if listing.provider_id != actor.id {
            return Err(ServiceError::forbidden(format!("Unauthorized to {} this service", action)));
        }
        Ok(listing)
    }
}
