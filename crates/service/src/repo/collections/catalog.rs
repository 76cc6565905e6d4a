use chrono::Utc;
use uuid::Uuid;

use super::docs::{ORDERS, SERVICES};
use super::CollectionsRepository;
use crate::catalog::domain::{DeleteOutcome, Listing, ListingQuery, MakerStats};
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::orders::domain::{Order, OrderStatus};
use crate::pagination::Page;

fn newest_first(items: &mut [Listing]) {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait::async_trait]
impl CatalogRepository for CollectionsRepository {
    async fn list_active(&self, query: &ListingQuery) -> Result<Page<Listing>, ServiceError> {
        let mut s = self.store.session().await;
        let listings: Vec<Listing> = s.load(SERVICES).await?;
        let mut matching: Vec<Listing> = listings.into_iter().filter(|l| query.matches(l)).collect();
        newest_first(&mut matching);
        Ok(query.pagination.slice(&matching))
    }

    async fn featured(&self, limit: u64) -> Result<Vec<Listing>, ServiceError> {
        let mut s = self.store.session().await;
        let listings: Vec<Listing> = s.load(SERVICES).await?;
        let mut active: Vec<Listing> = listings.into_iter().filter(Listing::is_active).collect();
        newest_first(&mut active);
        // 稳定排序：销量相同时保持新的在前
        active.sort_by(|a, b| b.sales.cmp(&a.sales));
        active.truncate(limit as usize);
        Ok(active)
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, ServiceError> {
        let mut s = self.store.session().await;
        let listings: Vec<Listing> = s.load(SERVICES).await?;
        Ok(listings.into_iter().find(|l| l.id == id))
    }

    async fn view_listing(&self, id: Uuid) -> Result<Option<Listing>, ServiceError> {
        let mut s = self.store.session().await;
        let mut listings: Vec<Listing> = s.load(SERVICES).await?;
        let Some(l) = listings.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        l.views = l.views.saturating_add(1);
        let viewed = l.clone();
        s.stage(SERVICES, &listings)?;
        s.commit().await?;
        Ok(Some(viewed))
    }

    async fn listings_by_provider(&self, provider_id: Uuid) -> Result<Vec<Listing>, ServiceError> {
        let mut s = self.store.session().await;
        let listings: Vec<Listing> = s.load(SERVICES).await?;
        let mut mine: Vec<Listing> = listings.into_iter().filter(|l| l.provider_id == provider_id).collect();
        newest_first(&mut mine);
        Ok(mine)
    }

    async fn insert_listing(&self, listing: Listing) -> Result<Listing, ServiceError> {
        let mut s = self.store.session().await;
        let mut listings: Vec<Listing> = s.load(SERVICES).await?;
        listings.push(listing.clone());
        s.stage(SERVICES, &listings)?;
        s.commit().await?;
        Ok(listing)
    }

    async fn update_listing(&self, listing: Listing) -> Result<Listing, ServiceError> {
        let mut s = self.store.session().await;
        let mut listings: Vec<Listing> = s.load(SERVICES).await?;
        let slot = listings
            .iter_mut()
            .find(|l| l.id == listing.id)
            .ok_or_else(|| ServiceError::not_found("service"))?;
        *slot = listing.clone();
        s.stage(SERVICES, &listings)?;
        s.commit().await?;
        Ok(listing)
    }

    async fn delete_or_retire_listing(&self, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        let mut s = self.store.session().await;
        let mut listings: Vec<Listing> = s.load(SERVICES).await?;
        let orders: Vec<Order> = s.load(ORDERS).await?;
        let outcome = if orders.iter().any(|o| o.listing_id == id) {
            if let Some(l) = listings.iter_mut().find(|l| l.id == id) {
                l.status = models::listing::STATUS_OFFLINE.to_string();
                l.updated_at = Utc::now();
            }
            DeleteOutcome::Retired
        } else {
            listings.retain(|l| l.id != id);
            DeleteOutcome::Deleted
        };
        s.stage(SERVICES, &listings)?;
        s.commit().await?;
        Ok(outcome)
    }

    async fn maker_stats(&self, provider_id: Uuid) -> Result<MakerStats, ServiceError> {
        let mut s = self.store.session().await;
        let listings: Vec<Listing> = s.load(SERVICES).await?;
        let orders: Vec<Order> = s.load(ORDERS).await?;
        let mine = listings.iter().filter(|l| l.provider_id == provider_id);
        let sold: Vec<&Order> = orders
            .iter()
            .filter(|o| o.provider_id == provider_id && o.status != OrderStatus::Cancelled)
            .collect();
        Ok(MakerStats {
            earnings_cents: sold.iter().map(|o| o.amount_cents).sum(),
            views: mine.clone().map(|l| i64::from(l.views)).sum(),
            orders: sold.len() as u64,
            sales: mine.map(|l| i64::from(l.sales)).sum(),
        })
    }
}
