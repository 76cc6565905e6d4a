use models::{listing, order};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::convert::{listing_active_model, listing_from_model};
use super::SeaOrmRepository;
use crate::catalog::domain::{DeleteOutcome, Listing, ListingQuery, MakerStats};
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::orders::domain::OrderStatus;
use crate::pagination::Page;

#[async_trait::async_trait]
impl CatalogRepository for SeaOrmRepository {
    async fn list_active(&self, query: &ListingQuery) -> Result<Page<Listing>, ServiceError> {
        let (idx, per) = query.pagination.normalize();
        let mut select = listing::Entity::find().filter(listing::Column::Status.eq(listing::STATUS_ACTIVE));
        if let Some(t) = query.listing_type.as_deref() {
            select = select.filter(listing::Column::ListingType.eq(t));
        }
        if let Some(q) = query.q.as_deref() {
            select = select.filter(
                Condition::any()
                    .add(listing::Column::Title.contains(q))
                    .add(listing::Column::Description.contains(q)),
            );
        }
        let paginator = select
            .order_by_desc(listing::Column::CreatedAt)
            .paginate(&self.db, per);
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(idx).await?;
        Ok(Page {
            items: items.into_iter().map(listing_from_model).collect(),
            total,
            page: idx as u32 + 1,
            per_page: per as u32,
        })
    }

    async fn featured(&self, limit: u64) -> Result<Vec<Listing>, ServiceError> {
        let rows = listing::Entity::find()
            .filter(listing::Column::Status.eq(listing::STATUS_ACTIVE))
            .order_by_desc(listing::Column::Sales)
            .order_by_desc(listing::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(listing_from_model).collect())
    }

    async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>, ServiceError> {
        Ok(listing::Entity::find_by_id(id).one(&self.db).await?.map(listing_from_model))
    }

    async fn view_listing(&self, id: Uuid) -> Result<Option<Listing>, ServiceError> {
        let res = listing::Entity::update_many()
            .col_expr(listing::Column::Views, Expr::col(listing::Column::Views).add(1))
            .filter(listing::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        self.get_listing(id).await
    }

    async fn listings_by_provider(&self, provider_id: Uuid) -> Result<Vec<Listing>, ServiceError> {
        let rows = listing::Entity::find()
            .filter(listing::Column::ProviderId.eq(provider_id))
            .order_by_desc(listing::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(listing_from_model).collect())
    }

    async fn insert_listing(&self, l: Listing) -> Result<Listing, ServiceError> {
        let created = listing_active_model(&l).insert(&self.db).await?;
        Ok(listing_from_model(created))
    }

    async fn update_listing(&self, l: Listing) -> Result<Listing, ServiceError> {
        let updated = listing_active_model(&l).update(&self.db).await?;
        Ok(listing_from_model(updated))
    }

    async fn delete_or_retire_listing(&self, id: Uuid) -> Result<DeleteOutcome, ServiceError> {
        let referenced = order::Entity::find()
            .filter(order::Column::ListingId.eq(id))
            .count(&self.db)
            .await?;
        if referenced > 0 {
            listing::Entity::update_many()
                .col_expr(listing::Column::Status, Expr::value(listing::STATUS_OFFLINE))
                .filter(listing::Column::Id.eq(id))
                .exec(&self.db)
                .await?;
            return Ok(DeleteOutcome::Retired);
        }
        listing::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn maker_stats(&self, provider_id: Uuid) -> Result<MakerStats, ServiceError> {
        let listings = listing::Entity::find()
            .filter(listing::Column::ProviderId.eq(provider_id))
            .all(&self.db)
            .await?;
        let orders = order::Entity::find()
            .filter(order::Column::ProviderId.eq(provider_id))
            .filter(order::Column::Status.ne(OrderStatus::Cancelled.as_str()))
            .all(&self.db)
            .await?;
        Ok(MakerStats {
            earnings_cents: orders.iter().map(|o| o.amount_cents).sum(),
            views: listings.iter().map(|l| i64::from(l.views)).sum(),
            orders: orders.len() as u64,
            sales: listings.iter().map(|l| i64::from(l.sales)).sum(),
        })
    }
}
