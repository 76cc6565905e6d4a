use chrono::Utc;
use models::{listing, order, user, wallet_transaction as ledger};
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, TransactionTrait};
use uuid::Uuid;

use super::convert::{order_active_model, order_from_model};
use super::SeaOrmRepository;
use crate::errors::ServiceError;
use crate::orders::domain::{Order, OrderStatus, Settlement};
use crate::orders::repository::OrderRepository;

/// `balance += delta` for one user; returns whether the row was touched.
/// A negative delta is guarded so the balance cannot drop below zero.
async fn adjust_balance<C: ConnectionTrait>(db: &C, user_id: Uuid, delta: i64) -> Result<bool, ServiceError> {
    let mut update = user::Entity::update_many()
        .col_expr(user::Column::BalanceCents, Expr::col(user::Column::BalanceCents).add(delta))
        .filter(user::Column::Id.eq(user_id));
    if delta < 0 {
        update = update.filter(user::Column::BalanceCents.gte(-delta));
    }
    Ok(update.exec(db).await?.rows_affected > 0)
}

async fn set_status<C: ConnectionTrait>(db: &C, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<bool, ServiceError> {
    let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
    let res = order::Entity::update_many()
        .col_expr(order::Column::Status, Expr::value(to.as_str()))
        .col_expr(order::Column::UpdatedAt, Expr::value(now))
        .filter(order::Column::Id.eq(id))
        .filter(order::Column::Status.eq(from.as_str()))
        .exec(db)
        .await?;
    Ok(res.rows_affected > 0)
}

async fn find_order<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<Order>, ServiceError> {
    order::Entity::find_by_id(id).one(db).await?.map(order_from_model).transpose()
}

#[async_trait::async_trait]
impl OrderRepository for SeaOrmRepository {
    async fn settle_order(&self, plan: &Settlement) -> Result<Order, ServiceError> {
        let o = &plan.order;
        let txn = self.db.begin().await?;

        if !adjust_balance(&txn, o.buyer_id, -o.amount_cents).await? {
            return Err(ServiceError::InsufficientFunds);
        }
        if plan.points() > 0 {
            user::Entity::update_many()
                .col_expr(user::Column::Points, Expr::col(user::Column::Points).add(plan.points()))
                .filter(user::Column::Id.eq(o.buyer_id))
                .exec(&txn)
                .await?;
        }
        if !adjust_balance(&txn, o.provider_id, o.amount_cents).await? {
            return Err(ServiceError::not_found("provider"));
        }
        let sold = listing::Entity::update_many()
            .col_expr(listing::Column::Sales, Expr::col(listing::Column::Sales).add(o.quantity))
            .filter(listing::Column::Id.eq(o.listing_id))
            .filter(listing::Column::Status.eq(listing::STATUS_ACTIVE))
            .exec(&txn)
            .await?;
        if sold.rows_affected == 0 {
            return Err(ServiceError::validation("Service is not available"));
        }

        let created = order_active_model(o).insert(&txn).await?;
        ledger::record(&txn, o.buyer_id, ledger::KIND_EXPENSE, "购买商品", -o.amount_cents, false).await?;
        if plan.points() > 0 {
            ledger::record(&txn, o.buyer_id, ledger::KIND_POINTS, "购物奖励积分", plan.points(), true).await?;
        }
        ledger::record(&txn, o.provider_id, ledger::KIND_INCOME, "出售商品", o.amount_cents, false).await?;
        txn.commit().await?;
        order_from_model(created)
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, ServiceError> {
        find_order(&self.db, id).await
    }

    async fn orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        order::Entity::find()
            .filter(order::Column::BuyerId.eq(buyer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_from_model)
            .collect()
    }

    async fn orders_for_provider(&self, provider_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        order::Entity::find()
            .filter(order::Column::ProviderId.eq(provider_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(order_from_model)
            .collect()
    }

    async fn transition_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Option<Order>, ServiceError> {
        if !set_status(&self.db, id, from, to).await? {
            return Ok(None);
        }
        find_order(&self.db, id).await
    }

    async fn cancel_order(&self, id: Uuid, from: OrderStatus) -> Result<Option<Order>, ServiceError> {
        let txn = self.db.begin().await?;
        if !set_status(&txn, id, from, OrderStatus::Cancelled).await? {
            return Ok(None);
        }
        let o = find_order(&txn, id).await?.ok_or_else(|| ServiceError::not_found("order"))?;

        if !adjust_balance(&txn, o.provider_id, -o.amount_cents).await? {
            return Err(ServiceError::InsufficientFunds);
        }
        adjust_balance(&txn, o.buyer_id, o.amount_cents).await?;
        listing::Entity::update_many()
            .col_expr(listing::Column::Sales, Expr::col(listing::Column::Sales).sub(o.quantity))
            .filter(listing::Column::Id.eq(o.listing_id))
            .filter(listing::Column::Sales.gte(o.quantity))
            .exec(&txn)
            .await?;
        ledger::record(&txn, o.buyer_id, ledger::KIND_REFUND, "订单退款", o.amount_cents, false).await?;
        ledger::record(&txn, o.provider_id, ledger::KIND_REFUND, "订单退款", -o.amount_cents, false).await?;
        txn.commit().await?;
        Ok(Some(o))
    }
}
