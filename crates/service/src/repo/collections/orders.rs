use chrono::Utc;
use models::wallet_transaction as ledger;
use uuid::Uuid;

use super::docs::{UserDoc, ORDERS, SERVICES, USERS};
use super::{find_user_mut, load_users, CollectionsRepository};
use crate::catalog::domain::Listing;
use crate::errors::ServiceError;
use crate::orders::domain::{Order, OrderStatus, Settlement};
use crate::orders::repository::OrderRepository;
use crate::wallet::domain::LedgerEntry;

fn record(doc: &mut UserDoc, kind: &str, title: &str, amount: i64, is_points: bool) {
    let entry = LedgerEntry::new(doc.user.id, kind, title, amount, is_points);
    doc.record(entry);
}

fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[async_trait::async_trait]
impl OrderRepository for CollectionsRepository {
    async fn settle_order(&self, plan: &Settlement) -> Result<Order, ServiceError> {
        let o = &plan.order;
        let mut s = self.store.session().await;
        let mut users = load_users(&mut s).await?;
        let mut listings: Vec<Listing> = s.load(SERVICES).await?;
        let mut orders: Vec<Order> = s.load(ORDERS).await?;
        let now = Utc::now();

        let buyer = find_user_mut(&mut users, o.buyer_id)?;
        if buyer.user.balance_cents < o.amount_cents {
            return Err(ServiceError::InsufficientFunds);
        }
        buyer.user.balance_cents -= o.amount_cents;
        buyer.user.points += plan.points();
        buyer.user.updated_at = now;
        record(buyer, ledger::KIND_EXPENSE, "购买商品", -o.amount_cents, false);
        if plan.points() > 0 {
            record(buyer, ledger::KIND_POINTS, "购物奖励积分", plan.points(), true);
        }

        let provider = find_user_mut(&mut users, o.provider_id).map_err(|_| ServiceError::not_found("provider"))?;
        provider.user.balance_cents += o.amount_cents;
        provider.user.updated_at = now;
        record(provider, ledger::KIND_INCOME, "出售商品", o.amount_cents, false);

        let listing = listings
            .iter_mut()
            .find(|l| l.id == o.listing_id && l.is_active())
            .ok_or_else(|| ServiceError::validation("Service is not available"))?;
        listing.sales += o.quantity;

        orders.push(o.clone());
        s.stage(USERS, &users)?;
        s.stage(SERVICES, &listings)?;
        s.stage(ORDERS, &orders)?;
        s.commit().await?;
        Ok(o.clone())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, ServiceError> {
        let mut s = self.store.session().await;
        let orders: Vec<Order> = s.load(ORDERS).await?;
        Ok(orders.into_iter().find(|o| o.id == id))
    }

    async fn orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        let mut s = self.store.session().await;
        let orders: Vec<Order> = s.load(ORDERS).await?;
        Ok(newest_first(orders.into_iter().filter(|o| o.buyer_id == buyer_id).collect()))
    }

    async fn orders_for_provider(&self, provider_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        let mut s = self.store.session().await;
        let orders: Vec<Order> = s.load(ORDERS).await?;
        Ok(newest_first(orders.into_iter().filter(|o| o.provider_id == provider_id).collect()))
    }

    async fn transition_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Option<Order>, ServiceError> {
        let mut s = self.store.session().await;
        let mut orders: Vec<Order> = s.load(ORDERS).await?;
        let Some(o) = orders.iter_mut().find(|o| o.id == id && o.status == from) else {
            return Ok(None);
        };
        o.status = to;
        o.updated_at = Utc::now();
        let updated = o.clone();
        s.stage(ORDERS, &orders)?;
        s.commit().await?;
        Ok(Some(updated))
    }

    async fn cancel_order(&self, id: Uuid, from: OrderStatus) -> Result<Option<Order>, ServiceError> {
        let mut s = self.store.session().await;
        let mut orders: Vec<Order> = s.load(ORDERS).await?;
        let Some(o) = orders.iter_mut().find(|o| o.id == id && o.status == from) else {
            return Ok(None);
        };
        let now = Utc::now();
        o.status = OrderStatus::Cancelled;
        o.updated_at = now;
        let cancelled = o.clone();

        let mut users = load_users(&mut s).await?;
        let provider = find_user_mut(&mut users, cancelled.provider_id)?;
        if provider.user.balance_cents < cancelled.amount_cents {
            return Err(ServiceError::InsufficientFunds);
        }
        provider.user.balance_cents -= cancelled.amount_cents;
        provider.user.updated_at = now;
        record(provider, ledger::KIND_REFUND, "订单退款", -cancelled.amount_cents, false);

        let buyer = find_user_mut(&mut users, cancelled.buyer_id)?;
        buyer.user.balance_cents += cancelled.amount_cents;
        buyer.user.updated_at = now;
        record(buyer, ledger::KIND_REFUND, "订单退款", cancelled.amount_cents, false);

        let mut listings: Vec<Listing> = s.load(SERVICES).await?;
        if let Some(l) = listings.iter_mut().find(|l| l.id == cancelled.listing_id && l.sales >= cancelled.quantity) {
            l.sales -= cancelled.quantity;
        }

        s.stage(USERS, &users)?;
        s.stage(SERVICES, &listings)?;
        s.stage(ORDERS, &orders)?;
        s.commit().await?;
        Ok(Some(cancelled))
    }
}
