use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use configs::OrdersConfig;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{authorize_transition, plan_settlement, CreateOrderInput, Order, OrderStatus};
use super::repository::OrderRepository;
use crate::auth::domain::CurrentUser;
use crate::auth::repository::AuthRepository;
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;

pub struct OrderService<R: OrderRepository + CatalogRepository + AuthRepository + ?Sized + 'static> {
    repo: Arc<R>,
    cfg: OrdersConfig,
}

impl<R: OrderRepository + CatalogRepository + AuthRepository + ?Sized + 'static> OrderService<R> {
    pub fn new(repo: Arc<R>, cfg: OrdersConfig) -> Self { Self { repo, cfg } }

    /// Buy a listing with wallet balance.
    #[instrument(skip(self, input), fields(user_id = %actor.id, service_id = %input.service_id))]
    pub async fn place(&self, actor: CurrentUser, input: CreateOrderInput) -> Result<Order, ServiceError> {
        let listing = self.repo
            .get_listing(input.service_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("service"))?;
        let buyer = self.repo
            .find_user(actor.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        let plan = plan_settlement(&buyer, &listing, &input, Utc::now())?;
        let order = self.repo.settle_order(&plan).await?;
        info!(
            order_id = %order.id,
            amount_cents = order.amount_cents,
            points = order.points_awarded,
            provider_id = %order.provider_id,
            event = "order_settled",
            "order_settled"
        );
        Ok(order)
    }

    pub async fn my_orders(&self, actor: CurrentUser) -> Result<Vec<Order>, ServiceError> {
        self.repo.orders_for_buyer(actor.id).await
    }

    pub async fn sales(&self, actor: CurrentUser) -> Result<Vec<Order>, ServiceError> {
        self.repo.orders_for_provider(actor.id).await
    }

    pub async fn get(&self, actor: CurrentUser, id: Uuid) -> Result<Order, ServiceError> {
        let order = self.repo.get_order(id).await?.ok_or_else(|| ServiceError::not_found("order"))?;
        if !order.visible_to(actor) {
            return Err(ServiceError::forbidden("Not your order"));
        }
        Ok(order)
    }

    /// Move an order forward. Entering `processing` schedules the auto-ship task.
    #[instrument(skip(self), fields(user_id = %actor.id, order_id = %id, next = %next))]
    pub async fn update_status(&self, actor: CurrentUser, id: Uuid, next: OrderStatus) -> Result<Order, ServiceError> {
        let order = self.repo.get_order(id).await?.ok_or_else(|| ServiceError::not_found("order"))?;
        authorize_transition(&order, actor, next)?;

        let updated = if next == OrderStatus::Cancelled {
            self.repo.cancel_order(id, order.status).await?
        } else {
            self.repo.transition_status(id, order.status, next).await?
        }
        .ok_or_else(|| ServiceError::Conflict("order status changed concurrently".into()))?;

        info!(from = %order.status, to = %updated.status, event = "order_status_changed", "order_status_changed");
        if updated.status == OrderStatus::Processing {
            self.schedule_auto_ship(updated.id);
        }
        Ok(updated)
    }

    fn schedule_auto_ship(&self, id: Uuid) {
        let secs = self.cfg.auto_ship_after_secs;
        if secs == 0 {
            return;
        }
        let repo = self.repo.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            match repo.transition_status(id, OrderStatus::Processing, OrderStatus::Shipped).await {
                Ok(Some(_)) => info!(order_id = %id, event = "order_auto_shipped", "order_auto_shipped"),
                Ok(None) => debug!(order_id = %id, "auto-ship skipped; order already moved"),
                Err(e) => warn!(order_id = %id, error = %e, "auto-ship failed"),
            }
        });
    }
}
