use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{Order, OrderStatus, Settlement};
use crate::errors::ServiceError;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Commit a purchase in one atomic unit: guarded buyer debit, provider credit,
    /// listing sales, buyer points, the order row and its ledger entries.
    async fn settle_order(&self, plan: &Settlement) -> Result<Order, ServiceError>;
    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, ServiceError>;
    /// Newest first
    async fn orders_for_buyer(&self, buyer_id: Uuid) -> Result<Vec<Order>, ServiceError>;
    /// Newest first
    async fn orders_for_provider(&self, provider_id: Uuid) -> Result<Vec<Order>, ServiceError>;
    /// Compare-and-set; `None` when the order is no longer in `from`.
    async fn transition_status(&self, id: Uuid, from: OrderStatus, to: OrderStatus) -> Result<Option<Order>, ServiceError>;
    /// Compare-and-set to `cancelled` plus refund; `None` when the order is no longer in `from`.
    async fn cancel_order(&self, id: Uuid, from: OrderStatus) -> Result<Option<Order>, ServiceError>;
}
