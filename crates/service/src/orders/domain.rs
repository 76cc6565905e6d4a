use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::domain::{CurrentUser, User};
use crate::catalog::domain::Listing;
use crate::errors::ServiceError;

pub const MIN_QUANTITY: i32 = 1;
pub const MAX_QUANTITY: i32 = 99;
/// 每消费 10 元奖励 1 积分
pub const CENTS_PER_POINT: i64 = 1000;

/// Forward-only order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Paid,
    #[serde(alias = "pending_shipment")]
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Paid => "paid",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Paid, Processing) | (Processing, Shipped) | (Shipped, Completed) | (Paid, Cancelled)
        )
    }
}

impl FromStr for OrderStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(OrderStatus::Paid),
            "processing" | "pending_shipment" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(ServiceError::validation(format!("unknown order status: {}", other))),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub buyer_name: String,
    pub provider_id: Uuid,
    pub listing_id: Uuid,
    pub listing_title: String,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub amount_cents: i64,
    pub points_awarded: i64,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.buyer_id == user_id || self.provider_id == user_id
    }

    pub fn visible_to(&self, actor: CurrentUser) -> bool {
        actor.is_admin() || self.is_party(actor.id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderInput {
    pub service_id: Uuid,
    #[serde(default)]
    pub quantity: Option<i32>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Everything a backend needs to commit one purchase atomically.
#[derive(Debug, Clone)]
pub struct Settlement {
    pub order: Order,
}

impl Settlement {
    pub fn amount_cents(&self) -> i64 { self.order.amount_cents }
    pub fn points(&self) -> i64 { self.order.points_awarded }
}

pub fn points_for(amount_cents: i64) -> i64 {
    amount_cents / CENTS_PER_POINT
}

/// Check a purchase against the buyer and listing and price it.
///
/// The balance check here is advisory; backends re-check with a guarded update.
pub fn plan_settlement(
    buyer: &User,
    listing: &Listing,
    input: &CreateOrderInput,
    now: DateTime<Utc>,
) -> Result<Settlement, ServiceError> {
    if !listing.is_active() {
        return Err(ServiceError::validation("Service is not available"));
    }
    if listing.provider_id == buyer.id {
        return Err(ServiceError::validation("Cannot buy your own service"));
    }
    let quantity = input.quantity.unwrap_or(MIN_QUANTITY);
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&quantity) {
        return Err(ServiceError::validation(format!("quantity must be {}-{}", MIN_QUANTITY, MAX_QUANTITY)));
    }
    let amount_cents = listing
        .price_cents
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| ServiceError::validation("amount overflow"))?;
    if buyer.balance_cents < amount_cents {
        return Err(ServiceError::InsufficientFunds);
    }
    let notes = input.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
    Ok(Settlement {
        order: Order {
            id: Uuid::new_v4(),
            buyer_id: buyer.id,
            buyer_name: buyer.username.clone(),
            provider_id: listing.provider_id,
            listing_id: listing.id,
            listing_title: listing.title.clone(),
            quantity,
            unit_price_cents: listing.price_cents,
            amount_cents,
            points_awarded: points_for(amount_cents),
            status: OrderStatus::Paid,
            notes,
            created_at: now,
            updated_at: now,
        },
    })
}

/// Who may move an order from its current status to `next`.
///
/// Illegal transitions are a conflict; legal ones by the wrong party are forbidden.
pub fn authorize_transition(order: &Order, actor: CurrentUser, next: OrderStatus) -> Result<(), ServiceError> {
    use OrderStatus::*;
    if !order.visible_to(actor) {
        return Err(ServiceError::forbidden("Not your order"));
    }
    if !order.status.can_transition_to(next) {
        return Err(ServiceError::Conflict(format!("cannot move order from {} to {}", order.status, next)));
    }
    if actor.is_admin() {
        return Ok(());
    }
    let is_buyer = order.buyer_id == actor.id;
    let is_provider = order.provider_id == actor.id;
    let allowed = match (order.status, next) {
        (Paid, Processing) | (Processing, Shipped) => is_provider,
        (Shipped, Completed) => is_buyer,
        (Paid, Cancelled) => is_buyer || is_provider,
        _ => false,
    };
    if allowed {
        Ok(())
    } else {
        Err(ServiceError::forbidden(format!("not allowed to mark order {}", next)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{NewUser, Role};
    use crate::catalog::domain::ListingInput;

    fn user(role: Role, balance: i64) -> User {
        let mut u = User::fresh(NewUser { email: "u@example.com".into(), username: "U".into(), role }, Utc::now());
        u.balance_cents = balance;
        u
    }

    fn listing(provider: &User, price_cents: i64) -> Listing {
        ListingInput {
            title: "Print".into(),
            description: "desc".into(),
            price_cents,
            listing_type: models::listing::TYPE_3D_PRINT.into(),
            production_mode: None,
            image: None,
            details: None,
            tags: vec![],
            status: None,
        }
        .into_new_listing(provider.id, &provider.username, Utc::now())
    }

    fn input(listing: &Listing, quantity: Option<i32>) -> CreateOrderInput {
        CreateOrderInput { service_id: listing.id, quantity, notes: Some("  ".into()) }
    }

    #[test]
    fn status_machine_is_forward_only() {
        use OrderStatus::*;
        assert!(Paid.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));
        assert!(Paid.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Paid));
        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Processing.can_transition_to(Cancelled));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn legacy_status_name_parses() {
        assert_eq!("pending_shipment".parse::<OrderStatus>().unwrap(), OrderStatus::Processing);
        let s: OrderStatus = serde_json::from_str("\"pending_shipment\"").unwrap();
        assert_eq!(s, OrderStatus::Processing);
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn plan_prices_and_awards_points() {
        let maker = user(Role::Maker, 0);
        let buyer = user(Role::Student, 20_000);
        let l = listing(&maker, 5_550);
        let plan = plan_settlement(&buyer, &l, &input(&l, Some(2)), Utc::now()).unwrap();
        assert_eq!(plan.amount_cents(), 11_100);
        // floor(111 元 / 10)
        assert_eq!(plan.points(), 11);
        assert_eq!(plan.order.status, OrderStatus::Paid);
        assert_eq!(plan.order.notes, None);
    }

    #[test]
    fn plan_rejects_bad_purchases() {
        let maker = user(Role::Maker, 0);
        let buyer = user(Role::Student, 1_000);
        let l = listing(&maker, 5_000);
        assert!(matches!(plan_settlement(&buyer, &l, &input(&l, None), Utc::now()), Err(ServiceError::InsufficientFunds)));
        assert!(matches!(plan_settlement(&buyer, &l, &input(&l, Some(0)), Utc::now()), Err(ServiceError::Validation(_))));
        assert!(matches!(plan_settlement(&buyer, &l, &input(&l, Some(100)), Utc::now()), Err(ServiceError::Validation(_))));

        let rich_maker = user(Role::Maker, 1_000_000);
        let own = listing(&rich_maker, 100);
        assert!(matches!(plan_settlement(&rich_maker, &own, &input(&own, None), Utc::now()), Err(ServiceError::Validation(_))));

        let mut offline = listing(&maker, 100);
        offline.status = models::listing::STATUS_OFFLINE.into();
        let rich = user(Role::Student, 1_000_000);
        assert!(matches!(plan_settlement(&rich, &offline, &input(&offline, None), Utc::now()), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn transition_permissions() {
        let maker = user(Role::Maker, 0);
        let buyer = user(Role::Student, 10_000);
        let l = listing(&maker, 100);
        let mut order = plan_settlement(&buyer, &l, &input(&l, None), Utc::now()).unwrap().order;
        let stranger = CurrentUser { id: Uuid::new_v4(), role: Role::Student };
        let admin = CurrentUser { id: Uuid::new_v4(), role: Role::Admin };

        assert!(authorize_transition(&order, maker.as_current(), OrderStatus::Processing).is_ok());
        assert!(matches!(authorize_transition(&order, buyer.as_current(), OrderStatus::Processing), Err(ServiceError::Forbidden(_))));
        assert!(authorize_transition(&order, buyer.as_current(), OrderStatus::Cancelled).is_ok());
        assert!(matches!(authorize_transition(&order, stranger, OrderStatus::Cancelled), Err(ServiceError::Forbidden(_))));
        assert!(matches!(authorize_transition(&order, maker.as_current(), OrderStatus::Completed), Err(ServiceError::Conflict(_))));
        assert!(authorize_transition(&order, admin, OrderStatus::Processing).is_ok());

        order.status = OrderStatus::Shipped;
        assert!(authorize_transition(&order, buyer.as_current(), OrderStatus::Completed).is_ok());
        assert!(matches!(authorize_transition(&order, maker.as_current(), OrderStatus::Completed), Err(ServiceError::Forbidden(_))));
    }
}
