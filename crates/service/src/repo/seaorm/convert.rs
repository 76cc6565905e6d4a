//! Entity <-> domain conversions for the relational backend.
use chrono::Utc;
use models::{address, listing, order, user, wallet_transaction};
use sea_orm::Set;

use crate::auth::domain::{Role, User};
use crate::catalog::domain::Listing;
use crate::errors::ServiceError;
use crate::orders::domain::Order;
use crate::wallet::domain::{Address, LedgerEntry};

pub(super) fn user_from_model(m: user::Model) -> Result<User, ServiceError> {
    let role = m.role.parse::<Role>().map_err(ServiceError::Db)?;
    Ok(User {
        id: m.id,
        email: m.email,
        username: m.username,
        role,
        balance_cents: m.balance_cents,
        points: m.points,
        coupons: m.coupons,
        exp: m.exp,
        level: m.level,
        avatar: m.avatar,
        sign: m.sign,
        gender: m.gender,
        background_image: m.background_image,
        reputation: m.reputation,
        maker_profile: m.maker_profile,
        last_checkin_date: m.last_checkin_date,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

pub(super) fn listing_from_model(m: listing::Model) -> Listing {
    let tags = m.tag_list();
    Listing {
        id: m.id,
        provider_id: m.provider_id,
        provider_name: m.provider_name,
        title: m.title,
        description: m.description,
        price_cents: m.price_cents,
        listing_type: m.listing_type,
        status: m.status,
        production_mode: m.production_mode,
        image: m.image,
        details: m.details,
        tags,
        sales: m.sales,
        views: m.views,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

pub(super) fn listing_active_model(l: &Listing) -> listing::ActiveModel {
    listing::ActiveModel {
        id: Set(l.id),
        provider_id: Set(l.provider_id),
        provider_name: Set(l.provider_name.clone()),
        title: Set(l.title.clone()),
        description: Set(l.description.clone()),
        price_cents: Set(l.price_cents),
        listing_type: Set(l.listing_type.clone()),
        status: Set(l.status.clone()),
        production_mode: Set(l.production_mode.clone()),
        image: Set(l.image.clone()),
        details: Set(l.details.clone()),
        tags: Set(serde_json::Value::from(l.tags.clone())),
        sales: Set(l.sales),
        views: Set(l.views),
        created_at: Set(l.created_at.into()),
        updated_at: Set(l.updated_at.into()),
    }
}

pub(super) fn order_from_model(m: order::Model) -> Result<Order, ServiceError> {
    let status = m
        .status
        .parse()
        .map_err(|_| ServiceError::Db(format!("corrupt order status: {}", m.status)))?;
    Ok(Order {
        id: m.id,
        buyer_id: m.buyer_id,
        buyer_name: m.buyer_name,
        provider_id: m.provider_id,
        listing_id: m.listing_id,
        listing_title: m.listing_title,
        quantity: m.quantity,
        unit_price_cents: m.unit_price_cents,
        amount_cents: m.amount_cents,
        points_awarded: m.points_awarded,
        status,
        notes: m.notes,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

pub(super) fn order_active_model(o: &Order) -> order::ActiveModel {
    order::ActiveModel {
        id: Set(o.id),
        buyer_id: Set(o.buyer_id),
        buyer_name: Set(o.buyer_name.clone()),
        provider_id: Set(o.provider_id),
        listing_id: Set(o.listing_id),
        listing_title: Set(o.listing_title.clone()),
        quantity: Set(o.quantity),
        unit_price_cents: Set(o.unit_price_cents),
        amount_cents: Set(o.amount_cents),
        points_awarded: Set(o.points_awarded),
        status: Set(o.status.as_str().to_string()),
        notes: Set(o.notes.clone()),
        created_at: Set(o.created_at.into()),
        updated_at: Set(o.updated_at.into()),
    }
}

pub(super) fn address_from_model(m: address::Model) -> Address {
    Address {
        id: m.id,
        user_id: m.user_id,
        recipient: m.recipient,
        phone: m.phone,
        region: m.region,
        detail: m.detail,
        is_default: m.is_default,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

pub(super) fn ledger_from_model(m: wallet_transaction::Model) -> LedgerEntry {
    LedgerEntry {
        id: m.id,
        user_id: m.user_id,
        kind: m.kind,
        title: m.title,
        amount: m.amount,
        is_points: m.is_points,
        created_at: m.created_at.with_timezone(&Utc),
    }
}
