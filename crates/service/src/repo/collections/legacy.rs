//! Import of the flat `<collection>.json` files written by the previous server.
//!
//! Old documents use camelCase keys, string ids such as `user-1700000000`,
//! yuan-valued floats and an embedded `wallet` object.
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use super::docs::{ORDERS, SERVICES, USERS};
use crate::errors::ServiceError;
use crate::orders::domain::{points_for, OrderStatus};

pub fn import(collection: &str, legacy: Value) -> Result<Value, ServiceError> {
    let Value::Array(items) = legacy else {
        return Err(ServiceError::Storage(format!("legacy {} is not a json array", collection)));
    };
    let convert: fn(&Map<String, Value>) -> Value = match collection {
        USERS => user,
        SERVICES => service,
        ORDERS => order,
        _ => return Ok(Value::Array(items)),
    };
    let converted = items
        .iter()
        .filter_map(Value::as_object)
        .map(convert)
        .collect();
    Ok(Value::Array(converted))
}

/// Stable uuid for a legacy id; real uuids pass through.
pub fn legacy_id(v: Option<&Value>) -> Uuid {
    let raw = match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Uuid::new_v4(),
    };
    Uuid::parse_str(&raw).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes()))
}

fn text(o: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| o.get(*k))
        .find_map(|v| v.as_str().map(str::to_string))
        .filter(|s| !s.is_empty())
}

fn number(o: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| o.get(*k)).find_map(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn yuan_to_cents(yuan: f64) -> i64 {
    (yuan * 100.0).round() as i64
}

fn timestamp(o: &Map<String, Value>, keys: &[&str]) -> DateTime<Utc> {
    text(o, keys)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

fn password_algorithm(hash: &str) -> &'static str {
    if hash.starts_with("$argon2") {
        models::user_credentials::ALGO_ARGON2
    } else if hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$") {
        "bcrypt"
    } else {
        models::user_credentials::ALGO_PLAIN
    }
}

fn user(o: &Map<String, Value>) -> Value {
    let id = legacy_id(o.get("id"));
    let email = text(o, &["email"]).unwrap_or_default().to_ascii_lowercase();
    let username = text(o, &["username", "name"])
        .unwrap_or_else(|| email.split('@').next().unwrap_or("user").to_string());
    // 旧系统没有角色，任何账号都能发布服务
    let role = text(o, &["role"])
        .filter(|r| models::user::is_valid_role(r))
        .unwrap_or_else(|| models::user::ROLE_MAKER.to_string());
    let empty = Map::new();
    let wallet = o.get("wallet").and_then(Value::as_object).unwrap_or(&empty);
    let password = text(o, &["password"]);
    let created_at = timestamp(o, &["createdAt", "created_at"]);

    let addresses: Vec<Value> = o
        .get("addresses")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .map(|a| {
                    json!({
                        "id": legacy_id(a.get("id")),
                        "user_id": id,
                        "recipient": text(a, &["recipient", "name"]).unwrap_or_default(),
                        "phone": text(a, &["phone"]).unwrap_or_default(),
                        "region": text(a, &["region", "province"]).unwrap_or_default(),
                        "detail": text(a, &["detail", "address"]).unwrap_or_default(),
                        "is_default": a.get("isDefault").and_then(Value::as_bool).unwrap_or(false),
                        "created_at": created_at,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let transactions: Vec<Value> = o
        .get("transactions")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .map(|t| {
                    let is_points = t.get("isPoints").and_then(Value::as_bool).unwrap_or(false);
                    let raw = number(t, &["amount"]).unwrap_or(0.0);
                    let amount = if is_points { raw.round() as i64 } else { yuan_to_cents(raw) };
                    json!({
                        "id": legacy_id(t.get("id")),
                        "user_id": id,
                        "kind": text(t, &["type", "kind"]).unwrap_or_else(|| "expense".into()),
                        "title": text(t, &["title"]).unwrap_or_default(),
                        "amount": amount,
                        "is_points": is_points,
                        "created_at": timestamp(t, &["date", "created_at"]),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "id": id,
        "email": email,
        "username": username,
        "role": role,
        "balance_cents": number(wallet, &["balance"]).map(yuan_to_cents).unwrap_or(0),
        "points": number(wallet, &["points"]).unwrap_or(0.0) as i64,
        "coupons": number(wallet, &["coupons"]).unwrap_or(0.0) as i32,
        "exp": number(o, &["exp"]).unwrap_or(0.0) as i64,
        "level": (number(o, &["level"]).unwrap_or(1.0) as i32).max(1),
        "avatar": text(o, &["avatar"]),
        "sign": text(o, &["sign"]),
        "gender": text(o, &["gender"]),
        "background_image": text(o, &["backgroundImage", "background_image"]),
        "reputation": text(o, &["reputation"]).unwrap_or_else(|| models::user::DEFAULT_REPUTATION.into()),
        "maker_profile": o.get("makerProfile").cloned().unwrap_or_else(|| json!({})),
        "last_checkin_date": text(o, &["lastCheckinDate"]).and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        "created_at": created_at,
        "updated_at": created_at,
        "password_hash": password,
        "password_algorithm": password.as_deref().map(password_algorithm),
        "addresses": addresses,
        "transactions": transactions,
    })
}

fn service(o: &Map<String, Value>) -> Value {
    let listing_type = text(o, &["type"])
        .filter(|t| models::listing::is_valid_type(t))
        .unwrap_or_else(|| models::listing::TYPE_CUSTOM.to_string());
    let status = text(o, &["status"])
        .filter(|s| models::listing::is_valid_status(s))
        .unwrap_or_else(|| models::listing::STATUS_ACTIVE.to_string());
    let tags: Vec<String> = o
        .get("tags")
        .and_then(Value::as_array)
        .map(|t| t.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let created_at = timestamp(o, &["createdAt"]);
    json!({
        "id": legacy_id(o.get("id")),
        "provider_id": legacy_id(["userId", "providerId", "provider_id"].iter().find_map(|k| o.get(*k))),
        "provider_name": text(o, &["provider", "providerName"]).unwrap_or_else(|| "Maker".into()),
        "title": text(o, &["title"]).unwrap_or_default(),
        "description": text(o, &["description", "desc"]).unwrap_or_default(),
        "price_cents": number(o, &["price"]).map(yuan_to_cents).unwrap_or(0).max(0),
        "listing_type": listing_type,
        "status": status,
        "production_mode": text(o, &["productionMode"]).filter(|m| models::listing::is_valid_mode(m)),
        "image": text(o, &["image"]),
        "details": text(o, &["details"]),
        "tags": tags,
        "sales": number(o, &["sales"]).unwrap_or(0.0) as i32,
        "views": number(o, &["views"]).unwrap_or(0.0) as i32,
        "created_at": created_at,
        "updated_at": timestamp(o, &["updatedAt", "createdAt"]),
    })
}

fn order(o: &Map<String, Value>) -> Value {
    let empty = Map::new();
    let buyer = o.get("buyer").and_then(Value::as_object).unwrap_or(&empty);
    let first_item = o
        .get("items")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let provider = o.get("providerId").or_else(|| first_item.get("providerId"));
    let amount_cents = number(o, &["amount", "total"]).map(yuan_to_cents).unwrap_or(0);
    let quantity = (number(first_item, &["quantity"]).unwrap_or(1.0) as i32).max(1);
    let status = text(o, &["status"])
        .and_then(|s| s.parse::<OrderStatus>().ok())
        .unwrap_or(OrderStatus::Paid);
    let created_at = timestamp(o, &["createdAt"]);
    json!({
        "id": legacy_id(o.get("id")),
        "buyer_id": legacy_id(buyer.get("id")),
        "buyer_name": text(buyer, &["username"]).unwrap_or_default(),
        "provider_id": legacy_id(provider),
        "listing_id": legacy_id(first_item.get("id")),
        "listing_title": text(first_item, &["title"]).unwrap_or_default(),
        "quantity": quantity,
        "unit_price_cents": amount_cents / i64::from(quantity),
        "amount_cents": amount_cents,
        "points_awarded": points_for(amount_cents),
        "status": status,
        "notes": text(o, &["notes"]),
        "created_at": created_at,
        "updated_at": created_at,
    })
}
