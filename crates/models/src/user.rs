use sea_orm::{entity::prelude::*, ColumnTrait, ConnectionTrait, QueryFilter, Set};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

pub const ROLE_STUDENT: &str = "student";
pub const ROLE_MAKER: &str = "maker";
pub const ROLE_ADMIN: &str = "admin";

pub const DEFAULT_SIGN: &str = "让生活更简单";
pub const DEFAULT_GENDER: &str = "male";
pub const DEFAULT_REPUTATION: &str = "优秀";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub username: String,
    pub role: String,
    pub balance_cents: i64,
    pub points: i64,
    pub coupons: i32,
    pub exp: i64,
    pub level: i32,
    pub avatar: Option<String>,
    pub sign: Option<String>,
    pub gender: Option<String>,
    pub background_image: Option<String>,
    pub reputation: String,
    #[sea_orm(column_type = "Json")]
    pub maker_profile: Json,
    pub last_checkin_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::listing::Entity")]
    Listing,
    #[sea_orm(has_many = "crate::address::Entity")]
    Address,
    #[sea_orm(has_many = "crate::wallet_transaction::Entity")]
    WalletTransaction,
}

impl Related<crate::listing::Entity> for Entity {
    fn to() -> RelationDef { Relation::Listing.def() }
}

impl Related<crate::address::Entity> for Entity {
    fn to() -> RelationDef { Relation::Address.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn is_valid_role(role: &str) -> bool {
    matches!(role, ROLE_STUDENT | ROLE_MAKER | ROLE_ADMIN)
}

/// Insert a fresh account with zeroed wallet counters and profile defaults.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    email: &str,
    username: &str,
    role: &str,
) -> Result<Model, errors::ModelError> {
    if !email.contains('@') { return Err(errors::ModelError::Validation("invalid email".into())); }
    if username.trim().is_empty() { return Err(errors::ModelError::Validation("username required".into())); }
    if !is_valid_role(role) { return Err(errors::ModelError::Validation(format!("invalid role: {}", role))); }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        username: Set(username.trim().to_string()),
        role: Set(role.to_string()),
        balance_cents: Set(0),
        points: Set(0),
        coupons: Set(0),
        exp: Set(0),
        level: Set(1),
        avatar: Set(None),
        sign: Set(Some(DEFAULT_SIGN.to_string())),
        gender: Set(Some(DEFAULT_GENDER.to_string())),
        background_image: Set(None),
        reputation: Set(DEFAULT_REPUTATION.to_string()),
        maker_profile: Set(serde_json::json!({})),
        last_checkin_date: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(am.insert(db).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Ok(Entity::find().filter(Column::Email.eq(email)).one(db).await?)
}
