use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, user};

pub const TYPE_COURSE: &str = "course";
pub const TYPE_3D_PRINT: &str = "3d_print";
pub const TYPE_CUSTOM: &str = "custom";

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_OFFLINE: &str = "offline";

pub const MODE_SELF: &str = "self";
pub const MODE_FACTORY: &str = "factory";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "listing")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub provider_id: Uuid,
    pub provider_name: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price_cents: i64,
    pub listing_type: String,
    pub status: String,
    pub production_mode: Option<String>,
    pub image: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub details: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub tags: Json,
    pub sales: i32,
    pub views: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::ProviderId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    Provider,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Provider.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn is_valid_type(t: &str) -> bool {
    matches!(t, TYPE_COURSE | TYPE_3D_PRINT | TYPE_CUSTOM)
}

pub fn is_valid_status(s: &str) -> bool {
    matches!(s, STATUS_ACTIVE | STATUS_PENDING | STATUS_OFFLINE)
}

pub fn is_valid_mode(m: &str) -> bool {
    matches!(m, MODE_SELF | MODE_FACTORY)
}

/// Field checks shared by create and update paths.
pub fn validate_fields(title: &str, price_cents: i64, listing_type: &str) -> Result<(), ModelError> {
    let len = title.trim().chars().count();
    if len == 0 || len > 120 {
        return Err(ModelError::Validation("title must be 1..=120 characters".into()));
    }
    if price_cents < 0 {
        return Err(ModelError::Validation("price must not be negative".into()));
    }
    if !is_valid_type(listing_type) {
        return Err(ModelError::Validation(format!("invalid listing type: {}", listing_type)));
    }
    Ok(())
}

impl Model {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }
}
