use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{listing, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
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
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::BuyerId",
        to = "user::Column::Id"
    )]
    Buyer,
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::ProviderId",
        to = "user::Column::Id"
    )]
    Provider,
    #[sea_orm(
        belongs_to = "listing::Entity",
        from = "Column::ListingId",
        to = "listing::Column::Id"
    )]
    Listing,
}

impl Related<listing::Entity> for Entity {
    fn to() -> RelationDef { Relation::Listing.def() }
}

impl ActiveModelBehavior for ActiveModel {}
