use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set};
use serde::{Deserialize, Serialize};

use crate::{errors::ModelError, user};

pub const KIND_RECHARGE: &str = "recharge";
pub const KIND_EXPENSE: &str = "expense";
pub const KIND_INCOME: &str = "income";
pub const KIND_POINTS: &str = "points";
pub const KIND_REFUND: &str = "refund";

pub fn is_valid_kind(kind: &str) -> bool {
    matches!(kind, KIND_RECHARGE | KIND_EXPENSE | KIND_INCOME | KIND_POINTS | KIND_REFUND)
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallet_transaction")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    /// 金额(分)或积分，取决于 is_points
    pub amount: i64,
    pub is_points: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "user::Entity",
        from = "Column::UserId",
        to = "user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::User.def() }
}

impl ActiveModelBehavior for ActiveModel {}

/// Append one ledger entry.
pub async fn record<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    kind: &str,
    title: &str,
    amount: i64,
    is_points: bool,
) -> Result<Model, ModelError> {
    if !is_valid_kind(kind) {
        return Err(ModelError::Validation(format!("invalid ledger kind: {}", kind)));
    }
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        kind: Set(kind.to_string()),
        title: Set(title.to_string()),
        amount: Set(amount),
        is_points: Set(is_points),
        created_at: Set(chrono::Utc::now().into()),
    };
    Ok(am.insert(db).await?)
}
