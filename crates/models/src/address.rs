use sea_orm::entity::prelude::*;
use sea_orm::{ColumnTrait, ConnectionTrait, PaginatorTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use sea_orm::sea_query::Expr;

use crate::{errors::ModelError, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "address")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient: String,
    pub phone: String,
    pub region: String,
    pub detail: String,
    pub is_default: bool,
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

/// Drop the default flag from every address of the user.
pub async fn clear_default<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, ModelError> {
    let res = Entity::update_many()
        .col_expr(Column::IsDefault, Expr::value(false))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::IsDefault.eq(true))
        .exec(db)
        .await?;
    Ok(res.rows_affected)
}

pub async fn count_for_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, ModelError> {
    Ok(Entity::find().filter(Column::UserId.eq(user_id)).count(db).await?)
}

pub fn new_active(
    user_id: Uuid,
    recipient: String,
    phone: String,
    region: String,
    detail: String,
    is_default: bool,
) -> ActiveModel {
    ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        recipient: Set(recipient),
        phone: Set(phone),
        region: Set(region),
        detail: Set(detail),
        is_default: Set(is_default),
        created_at: Set(chrono::Utc::now().into()),
    }
}
