use chrono::NaiveDate;
use models::{address, user, wallet_transaction as ledger};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::convert::{address_from_model, ledger_from_model, user_from_model};
use super::SeaOrmRepository;
use crate::auth::domain::User;
use crate::errors::ServiceError;
use crate::wallet::domain::{
    apply_checkin, Address, AddressInput, CheckinPlan, LedgerEntry, ProfileUpdate, Wallet, CHECKIN_EXP, CHECKIN_POINTS,
};
use crate::wallet::repository::WalletRepository;

#[async_trait::async_trait]
impl WalletRepository for SeaOrmRepository {
    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, ServiceError> {
        let Some(found) = user::Entity::find_by_id(user_id).one(&self.db).await? else {
            return Ok(None);
        };
        let mut am: user::ActiveModel = found.into();
        if let Some(name) = &update.name { am.username = Set(name.trim().to_string()); }
        if let Some(sign) = &update.sign { am.sign = Set(Some(sign.clone())); }
        if let Some(avatar) = &update.avatar { am.avatar = Set(Some(avatar.clone())); }
        if let Some(bg) = &update.background_image { am.background_image = Set(Some(bg.clone())); }
        if let Some(gender) = &update.gender { am.gender = Set(Some(gender.clone())); }
        am.updated_at = Set(chrono::Utc::now().into());
        let updated = am.update(&self.db).await?;
        Ok(Some(user_from_model(updated)?))
    }

    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, ServiceError> {
        let rows = address::Entity::find()
            .filter(address::Column::UserId.eq(user_id))
            .order_by_asc(address::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(address_from_model).collect())
    }

    async fn add_address(&self, user_id: Uuid, input: AddressInput) -> Result<Address, ServiceError> {
        let txn = self.db.begin().await?;
        let existing = address::count_for_user(&txn, user_id).await?;
        let addr = input.into_address(user_id, existing);
        if addr.is_default {
            address::clear_default(&txn, user_id).await?;
        }
        let am = address::ActiveModel {
            id: Set(addr.id),
            user_id: Set(addr.user_id),
            recipient: Set(addr.recipient.clone()),
            phone: Set(addr.phone.clone()),
            region: Set(addr.region.clone()),
            detail: Set(addr.detail.clone()),
            is_default: Set(addr.is_default),
            created_at: Set(addr.created_at.into()),
        };
        let created = am.insert(&txn).await?;
        txn.commit().await?;
        Ok(address_from_model(created))
    }

    async fn top_up(&self, user_id: Uuid, amount_cents: i64) -> Result<Wallet, ServiceError> {
        let txn = self.db.begin().await?;
        let res = user::Entity::update_many()
            .col_expr(user::Column::BalanceCents, Expr::col(user::Column::BalanceCents).add(amount_cents))
            .filter(user::Column::Id.eq(user_id))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::not_found("user"));
        }
        ledger::record(&txn, user_id, ledger::KIND_RECHARGE, "账户充值", amount_cents, false).await?;
        let found = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        txn.commit().await?;
        Ok(Wallet::from(&user_from_model(found)?))
    }

    async fn ledger(&self, user_id: Uuid, limit: u64) -> Result<Vec<LedgerEntry>, ServiceError> {
        let rows = ledger::Entity::find()
            .filter(ledger::Column::UserId.eq(user_id))
            .order_by_desc(ledger::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ledger_from_model).collect())
    }

    async fn check_in(&self, user_id: Uuid, today: NaiveDate) -> Result<CheckinPlan, ServiceError> {
        let txn = self.db.begin().await?;
        let found = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        let plan = apply_checkin(&user_from_model(found)?, today)?;

        // 以日期为条件更新，并发签到只有一个能成功
        let res = user::Entity::update_many()
            .col_expr(user::Column::Points, Expr::col(user::Column::Points).add(CHECKIN_POINTS))
            .col_expr(user::Column::Exp, Expr::col(user::Column::Exp).add(CHECKIN_EXP))
            .col_expr(user::Column::Level, Expr::value(plan.level))
            .col_expr(user::Column::LastCheckinDate, Expr::value(today))
            .filter(user::Column::Id.eq(user_id))
            .filter(
                Condition::any()
                    .add(user::Column::LastCheckinDate.is_null())
                    .add(user::Column::LastCheckinDate.ne(today)),
            )
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            return Err(ServiceError::validation("Today already checked in"));
        }
        ledger::record(&txn, user_id, ledger::KIND_POINTS, "每日签到", CHECKIN_POINTS, true).await?;
        txn.commit().await?;
        Ok(plan)
    }
}
