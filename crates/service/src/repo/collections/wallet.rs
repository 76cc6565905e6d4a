use chrono::{NaiveDate, Utc};
use models::wallet_transaction as ledger;
use uuid::Uuid;

use super::docs::USERS;
use super::{find_user_mut, load_users, CollectionsRepository};
use crate::auth::domain::User;
use crate::errors::ServiceError;
use crate::wallet::domain::{
    apply_checkin, Address, AddressInput, CheckinPlan, LedgerEntry, ProfileUpdate, Wallet, CHECKIN_POINTS,
};
use crate::wallet::repository::WalletRepository;

#[async_trait::async_trait]
impl WalletRepository for CollectionsRepository {
    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, ServiceError> {
        let mut s = self.store.session().await;
        let mut users = load_users(&mut s).await?;
        let Some(doc) = users.iter_mut().find(|d| d.user.id == user_id) else {
            return Ok(None);
        };
        update.apply(&mut doc.user);
        let updated = doc.user.clone();
        s.stage(USERS, &users)?;
        s.commit().await?;
        Ok(Some(updated))
    }

    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, ServiceError> {
        let mut s = self.store.session().await;
        let users = load_users(&mut s).await?;
        Ok(users
            .into_iter()
            .find(|d| d.user.id == user_id)
            .map(|d| d.addresses)
            .unwrap_or_default())
    }

    async fn add_address(&self, user_id: Uuid, input: AddressInput) -> Result<Address, ServiceError> {
        let mut s = self.store.session().await;
        let mut users = load_users(&mut s).await?;
        let doc = find_user_mut(&mut users, user_id)?;
        let addr = input.into_address(user_id, doc.addresses.len() as u64);
        if addr.is_default {
            doc.addresses.iter_mut().for_each(|a| a.is_default = false);
        }
        doc.addresses.push(addr.clone());
        s.stage(USERS, &users)?;
        s.commit().await?;
        Ok(addr)
    }

    async fn top_up(&self, user_id: Uuid, amount_cents: i64) -> Result<Wallet, ServiceError> {
        let mut s = self.store.session().await;
        let mut users = load_users(&mut s).await?;
        let doc = find_user_mut(&mut users, user_id)?;
        doc.user.balance_cents += amount_cents;
        doc.user.updated_at = Utc::now();
        doc.record(LedgerEntry::new(user_id, ledger::KIND_RECHARGE, "账户充值", amount_cents, false));
        let wallet = Wallet::from(&doc.user);
        s.stage(USERS, &users)?;
        s.commit().await?;
        Ok(wallet)
    }

    async fn ledger(&self, user_id: Uuid, limit: u64) -> Result<Vec<LedgerEntry>, ServiceError> {
        let mut s = self.store.session().await;
        let users = load_users(&mut s).await?;
        let mut entries = users
            .into_iter()
            .find(|d| d.user.id == user_id)
            .map(|d| d.transactions)
            .unwrap_or_default();
        entries.truncate(limit as usize);
        Ok(entries)
    }

    async fn check_in(&self, user_id: Uuid, today: NaiveDate) -> Result<CheckinPlan, ServiceError> {
        let mut s = self.store.session().await;
        let mut users = load_users(&mut s).await?;
        let doc = find_user_mut(&mut users, user_id)?;
        let plan = apply_checkin(&doc.user, today)?;
        doc.user.points = plan.points;
        doc.user.exp = plan.exp;
        doc.user.level = plan.level;
        doc.user.last_checkin_date = Some(today);
        doc.user.updated_at = Utc::now();
        doc.record(LedgerEntry::new(user_id, ledger::KIND_POINTS, "每日签到", CHECKIN_POINTS, true));
        s.stage(USERS, &users)?;
        s.commit().await?;
        Ok(plan)
    }
}
