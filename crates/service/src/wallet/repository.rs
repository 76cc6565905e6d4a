use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use super::domain::{Address, AddressInput, CheckinPlan, LedgerEntry, ProfileUpdate, Wallet};
use crate::auth::domain::User;
use crate::errors::ServiceError;

#[async_trait]
pub trait WalletRepository: Send + Sync {
    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<Option<User>, ServiceError>;
    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, ServiceError>;
    /// Insert an address; a new default clears the previous one in the same unit.
    async fn add_address(&self, user_id: Uuid, input: AddressInput) -> Result<Address, ServiceError>;
    /// Credit the balance and append a `recharge` entry.
    async fn top_up(&self, user_id: Uuid, amount_cents: i64) -> Result<Wallet, ServiceError>;
    /// Newest first
    async fn ledger(&self, user_id: Uuid, limit: u64) -> Result<Vec<LedgerEntry>, ServiceError>;
    /// Apply the daily check-in; a second call on the same day fails with a validation error.
    async fn check_in(&self, user_id: Uuid, today: NaiveDate) -> Result<CheckinPlan, ServiceError>;
}
