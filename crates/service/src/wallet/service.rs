use std::sync::Arc;

use chrono::Utc;
use configs::WalletConfig;
use tracing::{info, instrument};

use super::domain::{Address, AddressInput, CheckinOutcome, Profile, ProfileUpdate, Wallet, WalletView, LEDGER_LIMIT};
use super::repository::WalletRepository;
use crate::auth::domain::CurrentUser;
use crate::auth::repository::AuthRepository;
use crate::errors::ServiceError;

pub struct WalletService<R: WalletRepository + AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: WalletConfig,
}

impl<R: WalletRepository + AuthRepository + ?Sized> WalletService<R> {
    pub fn new(repo: Arc<R>, cfg: WalletConfig) -> Self { Self { repo, cfg } }

    pub async fn profile(&self, actor: CurrentUser) -> Result<Profile, ServiceError> {
        let user = self.repo.find_user(actor.id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        Ok(Profile::from_user(user))
    }

    #[instrument(skip(self, update), fields(user_id = %actor.id))]
    pub async fn update_profile(&self, actor: CurrentUser, update: ProfileUpdate) -> Result<Profile, ServiceError> {
        update.validate()?;
        let user = self.repo
            .update_profile(actor.id, &update)
            .await?
            .ok_or_else(|| ServiceError::not_found("user"))?;
        Ok(Profile::from_user(user))
    }

    pub async fn addresses(&self, actor: CurrentUser) -> Result<Vec<Address>, ServiceError> {
        self.repo.list_addresses(actor.id).await
    }

    pub async fn add_address(&self, actor: CurrentUser, input: AddressInput) -> Result<Address, ServiceError> {
        input.validate()?;
        self.repo.add_address(actor.id, input).await
    }

    #[instrument(skip(self), fields(user_id = %actor.id))]
    pub async fn top_up(&self, actor: CurrentUser, amount_cents: i64) -> Result<WalletView, ServiceError> {
        if amount_cents <= 0 {
            return Err(ServiceError::validation("Invalid amount"));
        }
        if amount_cents > self.cfg.max_top_up_cents {
            return Err(ServiceError::validation(format!(
                "amount exceeds the single top-up limit of {} cents",
                self.cfg.max_top_up_cents
            )));
        }
        let wallet = self.repo.top_up(actor.id, amount_cents).await?;
        info!(amount_cents, balance_cents = wallet.balance_cents, event = "wallet_topup", "wallet_topup");
        let transactions = self.repo.ledger(actor.id, LEDGER_LIMIT).await?;
        Ok(WalletView { wallet, transactions })
    }

    pub async fn wallet(&self, actor: CurrentUser) -> Result<WalletView, ServiceError> {
        let user = self.repo.find_user(actor.id).await?.ok_or_else(|| ServiceError::not_found("user"))?;
        let transactions = self.repo.ledger(actor.id, LEDGER_LIMIT).await?;
        Ok(WalletView { wallet: Wallet::from(&user), transactions })
    }

    #[instrument(skip(self), fields(user_id = %actor.id))]
    pub async fn check_in(&self, actor: CurrentUser) -> Result<CheckinOutcome, ServiceError> {
        let today = Utc::now().date_naive();
        let plan = self.repo.check_in(actor.id, today).await?;
        info!(points = plan.points, level = plan.level, event = "daily_checkin", "daily_checkin");
        Ok(plan.into())
    }
}
