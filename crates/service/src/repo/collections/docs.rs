//! Stored document shapes for the collections backend.
use serde::{Deserialize, Serialize};

use crate::auth::domain::{Credentials, User};
use crate::wallet::domain::{Address, LedgerEntry};

pub const USERS: &str = "users";
pub const SERVICES: &str = "services";
pub const ORDERS: &str = "orders";

/// A user document embeds its credentials, addresses and ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(flatten)]
    pub user: User,
    #[serde(default)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub password_algorithm: Option<String>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    /// Newest first
    #[serde(default)]
    pub transactions: Vec<LedgerEntry>,
}

impl UserDoc {
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.password_hash, &self.password_algorithm) {
            (Some(hash), Some(algo)) => Some(Credentials {
                user_id: self.user.id,
                password_hash: hash.clone(),
                password_algorithm: algo.clone(),
            }),
            _ => None,
        }
    }

    pub fn record(&mut self, entry: LedgerEntry) {
        self.transactions.insert(0, entry);
    }
}
