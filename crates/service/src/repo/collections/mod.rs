//! Document backend: `users`, `services` and `orders` JSON arrays in the
//! single-table [`CollectionStore`](crate::storage::CollectionStore).

mod auth;
mod catalog;
pub mod docs;
pub mod legacy;
mod orders;
mod wallet;

use std::path::PathBuf;

use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::storage::{CollectionSession, CollectionStore};
use docs::{UserDoc, USERS};

#[derive(Clone)]
pub struct CollectionsRepository {
    store: CollectionStore,
}

impl CollectionsRepository {
    pub async fn open(db: DatabaseConnection, legacy_dir: Option<PathBuf>) -> Result<Self, ServiceError> {
        let store = CollectionStore::open(db, legacy_dir, legacy::import).await?;
        Ok(Self { store })
    }

    pub fn store(&self) -> &CollectionStore { &self.store }

    /// Whether the `users` collection holds any document, legacy import included.
    pub async fn has_users(&self) -> Result<bool, ServiceError> {
        let mut s = self.store.session().await;
        Ok(!load_users(&mut s).await?.is_empty())
    }
}

fn find_user_mut(users: &mut [UserDoc], id: Uuid) -> Result<&mut UserDoc, ServiceError> {
    users
        .iter_mut()
        .find(|d| d.user.id == id)
        .ok_or_else(|| ServiceError::not_found("user"))
}

async fn load_users(s: &mut CollectionSession<'_>) -> Result<Vec<UserDoc>, ServiceError> {
    s.load(USERS).await
}
