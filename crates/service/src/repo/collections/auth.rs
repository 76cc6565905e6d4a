use chrono::Utc;
use uuid::Uuid;

use super::docs::{UserDoc, USERS};
use super::{load_users, CollectionsRepository};
use crate::auth::domain::{Credentials, NewUser, User};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

#[async_trait::async_trait]
impl AuthRepository for CollectionsRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let mut s = self.store.session().await;
        let users = load_users(&mut s).await?;
        Ok(users.into_iter().find(|d| d.user.email == email).map(|d| d.user))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let mut s = self.store.session().await;
        let users = load_users(&mut s).await?;
        Ok(users.into_iter().find(|d| d.user.id == id).map(|d| d.user))
    }

    async fn create_user(&self, user: NewUser, password_hash: String, password_algorithm: String) -> Result<User, AuthError> {
        let mut s = self.store.session().await;
        let mut users = load_users(&mut s).await?;
        if users.iter().any(|d| d.user.email == user.email) {
            return Err(AuthError::Conflict);
        }
        let created = User::fresh(user, Utc::now());
        users.push(UserDoc {
            user: created.clone(),
            password_hash: Some(password_hash),
            password_algorithm: Some(password_algorithm),
            addresses: Vec::new(),
            transactions: Vec::new(),
        });
        s.stage(USERS, &users)?;
        s.commit().await?;
        Ok(created)
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let mut s = self.store.session().await;
        let users = load_users(&mut s).await?;
        Ok(users.iter().find(|d| d.user.id == user_id).and_then(UserDoc::credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let mut s = self.store.session().await;
        let mut users = load_users(&mut s).await?;
        let doc = users
            .iter_mut()
            .find(|d| d.user.id == user_id)
            .ok_or(AuthError::NotFound)?;
        doc.password_hash = Some(password_hash.clone());
        doc.password_algorithm = Some(password_algorithm.clone());
        doc.user.updated_at = Utc::now();
        s.stage(USERS, &users)?;
        s.commit().await?;
        Ok(Credentials { user_id, password_hash, password_algorithm })
    }
}
