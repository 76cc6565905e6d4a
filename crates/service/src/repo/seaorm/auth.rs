use sea_orm::{EntityTrait, TransactionTrait};
use uuid::Uuid;

use super::convert::user_from_model;
use super::SeaOrmRepository;
use crate::auth::domain::{Credentials, NewUser, User};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;

fn repo_err(e: impl std::fmt::Display) -> AuthError {
    AuthError::Repository(e.to_string())
}

fn to_credentials(c: models::user_credentials::Model) -> Credentials {
    Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }
}

#[async_trait::async_trait]
impl AuthRepository for SeaOrmRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let res = models::user::find_by_email(&self.db, email).await.map_err(repo_err)?;
        Ok(res.map(user_from_model).transpose()?)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let res = models::user::Entity::find_by_id(id).one(&self.db).await.map_err(repo_err)?;
        Ok(res.map(user_from_model).transpose()?)
    }

    async fn create_user(&self, user: NewUser, password_hash: String, password_algorithm: String) -> Result<User, AuthError> {
        let txn = self.db.begin().await.map_err(repo_err)?;
        if models::user::find_by_email(&txn, &user.email).await.map_err(repo_err)?.is_some() {
            return Err(AuthError::Conflict);
        }
        let created = models::user::create(&txn, &user.email, &user.username, user.role.as_str())
            .await
            .map_err(|e| match e {
                models::errors::ModelError::Validation(msg) => AuthError::Validation(msg),
                other => repo_err(other),
            })?;
        models::user_credentials::upsert_password(&txn, created.id, password_hash, &password_algorithm)
            .await
            .map_err(repo_err)?;
        txn.commit().await.map_err(repo_err)?;
        Ok(user_from_model(created)?)
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError> {
        let res = models::user_credentials::find_by_user(&self.db, user_id).await.map_err(repo_err)?;
        Ok(res.map(to_credentials))
    }

    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError> {
        let c = models::user_credentials::upsert_password(&self.db, user_id, password_hash, &password_algorithm)
            .await
            .map_err(repo_err)?;
        Ok(to_credentials(c))
    }
}
