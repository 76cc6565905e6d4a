use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{Credentials, NewUser, User};
use super::errors::AuthError;

/// Repository abstraction for auth-related persistence.
#[async_trait]
pub trait AuthRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AuthError>;
    /// Create the account and its credentials together; `Conflict` on a taken email.
    async fn create_user(&self, user: NewUser, password_hash: String, password_algorithm: String) -> Result<User, AuthError>;

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, AuthError>;
    async fn upsert_password(&self, user_id: Uuid, password_hash: String, password_algorithm: String) -> Result<Credentials, AuthError>;
}
