use std::sync::Arc;

use configs::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header as JwtHeader, Validation};
use models::user_credentials::ALGO_ARGON2;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::domain::{AuthSession, Claims, CurrentUser, LoginInput, NewUser, RegisterInput, Role, User};
use super::errors::AuthError;
use super::password::{self, Verdict};
use super::repository::AuthRepository;

const MIN_PASSWORD_LEN: usize = 6;

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new account with an argon2-hashed password and return a session.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AuthError> {
        let email = input.email.trim().to_ascii_lowercase();
        validate_email(&email)?;
        let username = input.username.trim().to_string();
        let name_len = username.chars().count();
        if !(2..=30).contains(&name_len) {
            return Err(AuthError::Validation("username must be 2-30 characters".into()));
        }
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!("password too short (>={})", MIN_PASSWORD_LEN)));
        }
        let role = match input.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            None => Role::Student,
            Some(r) => match r.parse::<Role>() {
                Ok(role @ (Role::Student | Role::Maker)) => role,
                _ => return Err(AuthError::Validation("role must be student or maker".into())),
            },
        };

        if let Some(existing) = self.repo.find_user_by_email(&email).await? {
            debug!("user exists: {}", existing.email);
            return Err(AuthError::Conflict);
        }

        let hash = password::hash_password(&input.password)?;
        let user = self.repo
            .create_user(NewUser { email, username, role }, hash, ALGO_ARGON2.to_string())
            .await?;
        info!(user_id = %user.id, email = %user.email, role = %user.role, event = "user_registered", "user_registered");
        let token = self.issue_token(&user)?;
        Ok(AuthSession { token, user })
    }

    /// Authenticate and issue a token. Legacy plaintext credentials are upgraded in place.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, AuthError> {
        let email = input.email.trim().to_ascii_lowercase();
        let user = self.repo
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let cred = self.repo
            .get_credentials(user.id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        match password::verify(&input.password, &cred)? {
            Verdict::Invalid => return Err(AuthError::Unauthorized),
            Verdict::Valid => {}
            Verdict::ValidNeedsRehash => {
                let hash = password::hash_password(&input.password)?;
                self.repo.upsert_password(user.id, hash, ALGO_ARGON2.to_string()).await?;
                info!(user_id = %user.id, event = "password_rehashed", "legacy password upgraded to argon2");
            }
        }

        let token = self.issue_token(&user)?;
        info!(user_id = %user.id, event = "user_login", "user_login");
        Ok(AuthSession { token, user })
    }

    pub async fn me(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.repo.find_user(user_id).await?.ok_or(AuthError::NotFound)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        let now = chrono::Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(self.cfg.token_ttl_hours)).timestamp(),
        };
        encode(&JwtHeader::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(self.cfg.jwt_secret.as_bytes()))
            .map_err(|e| AuthError::TokenError(e.to_string()))
    }

    /// Verify signature and expiry; the role is taken from the token.
    pub fn verify_token(&self, token: &str) -> Result<CurrentUser, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.cfg.jwt_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| AuthError::TokenError(e.to_string()))?;
        let id = Uuid::parse_str(&data.claims.sub).map_err(|e| {
            warn!(error = %e, "token subject is not a uuid");
            AuthError::TokenError("invalid subject".into())
        })?;
        Ok(CurrentUser { id, role: data.claims.role })
    }
}

fn validate_email(email: &str) -> Result<(), AuthError> {
    let invalid = || AuthError::Validation("invalid email".into());
    if email.len() > 254 || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    match domain.split_once('.') {
        Some((head, tail)) if !head.is_empty() && !tail.is_empty() && !domain.ends_with('.') => Ok(()),
        _ => Err(invalid()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::Credentials;
    use crate::auth::repository::mock::MockAuthRepository;
    use models::user_credentials::ALGO_PLAIN;

    fn svc(repo: Arc<MockAuthRepository>) -> AuthService<MockAuthRepository> {
        AuthService::new(repo, AuthConfig { jwt_secret: "test-secret".into(), token_ttl_hours: 1 })
    }

    fn reg(email: &str, password: &str, role: Option<&str>) -> RegisterInput {
        RegisterInput { email: email.into(), username: "Tester".into(), password: password.into(), role: role.map(Into::into) }
    }

    #[tokio::test]
    async fn register_then_login_issues_verifiable_token() {
        let repo = Arc::new(MockAuthRepository::default());
        let s = svc(repo);
        let session = s.register(reg("U@Example.com", "secret1", Some("maker"))).await.unwrap();
        assert_eq!(session.user.email, "u@example.com");
        assert_eq!(session.user.role, Role::Maker);

        let login = s.login(LoginInput { email: "u@example.com".into(), password: "secret1".into() }).await.unwrap();
        let current = s.verify_token(&login.token).unwrap();
        assert_eq!(current.id, session.user.id);
        assert_eq!(current.role, Role::Maker);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let s = svc(Arc::new(MockAuthRepository::default()));
        s.register(reg("dup@example.com", "secret1", None)).await.unwrap();
        let err = s.register(reg("dup@example.com", "secret2", None)).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict));
    }

    #[tokio::test]
    async fn register_validation() {
        let s = svc(Arc::new(MockAuthRepository::default()));
        assert!(matches!(s.register(reg("bad", "secret1", None)).await, Err(AuthError::Validation(_))));
        assert!(matches!(s.register(reg("a@b", "secret1", None)).await, Err(AuthError::Validation(_))));
        assert!(matches!(s.register(reg("a@b.com", "short", None)).await, Err(AuthError::Validation(_))));
        assert!(matches!(s.register(reg("a@b.com", "secret1", Some("admin"))).await, Err(AuthError::Validation(_))));
        let mut one_char = reg("c@d.com", "secret1", None);
        one_char.username = "x".into();
        assert!(matches!(s.register(one_char).await, Err(AuthError::Validation(_))));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_unauthorized() {
        let s = svc(Arc::new(MockAuthRepository::default()));
        s.register(reg("w@example.com", "secret1", None)).await.unwrap();
        let bad = s.login(LoginInput { email: "w@example.com".into(), password: "nope!!".into() }).await;
        assert!(matches!(bad, Err(AuthError::Unauthorized)));
        let missing = s.login(LoginInput { email: "x@example.com".into(), password: "secret1".into() }).await;
        assert!(matches!(missing, Err(AuthError::Unauthorized)));
    }

    #[test]
    fn legacy_plain_password_is_rehashed_on_login() {
        let repo = Arc::new(MockAuthRepository::default());
        let user = User::fresh(
            NewUser { email: "old@example.com".into(), username: "Old".into(), role: Role::Student },
            chrono::Utc::now(),
        );
        repo.insert_raw(
            user.clone(),
            Credentials { user_id: user.id, password_hash: "password".into(), password_algorithm: ALGO_PLAIN.into() },
        );
        let s = svc(repo.clone());
        tokio_test::block_on(s.login(LoginInput { email: "old@example.com".into(), password: "password".into() })).unwrap();
        let cred = tokio_test::block_on(repo.get_credentials(user.id)).unwrap().unwrap();
        assert_eq!(cred.password_algorithm, ALGO_ARGON2);
        // 升级后仍能用原密码登录
        tokio_test::block_on(s.login(LoginInput { email: "old@example.com".into(), password: "password".into() })).unwrap();
    }

    #[test]
    fn tampered_or_foreign_tokens_are_rejected() {
        let s = svc(Arc::new(MockAuthRepository::default()));
        assert!(matches!(s.verify_token("not-a-jwt"), Err(AuthError::TokenError(_))));
        let other = AuthService::new(
            Arc::new(MockAuthRepository::default()),
            AuthConfig { jwt_secret: "other".into(), token_ttl_hours: 1 },
        );
        let user = User::fresh(NewUser { email: "t@example.com".into(), username: "T".into(), role: Role::Student }, chrono::Utc::now());
        let token = other.issue_token(&user).unwrap();
        assert!(s.verify_token(&token).is_err());
    }
}
