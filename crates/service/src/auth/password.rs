//! Password hashing. New hashes are argon2; legacy `plain` rows are accepted
//! once and flagged for rehash.
use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use rand::rngs::OsRng;
use models::user_credentials::{ALGO_ARGON2, ALGO_PLAIN};

use super::domain::Credentials;
use super::errors::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// 正确但需要升级为 argon2
    ValidNeedsRehash,
    Invalid,
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string())
}

pub fn verify(password: &str, cred: &Credentials) -> Result<Verdict, AuthError> {
    match cred.password_algorithm.as_str() {
        ALGO_ARGON2 => {
            let parsed = PasswordHash::new(&cred.password_hash).map_err(|e| AuthError::HashError(e.to_string()))?;
            Ok(if Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok() {
                Verdict::Valid
            } else {
                Verdict::Invalid
            })
        }
        ALGO_PLAIN => Ok(if constant_time_eq(password.as_bytes(), cred.password_hash.as_bytes()) {
            Verdict::ValidNeedsRehash
        } else {
            Verdict::Invalid
        }),
        other => {
            tracing::warn!(user_id = %cred.user_id, algorithm = %other, "unsupported password algorithm; password reset required");
            Ok(Verdict::Invalid)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
