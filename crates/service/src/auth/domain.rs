use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Admin can only be assigned out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Maker,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => models::user::ROLE_STUDENT,
            Role::Maker => models::user::ROLE_MAKER,
            Role::Admin => models::user::ROLE_ADMIN,
        }
    }

    /// Roles allowed to publish listings
    pub fn can_publish(&self) -> bool {
        matches!(self, Role::Maker | Role::Admin)
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "maker" => Ok(Role::Maker),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Account as seen by every module. Carries no secrets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub balance_cents: i64,
    pub points: i64,
    pub coupons: i32,
    pub exp: i64,
    pub level: i32,
    pub avatar: Option<String>,
    pub sign: Option<String>,
    pub gender: Option<String>,
    pub background_image: Option<String>,
    pub reputation: String,
    pub maker_profile: serde_json::Value,
    pub last_checkin_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating an account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub role: Role,
}

/// Domain credentials (hashed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub user_id: Uuid,
    pub password_hash: String,
    pub password_algorithm: String,
}

/// Login/registration result (session)
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// JWT claims. `sub` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Authenticated caller extracted from a verified token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl User {
    /// New account with zeroed wallet and profile defaults.
    pub fn fresh(input: NewUser, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: input.email,
            username: input.username,
            role: input.role,
            balance_cents: 0,
            points: 0,
            coupons: 0,
            exp: 0,
            level: 1,
            avatar: None,
            sign: Some(models::user::DEFAULT_SIGN.to_string()),
            gender: Some(models::user::DEFAULT_GENDER.to_string()),
            background_image: None,
            reputation: models::user::DEFAULT_REPUTATION.to_string(),
            maker_profile: serde_json::json!({}),
            last_checkin_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn as_current(&self) -> CurrentUser {
        CurrentUser { id: self.id, role: self.role }
    }
}
