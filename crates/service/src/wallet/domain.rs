use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::domain::User;
use crate::errors::ServiceError;

pub const CHECKIN_POINTS: i64 = 10;
pub const CHECKIN_EXP: i64 = 5;
pub const EXP_PER_LEVEL: i64 = 100;
pub const LEDGER_LIMIT: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Wallet {
    pub balance_cents: i64,
    pub points: i64,
    pub coupons: i32,
}

impl From<&User> for Wallet {
    fn from(u: &User) -> Self {
        Self { balance_cents: u.balance_cents, points: u.points, coupons: u.coupons }
    }
}

/// One append-only ledger row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub amount: i64,
    #[serde(default)]
    pub is_points: bool,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(user_id: Uuid, kind: &str, title: &str, amount: i64, is_points: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            kind: kind.to_string(),
            title: title.to_string(),
            amount,
            is_points,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletView {
    pub wallet: Wallet,
    pub transactions: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SocialStats {
    pub likes: i64,
    pub following: i64,
    pub followers: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InteractionCounts {
    pub want: i64,
    pub owned: i64,
    pub footprints: i64,
    pub brand_following: i64,
}

/// Profile page view: the user plus display defaults
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub stats: SocialStats,
    pub interaction_counts: InteractionCounts,
    pub wallet: Wallet,
}

impl Profile {
    pub fn from_user(mut user: User) -> Self {
        if user.sign.as_deref().map_or(true, str::is_empty) {
            user.sign = Some(models::user::DEFAULT_SIGN.to_string());
        }
        if user.gender.as_deref().map_or(true, str::is_empty) {
            user.gender = Some(models::user::DEFAULT_GENDER.to_string());
        }
        if user.reputation.is_empty() {
            user.reputation = models::user::DEFAULT_REPUTATION.to_string();
        }
        user.level = user.level.max(1);
        let wallet = Wallet::from(&user);
        Self { user, stats: SocialStats::default(), interaction_counts: InteractionCounts::default(), wallet }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sign: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default, alias = "backgroundImage")]
    pub background_image: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
}

impl ProfileUpdate {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if let Some(name) = self.name.as_deref() {
            let len = name.trim().chars().count();
            if !(2..=30).contains(&len) {
                return Err(ServiceError::validation("name must be 2-30 characters"));
            }
        }
        if let Some(gender) = self.gender.as_deref() {
            if !matches!(gender, "male" | "female" | "other") {
                return Err(ServiceError::validation("gender must be male, female or other"));
            }
        }
        if self.sign.as_deref().is_some_and(|s| s.chars().count() > 100) {
            return Err(ServiceError::validation("sign too long"));
        }
        Ok(())
    }

    /// Apply the supplied fields onto `user`.
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name { user.username = name.trim().to_string(); }
        if let Some(sign) = &self.sign { user.sign = Some(sign.clone()); }
        if let Some(avatar) = &self.avatar { user.avatar = Some(avatar.clone()); }
        if let Some(bg) = &self.background_image { user.background_image = Some(bg.clone()); }
        if let Some(gender) = &self.gender { user.gender = Some(gender.clone()); }
        user.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recipient: String,
    pub phone: String,
    pub region: String,
    pub detail: String,
    #[serde(default)]
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub recipient: String,
    pub phone: String,
    pub region: String,
    pub detail: String,
    #[serde(default, alias = "isDefault")]
    pub is_default: Option<bool>,
}

impl AddressInput {
    pub fn validate(&self) -> Result<(), ServiceError> {
        for (field, value) in [
            ("recipient", &self.recipient),
            ("phone", &self.phone),
            ("region", &self.region),
            ("detail", &self.detail),
        ] {
            if value.trim().is_empty() {
                return Err(ServiceError::validation(format!("{} required", field)));
            }
        }
        Ok(())
    }

    /// The first address of a user is always the default.
    pub fn into_address(self, user_id: Uuid, existing: u64) -> Address {
        Address {
            id: Uuid::new_v4(),
            user_id,
            recipient: self.recipient.trim().to_string(),
            phone: self.phone.trim().to_string(),
            region: self.region.trim().to_string(),
            detail: self.detail.trim().to_string(),
            is_default: existing == 0 || self.is_default.unwrap_or(false),
            created_at: Utc::now(),
        }
    }
}

/// Pre-computed effect of one check-in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckinPlan {
    pub today: NaiveDate,
    pub points: i64,
    pub exp: i64,
    pub level: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinAward {
    pub points: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckinOutcome {
    pub message: String,
    pub points: i64,
    pub exp: i64,
    pub level: i32,
    pub award: CheckinAward,
}

impl From<CheckinPlan> for CheckinOutcome {
    fn from(p: CheckinPlan) -> Self {
        Self {
            message: "Check-in successful".into(),
            points: p.points,
            exp: p.exp,
            level: p.level,
            award: CheckinAward { points: CHECKIN_POINTS, exp: CHECKIN_EXP },
        }
    }
}

/// Award the daily check-in, at most once per UTC day.
pub fn apply_checkin(user: &User, today: NaiveDate) -> Result<CheckinPlan, ServiceError> {
    if user.last_checkin_date == Some(today) {
        return Err(ServiceError::validation("Today already checked in"));
    }
    let exp = user.exp + CHECKIN_EXP;
    let earned_level = i32::try_from(exp / EXP_PER_LEVEL + 1).unwrap_or(i32::MAX);
    Ok(CheckinPlan {
        today,
        points: user.points + CHECKIN_POINTS,
        exp,
        level: user.level.max(earned_level),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::domain::{NewUser, Role};

    fn user() -> User {
        User::fresh(NewUser { email: "w@example.com".into(), username: "W".into(), role: Role::Student }, Utc::now())
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn checkin_awards_points_and_exp() {
        let plan = apply_checkin(&user(), day("2024-03-01")).unwrap();
        assert_eq!(plan.points, CHECKIN_POINTS);
        assert_eq!(plan.exp, CHECKIN_EXP);
        assert_eq!(plan.level, 1);
    }

    #[test]
    fn checkin_levels_up_but_never_down() {
        let mut u = user();
        u.exp = 95;
        assert_eq!(apply_checkin(&u, day("2024-03-01")).unwrap().level, 2);
        u.level = 7;
        assert_eq!(apply_checkin(&u, day("2024-03-01")).unwrap().level, 7);
    }

    #[test]
    fn second_checkin_same_day_is_rejected() {
        let mut u = user();
        u.last_checkin_date = Some(day("2024-03-01"));
        assert!(matches!(apply_checkin(&u, day("2024-03-01")), Err(ServiceError::Validation(_))));
        assert!(apply_checkin(&u, day("2024-03-02")).is_ok());
    }

    #[test]
    fn profile_fills_defaults() {
        let mut u = user();
        u.sign = None;
        u.gender = Some(String::new());
        u.level = 0;
        let p = Profile::from_user(u);
        assert_eq!(p.user.sign.as_deref(), Some("让生活更简单"));
        assert_eq!(p.user.gender.as_deref(), Some("male"));
        assert_eq!(p.user.level, 1);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["interaction_counts"]["brand_following"], 0);
        assert_eq!(json["wallet"]["balance_cents"], 0);
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn profile_update_validation() {
        let bad_gender = ProfileUpdate { gender: Some("robot".into()), ..Default::default() };
        assert!(bad_gender.validate().is_err());
        let short_name = ProfileUpdate { name: Some("a".into()), ..Default::default() };
        assert!(short_name.validate().is_err());
        let ok = ProfileUpdate { name: Some("Alice".into()), gender: Some("female".into()), ..Default::default() };
        assert!(ok.validate().is_ok());
        let mut u = user();
        ok.apply(&mut u);
        assert_eq!(u.username, "Alice");
        assert_eq!(u.gender.as_deref(), Some("female"));
    }

    #[test]
    fn first_address_becomes_default() {
        let input = AddressInput {
            recipient: "A".into(),
            phone: "1".into(),
            region: "R".into(),
            detail: "D".into(),
            is_default: None,
        };
        assert!(input.clone().into_address(Uuid::new_v4(), 0).is_default);
        assert!(!input.into_address(Uuid::new_v4(), 2).is_default);
    }
}
