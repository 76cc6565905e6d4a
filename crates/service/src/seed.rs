//! Demo data for a fresh collections store.

use chrono::Utc;
use models::{listing as lm, user_credentials::ALGO_ARGON2};
use tracing::info;

use crate::auth::domain::{NewUser, Role};
use crate::auth::password;
use crate::auth::repository::AuthRepository;
use crate::catalog::domain::ListingInput;
use crate::catalog::repository::CatalogRepository;
use crate::errors::ServiceError;
use crate::repo::CollectionsRepository;

pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password";

/// Create the demo maker and one listing, only when the store has no users at all.
pub async fn seed_demo(repo: &CollectionsRepository) -> Result<bool, ServiceError> {
    if repo.has_users().await? {
        return Ok(false);
    }
    let hash = password::hash_password(DEMO_PASSWORD)?;
    let maker = repo
        .create_user(
            NewUser { email: DEMO_EMAIL.into(), username: "Demo Maker".into(), role: Role::Maker },
            hash,
            ALGO_ARGON2.to_string(),
        )
        .await?;
    let listing = ListingInput {
        title: "3D 打印定制".into(),
        description: "PLA/树脂材料，支持校园自提".into(),
        price_cents: 2_000,
        listing_type: lm::TYPE_3D_PRINT.into(),
        production_mode: Some(lm::MODE_SELF.into()),
        image: None,
        details: None,
        tags: vec!["3d".into(), "定制".into()],
        status: None,
    }
    .into_new_listing(maker.id, &maker.username, Utc::now());
    repo.insert_listing(listing).await?;
    info!(user_id = %maker.id, event = "demo_seeded", "demo_seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::ListingQuery;
    use crate::test_support::collections_repo;

    #[tokio::test]
    async fn store_with_legacy_users_is_not_seeded() {
        let dir = std::env::temp_dir().join(format!("campus_seed_{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let users = serde_json::json!([{ "id": "user-7", "email": "real@school.edu", "username": "real", "password": "secret1" }]);
        tokio::fs::write(dir.join("users.json"), users.to_string()).await.unwrap();

        let db = models::db::connect_memory().await.unwrap();
        let repo = CollectionsRepository::open(db, Some(dir.clone())).await.unwrap();
        assert!(!seed_demo(&repo).await.unwrap());
        assert!(repo.find_user_by_email(DEMO_EMAIL).await.unwrap().is_none());
        assert!(repo.find_user_by_email("real@school.edu").await.unwrap().is_some());
        assert_eq!(repo.list_active(&ListingQuery::default()).await.unwrap().total, 0);
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn seeds_once() {
        let repo = collections_repo().await;
        assert!(seed_demo(repo.as_ref()).await.unwrap());
        assert!(!seed_demo(repo.as_ref()).await.unwrap());
        let page = repo.list_active(&ListingQuery::default()).await.unwrap();
        assert_eq!(page.total, 1);
        let maker = repo.find_user_by_email(DEMO_EMAIL).await.unwrap().unwrap();
        assert_eq!(maker.role, Role::Maker);
    }
}
