#![cfg(test)]
//! In-memory backends and fixtures shared by unit tests.

use std::sync::Arc;

use chrono::Utc;
use migration::MigratorTrait;

use crate::auth::domain::{NewUser, Role, User};
use crate::catalog::domain::{Listing, ListingInput};
use crate::repo::{CollectionsRepository, MarketRepository, SeaOrmRepository};

pub async fn relational_repo() -> Arc<SeaOrmRepository> {
    let db = models::db::connect_memory().await.expect("connect sqlite memory");
    migration::Migrator::up(&db, None).await.expect("migrate up");
    Arc::new(SeaOrmRepository::new(db))
}

pub async fn collections_repo() -> Arc<CollectionsRepository> {
    let db = models::db::connect_memory().await.expect("connect sqlite memory");
    Arc::new(CollectionsRepository::open(db, None).await.expect("open collections"))
}

/// Both backends, for tests that must behave the same on each.
pub async fn backends() -> Vec<(&'static str, Arc<dyn MarketRepository>)> {
    vec![
        ("relational", relational_repo().await as Arc<dyn MarketRepository>),
        ("collections", collections_repo().await as Arc<dyn MarketRepository>),
    ]
}

/// Create a user and top up `balance_cents` when positive.
pub async fn user_with_balance(repo: &dyn MarketRepository, email: &str, role: Role, balance_cents: i64) -> User {
    let user = repo
        .create_user(
            NewUser { email: email.into(), username: email.split('@').next().unwrap_or("user").into(), role },
            "hash".into(),
            models::user_credentials::ALGO_PLAIN.into(),
        )
        .await
        .expect("create user");
    if balance_cents > 0 {
        repo.top_up(user.id, balance_cents).await.expect("top up");
    }
    repo.find_user(user.id).await.expect("find user").expect("user exists")
}

pub fn listing_input(title: &str, price_cents: i64) -> ListingInput {
    ListingInput {
        title: title.into(),
        description: format!("{} description", title),
        price_cents,
        listing_type: models::listing::TYPE_3D_PRINT.into(),
        production_mode: None,
        image: None,
        details: None,
        tags: vec![],
        status: None,
    }
}

pub async fn listing_for(repo: &dyn MarketRepository, maker: &User, title: &str, price_cents: i64) -> Listing {
    let listing = listing_input(title, price_cents).into_new_listing(maker.id, &maker.username, Utc::now());
    repo.insert_listing(listing).await.expect("insert listing")
}
