//! Behaviour both backends must share. Each test runs against relational and collections.

use chrono::{NaiveDate, Utc};
use models::wallet_transaction as ledger;

use super::{CollectionsRepository, MarketRepository};
use crate::auth::domain::Role;
use crate::auth::repository::AuthRepository;
use crate::catalog::domain::{DeleteOutcome, ListingQuery};
use crate::errors::ServiceError;
use crate::orders::domain::{plan_settlement, CreateOrderInput, OrderStatus, Settlement};
use crate::pagination::Pagination;
use crate::test_support::{backends, listing_for, user_with_balance};
use crate::wallet::domain::{AddressInput, CHECKIN_POINTS};
use crate::wallet::repository::WalletRepository;

async fn plan(repo: &dyn MarketRepository, buyer_id: uuid::Uuid, listing_id: uuid::Uuid, quantity: i32) -> Settlement {
    let buyer = repo.find_user(buyer_id).await.unwrap().unwrap();
    let listing = repo.get_listing(listing_id).await.unwrap().unwrap();
    let input = CreateOrderInput { service_id: listing_id, quantity: Some(quantity), notes: None };
    plan_settlement(&buyer, &listing, &input, Utc::now()).unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn settlement_moves_money_points_and_sales() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let maker = user_with_balance(repo, "maker@example.com", Role::Maker, 0).await;
        let buyer = user_with_balance(repo, "buyer@example.com", Role::Student, 20_000).await;
        let l = listing_for(repo, &maker, "Resin print", 5_550).await;

        let order = repo.settle_order(&plan(repo, buyer.id, l.id, 2).await).await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid, "{name}");
        assert_eq!(order.amount_cents, 11_100);

        let buyer = repo.find_user(buyer.id).await.unwrap().unwrap();
        let maker = repo.find_user(maker.id).await.unwrap().unwrap();
        assert_eq!(buyer.balance_cents, 8_900, "{name}");
        assert_eq!(buyer.points, 11, "{name}");
        assert_eq!(maker.balance_cents, 11_100, "{name}");
        assert_eq!(repo.get_listing(l.id).await.unwrap().unwrap().sales, 2, "{name}");

        let entries = repo.ledger(buyer.id, 50).await.unwrap();
        assert!(entries.iter().any(|e| e.kind == ledger::KIND_EXPENSE && e.amount == -11_100), "{name}");
        assert!(entries.iter().any(|e| e.kind == ledger::KIND_POINTS && e.amount == 11 && e.is_points), "{name}");
        let income = repo.ledger(maker.id, 50).await.unwrap();
        assert!(income.iter().any(|e| e.kind == ledger::KIND_INCOME && e.amount == 11_100), "{name}");

        assert_eq!(repo.orders_for_buyer(buyer.id).await.unwrap().len(), 1);
        assert_eq!(repo.orders_for_provider(maker.id).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn settlement_rechecks_balance() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let maker = user_with_balance(repo, "maker@example.com", Role::Maker, 0).await;
        let buyer = user_with_balance(repo, "buyer@example.com", Role::Student, 1_000).await;
        let l = listing_for(repo, &maker, "Course", 1_000).await;
        // 先规划两次，第二次结算时余额已不足
        let first = plan(repo, buyer.id, l.id, 1).await;
        let second = plan(repo, buyer.id, l.id, 1).await;
        repo.settle_order(&first).await.unwrap();
        let err = repo.settle_order(&second).await.unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientFunds), "{name}: {err:?}");

        let buyer = repo.find_user(buyer.id).await.unwrap().unwrap();
        assert_eq!(buyer.balance_cents, 0, "{name}");
        assert_eq!(repo.orders_for_buyer(buyer.id).await.unwrap().len(), 1, "{name}");
        assert_eq!(repo.get_listing(l.id).await.unwrap().unwrap().sales, 1, "{name}");
    }
}

#[tokio::test]
async fn cancel_refunds_both_parties_once() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let maker = user_with_balance(repo, "maker@example.com", Role::Maker, 0).await;
        let buyer = user_with_balance(repo, "buyer@example.com", Role::Student, 5_000).await;
        let l = listing_for(repo, &maker, "Print", 3_000).await;
        let order = repo.settle_order(&plan(repo, buyer.id, l.id, 1).await).await.unwrap();

        let cancelled = repo.cancel_order(order.id, OrderStatus::Paid).await.unwrap().unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled, "{name}");
        assert!(repo.cancel_order(order.id, OrderStatus::Paid).await.unwrap().is_none(), "{name}");

        assert_eq!(repo.find_user(buyer.id).await.unwrap().unwrap().balance_cents, 5_000, "{name}");
        assert_eq!(repo.find_user(maker.id).await.unwrap().unwrap().balance_cents, 0, "{name}");
        assert_eq!(repo.get_listing(l.id).await.unwrap().unwrap().sales, 0, "{name}");
        let refunds = repo.ledger(maker.id, 50).await.unwrap();
        assert!(refunds.iter().any(|e| e.kind == ledger::KIND_REFUND && e.amount == -3_000), "{name}");
        let stats = repo.maker_stats(maker.id).await.unwrap();
        assert_eq!(stats.orders, 0, "{name}");
        assert_eq!(stats.earnings_cents, 0, "{name}");
    }
}

#[tokio::test]
async fn status_update_is_compare_and_set() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let maker = user_with_balance(repo, "maker@example.com", Role::Maker, 0).await;
        let buyer = user_with_balance(repo, "buyer@example.com", Role::Student, 5_000).await;
        let l = listing_for(repo, &maker, "Print", 1_000).await;
        let order = repo.settle_order(&plan(repo, buyer.id, l.id, 1).await).await.unwrap();

        let moved = repo.transition_status(order.id, OrderStatus::Paid, OrderStatus::Processing).await.unwrap();
        assert_eq!(moved.map(|o| o.status), Some(OrderStatus::Processing), "{name}");
        let stale = repo.transition_status(order.id, OrderStatus::Paid, OrderStatus::Processing).await.unwrap();
        assert!(stale.is_none(), "{name}");
        assert_eq!(repo.get_order(order.id).await.unwrap().unwrap().status, OrderStatus::Processing);
    }
}

#[tokio::test]
async fn check_in_once_per_day() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let u = user_with_balance(repo, "s@example.com", Role::Student, 0).await;
        let plan = repo.check_in(u.id, day("2024-03-01")).await.unwrap();
        assert_eq!(plan.points, CHECKIN_POINTS, "{name}");
        let again = repo.check_in(u.id, day("2024-03-01")).await.unwrap_err();
        assert!(matches!(again, ServiceError::Validation(_)), "{name}");
        repo.check_in(u.id, day("2024-03-02")).await.unwrap();

        let u = repo.find_user(u.id).await.unwrap().unwrap();
        assert_eq!(u.points, CHECKIN_POINTS * 2, "{name}");
        assert_eq!(u.exp, 10, "{name}");
        assert_eq!(u.last_checkin_date, Some(day("2024-03-02")), "{name}");
        let entries = repo.ledger(u.id, 50).await.unwrap();
        assert_eq!(entries.iter().filter(|e| e.title == "每日签到").count(), 2, "{name}");
    }
}

#[tokio::test]
async fn top_up_appends_recharge() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let u = user_with_balance(repo, "s@example.com", Role::Student, 0).await;
        let wallet = repo.top_up(u.id, 2_500).await.unwrap();
        assert_eq!(wallet.balance_cents, 2_500, "{name}");
        let entries = repo.ledger(u.id, 50).await.unwrap();
        assert_eq!(entries.len(), 1, "{name}");
        assert_eq!(entries[0].kind, ledger::KIND_RECHARGE);
        assert!(matches!(
            repo.top_up(uuid::Uuid::new_v4(), 100).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}

#[tokio::test]
async fn only_one_default_address() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let u = user_with_balance(repo, "s@example.com", Role::Student, 0).await;
        let input = |recipient: &str, is_default| AddressInput {
            recipient: recipient.into(),
            phone: "13800000000".into(),
            region: "Shanghai".into(),
            detail: "Dorm 5".into(),
            is_default,
        };
        let first = repo.add_address(u.id, input("A", None)).await.unwrap();
        assert!(first.is_default, "{name}");
        let second = repo.add_address(u.id, input("B", Some(true))).await.unwrap();
        assert!(second.is_default, "{name}");
        repo.add_address(u.id, input("C", None)).await.unwrap();

        let all = repo.list_addresses(u.id).await.unwrap();
        assert_eq!(all.len(), 3, "{name}");
        let defaults: Vec<_> = all.iter().filter(|a| a.is_default).map(|a| a.recipient.as_str()).collect();
        assert_eq!(defaults, vec!["B"], "{name}");
    }
}

#[tokio::test]
async fn delete_retires_listings_with_orders() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let maker = user_with_balance(repo, "maker@example.com", Role::Maker, 0).await;
        let buyer = user_with_balance(repo, "buyer@example.com", Role::Student, 5_000).await;
        let sold = listing_for(repo, &maker, "Sold", 1_000).await;
        let unsold = listing_for(repo, &maker, "Unsold", 1_000).await;
        repo.settle_order(&plan(repo, buyer.id, sold.id, 1).await).await.unwrap();

        assert_eq!(repo.delete_or_retire_listing(sold.id).await.unwrap(), DeleteOutcome::Retired, "{name}");
        assert_eq!(repo.delete_or_retire_listing(unsold.id).await.unwrap(), DeleteOutcome::Deleted, "{name}");
        let retired = repo.get_listing(sold.id).await.unwrap().unwrap();
        assert_eq!(retired.status, models::listing::STATUS_OFFLINE, "{name}");
        assert!(repo.get_listing(unsold.id).await.unwrap().is_none(), "{name}");
        assert_eq!(repo.list_active(&ListingQuery::default()).await.unwrap().total, 0, "{name}");
    }
}

#[tokio::test]
async fn browse_filters_and_counts_views() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        let maker = user_with_balance(repo, "maker@example.com", Role::Maker, 0).await;
        for i in 0..5 {
            listing_for(repo, &maker, &format!("Bracket {i}"), 100 * (i + 1)).await;
        }
        let vase = listing_for(repo, &maker, "Vase", 900).await;

        let q = ListingQuery { q: Some("bracket".into()), pagination: Pagination::new(Some(2), Some(2)), ..Default::default() };
        let page = repo.list_active(&q).await.unwrap();
        assert_eq!(page.total, 5, "{name}");
        assert_eq!(page.items.len(), 2, "{name}");

        let course = ListingQuery { listing_type: Some(models::listing::TYPE_COURSE.into()), ..Default::default() };
        assert_eq!(repo.list_active(&course).await.unwrap().total, 0, "{name}");

        repo.view_listing(vase.id).await.unwrap();
        let viewed = repo.view_listing(vase.id).await.unwrap().unwrap();
        assert_eq!(viewed.views, 2, "{name}");
        assert!(repo.view_listing(uuid::Uuid::new_v4()).await.unwrap().is_none());
        assert_eq!(repo.maker_stats(maker.id).await.unwrap().views, 2, "{name}");
        assert_eq!(repo.featured(4).await.unwrap().len(), 4, "{name}");
    }
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    for (name, repo) in backends().await {
        let repo = repo.as_ref();
        user_with_balance(repo, "dup@example.com", Role::Student, 0).await;
        let err = repo
            .create_user(
                crate::auth::domain::NewUser { email: "dup@example.com".into(), username: "dup".into(), role: Role::Student },
                "x".into(),
                "plain".into(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, crate::auth::errors::AuthError::Conflict), "{name}");
    }
}

#[tokio::test]
async fn legacy_json_imports_and_persists_across_reopen() {
    let dir = std::env::temp_dir().join(format!("campus_legacy_{}", uuid::Uuid::new_v4()));
    tokio::fs::create_dir_all(&dir).await.unwrap();
    let users = serde_json::json!([{
        "id": "user-1",
        "email": "Old@Example.com",
        "username": "old",
        "password": "secret1",
        "wallet": {"balance": 12.5, "points": 3, "coupons": 1},
        "addresses": [{"id": "addr-1", "name": "Li", "phone": "1", "address": "Dorm", "isDefault": true}]
    }]);
    tokio::fs::write(dir.join("users.json"), users.to_string()).await.unwrap();
    let url = format!("sqlite://{}/data.sqlite?mode=rwc", dir.display());
    let cfg = configs::DatabaseConfig { url, ..Default::default() };

    let id = {
        let db = models::db::connect_with_config(&cfg).await.unwrap();
        let repo = CollectionsRepository::open(db, Some(dir.clone())).await.unwrap();
        let u = repo.find_user_by_email("old@example.com").await.unwrap().unwrap();
        assert_eq!(u.balance_cents, 1_250);
        assert_eq!(u.role, Role::Maker);
        let creds = repo.get_credentials(u.id).await.unwrap().unwrap();
        assert_eq!(creds.password_algorithm, models::user_credentials::ALGO_PLAIN);
        assert_eq!(repo.list_addresses(u.id).await.unwrap().len(), 1);
        repo.top_up(u.id, 750).await.unwrap();
        u.id
    };
    // 导入后以表内数据为准
    tokio::fs::remove_file(dir.join("users.json")).await.unwrap();

    let db = models::db::connect_with_config(&cfg).await.unwrap();
    let repo = CollectionsRepository::open(db, Some(dir.clone())).await.unwrap();
    let u = repo.find_user(id).await.unwrap().unwrap();
    assert_eq!(u.balance_cents, 2_000);
    assert_eq!(u.points, 3);
    drop(repo);
    let _ = tokio::fs::remove_dir_all(&dir).await;
}
