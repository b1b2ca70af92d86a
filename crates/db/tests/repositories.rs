//! Repository SQL against a migrated database: login lockout, session
//! rotation, licence issuing and server-IP binding.

use chrono::{Duration, Utc};
use shopforge_db::models::order::{CreateOrder, NewOrderItem};
use shopforge_db::models::product::{CreateProduct, PRODUCT_KIND_SCRIPT};
use shopforge_db::models::script::CreateScript;
use shopforge_db::models::user::{CreateUser, User};
use shopforge_db::repositories::{
    LicenseRepo, OrderRepo, ProductRepo, ScriptRepo, SessionRepo, UserRepo,
};
use sqlx::PgPool;

const CUSTOMER_ROLE_ID: i64 = 2;

async fn customer(pool: &PgPool, email: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            display_name: "Kundin".to_string(),
            password_hash: Some("not-a-real-hash".to_string()),
            role_id: CUSTOMER_ROLE_ID,
        },
    )
    .await
    .unwrap()
}

/// A paid-for script product plus a one-line order of it.
async fn script_order(pool: &PgPool, user_id: i64) -> (i64, i64) {
    let script = ScriptRepo::create(
        pool,
        &CreateScript {
            resource_name: "sf_garage".to_string(),
            title: "Garage".to_string(),
            description: String::new(),
        },
    )
    .await
    .unwrap();
    let product = ProductRepo::create(
        pool,
        &CreateProduct {
            slug: "sf-garage".to_string(),
            name: "Garage".to_string(),
            description: String::new(),
            price_cents: 1999,
            kind: PRODUCT_KIND_SCRIPT.to_string(),
            script_id: Some(script.id),
        },
    )
    .await
    .unwrap();
    let order = OrderRepo::create(
        pool,
        &CreateOrder {
            user_id,
            coupon_code: None,
            subtotal_cents: 1999,
            discount_cents: 0,
            total_cents: 1999,
            vat_cents: 319,
            items: vec![NewOrderItem {
                product_id: product.id,
                product_name: product.name.clone(),
                unit_price_cents: 1999,
                quantity: 1,
            }],
        },
    )
    .await
    .unwrap();
    (script.id, order.order.id)
}

#[sqlx::test(migrations = "./migrations")]
async fn failed_logins_lock_on_threshold_and_reset_counter(pool: PgPool) {
    let user = customer(&pool, "lock@example.de").await;
    let until = Utc::now() + Duration::minutes(15);

    for _ in 0..2 {
        let locked = UserRepo::record_failed_login(&pool, user.id, 3, until).await.unwrap();
        assert!(locked.is_none());
    }
    let row = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(row.failed_login_count, 2);
    assert!(row.locked_until.is_none());

    let locked = UserRepo::record_failed_login(&pool, user.id, 3, until).await.unwrap();
    assert!(locked.is_some());

    let row = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert_eq!(row.failed_login_count, 0);
    assert!(row.locked_until.is_some_and(|t| t > Utc::now()));

    UserRepo::record_successful_login(&pool, user.id).await.unwrap();
    let row = UserRepo::find_by_id(&pool, user.id).await.unwrap().unwrap();
    assert!(row.locked_until.is_none());
    assert!(row.last_login_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn rotation_chains_sessions_and_only_succeeds_once(pool: PgPool) {
    let user = customer(&pool, "rotate@example.de").await;
    let expires = Utc::now() + Duration::days(7);

    let first = SessionRepo::create(&pool, user.id, "hash-a", expires).await.unwrap();
    let second = SessionRepo::rotate(&pool, first.id, "hash-b", expires)
        .await
        .unwrap()
        .expect("open session rotates");
    assert_eq!(second.rotated_from, Some(first.id));
    assert_eq!(second.user_id, user.id);

    let old = SessionRepo::find_by_token_hash(&pool, "hash-a").await.unwrap().unwrap();
    assert!(old.revoked_at.is_some());
    assert!(!old.is_usable(Utc::now()));

    let again = SessionRepo::rotate(&pool, first.id, "hash-c", expires).await.unwrap();
    assert!(again.is_none());
    assert!(SessionRepo::find_by_token_hash(&pool, "hash-c").await.unwrap().is_none());

    assert_eq!(SessionRepo::revoke_all_for_user(&pool, user.id).await.unwrap(), 1);
    let current = SessionRepo::find_by_token_hash(&pool, "hash-b").await.unwrap().unwrap();
    assert!(current.revoked_at.is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn issuing_licences_twice_keeps_the_first_key(pool: PgPool) {
    let user = customer(&pool, "buyer@example.de").await;
    let (script_id, order_id) = script_order(&pool, user.id).await;

    let issued = LicenseRepo::issue_for_order(&pool, order_id).await.unwrap();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].script_id, script_id);
    assert_eq!(issued[0].order_id, Some(order_id));

    let repeat = LicenseRepo::issue_for_order(&pool, order_id).await.unwrap();
    assert!(repeat.is_empty());

    let held = LicenseRepo::find_for_user_script(&pool, user.id, script_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(held.license_key, issued[0].license_key);
}

#[sqlx::test(migrations = "./migrations")]
async fn first_verified_ip_wins_the_binding(pool: PgPool) {
    let user = customer(&pool, "server@example.de").await;
    let (script_id, _) = script_order(&pool, user.id).await;
    let license = LicenseRepo::grant(&pool, user.id, script_id).await.unwrap();

    assert!(LicenseRepo::bind_verified_ip(&pool, license.id, "203.0.113.7").await.unwrap());
    assert!(!LicenseRepo::bind_verified_ip(&pool, license.id, "198.51.100.2").await.unwrap());
    assert!(LicenseRepo::bind_verified_ip(&pool, license.id, "203.0.113.7").await.unwrap());

    let row = LicenseRepo::find_by_id(&pool, license.id).await.unwrap().unwrap();
    assert_eq!(row.bound_ip.as_deref(), Some("203.0.113.7"));
    assert!(row.last_verified_at.is_some());

    LicenseRepo::reset_ip(&pool, license.id).await.unwrap();
    assert!(LicenseRepo::bind_verified_ip(&pool, license.id, "198.51.100.2").await.unwrap());
}
