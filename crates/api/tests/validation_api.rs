//! Request validation that rejects input before it reaches the database.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, get_auth, json_request, post_json, post_json_auth};
use serde_json::json;

#[tokio::test]
async fn register_rejects_invalid_email() {
    let body = json!({
        "email": "not-an-email",
        "password": "long enough password",
        "display_name": "Kim",
    });
    let response = post_json(common::build_test_app(), "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn register_rejects_short_password() {
    let body = json!({
        "email": "kim@example.com",
        "password": "short",
        "display_name": "Kim",
    });
    let response = post_json(common::build_test_app(), "/api/v1/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_rejects_empty_cart() {
    let body = json!({ "items": [] });
    let response = post_json(common::build_test_app(), "/api/v1/checkout/quote", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_rejects_non_positive_quantity() {
    let body = json!({ "items": [{ "product_id": 1, "quantity": 0 }] });
    let response = post_json(common::build_test_app(), "/api/v1/checkout/quote", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn billing_address_requires_street() {
    let token = common::customer_token(3);
    let body = json!({
        "full_name": "Kim Meyer",
        "street": " ",
        "postal_code": "10115",
        "city": "Berlin",
        "country": "DE",
    });
    let response = json_request(
        common::build_test_app(),
        Method::PUT,
        "/api/v1/checkout/orders/1/billing",
        body,
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn website_slug_is_validated() {
    let token = common::customer_token(3);
    let body = json!({ "name": "Mein Shop", "slug": "Not A Slug!" });
    let response =
        post_json_auth(common::build_test_app(), "/api/v1/websites", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn media_list_rejects_unknown_kind() {
    let token = common::customer_token(3);
    let response = get_auth(
        common::build_test_app(),
        "/api/v1/media?kind=audio",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn coupon_percent_must_be_in_range() {
    let token = common::admin_token(1);
    let body = json!({ "code": "HALFOFF", "percent_off": 150 });
    let response =
        post_json_auth(common::build_test_app(), "/api/v1/admin/coupons", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_price_above_cap_is_rejected() {
    let token = common::admin_token(1);
    let body = json!({ "price_cents": i64::MAX / 2 + 1 });
    let response = json_request(
        common::build_test_app(),
        Method::PATCH,
        "/api/v1/admin/products/1",
        body,
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn script_resource_name_is_validated() {
    let token = common::admin_token(1);
    let body = json!({ "resource_name": "Bad Name", "title": "Garage" });
    let response =
        post_json_auth(common::build_test_app(), "/api/v1/admin/scripts", body, &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cfx_verify_reports_malformed_key() {
    let body = json!({
        "license_key": "not-a-key",
        "resource_name": "sf_garage",
        "server_ip": "203.0.113.7",
    });
    let response = post_json(common::build_test_app(), "/api/v1/cfx/verify", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["valid"], false);
    assert_eq!(json["reason"], "malformed_key");
}

#[tokio::test]
async fn cfx_verify_rejects_invalid_server_ip() {
    let body = json!({
        "license_key": "SF-ABCD-EFGH-JKLM-NPQR",
        "resource_name": "sf_garage",
        "server_ip": "not-an-ip",
    });
    let response = post_json(common::build_test_app(), "/api/v1/cfx/verify", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tampered_download_link_is_401() {
    let response = get(common::build_test_app(), "/api/v1/downloads/abc.def").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_download_link_is_401() {
    let config = common::test_config();
    let token = shopforge_core::crypto::sign_token(
        &config.download_token_secret,
        "download:1:1",
        chrono::Utc::now().timestamp() - 1,
    );
    let response = get(
        common::build_test_app(),
        &format!("/api/v1/downloads/{token}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
