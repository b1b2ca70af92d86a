//! Role checks on `/admin` routes.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get_auth, json_request, post_json_auth};
use serde_json::json;

#[tokio::test]
async fn customer_cannot_list_admin_products() {
    let token = common::customer_token(7);
    let response = get_auth(common::build_test_app(), "/api/v1/admin/products", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
}

#[tokio::test]
async fn customer_cannot_create_coupons() {
    let token = common::customer_token(7);
    let body = json!({ "code": "SUMMER", "percent_off": 10 });
    let response =
        post_json_auth(common::build_test_app(), "/api/v1/admin/coupons", body, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn customer_cannot_change_order_status() {
    let token = common::customer_token(7);
    let response = json_request(
        common::build_test_app(),
        Method::PATCH,
        "/api/v1/admin/orders/1/status",
        json!({ "status": "paid" }),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn customer_cannot_manage_licences() {
    let token = common::customer_token(7);
    let app = common::build_test_app();
    let response = post_json_auth(
        app.clone(),
        "/api/v1/admin/licenses",
        json!({ "user_id": 7, "script_id": 1 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response =
        post_json_auth(app, "/api/v1/admin/licenses/3/reset-ip", json!({}), &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_routes_without_token_are_401_not_403() {
    let response = common::get(common::build_test_app(), "/api/v1/admin/scripts").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
