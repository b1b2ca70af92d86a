//! Health endpoint and general HTTP behaviour.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, get, send};

#[tokio::test]
async fn health_reports_degraded_without_database() {
    let response = get(common::build_test_app(), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["db_healthy"], false);
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn response_carries_request_id() {
    let response = get(common::build_test_app(), "/api/v1/sections/templates").await;
    let id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap();
    assert_eq!(id.len(), 36, "request id should be a UUID");
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let response = get(common::build_test_app(), "/api/v1/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
    assert!(json["error"].as_str().unwrap().contains("/api/v1/does-not-exist"));
}

#[tokio::test]
async fn cors_exposes_download_headers() {
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = send(common::build_test_app(), request).await;
    let exposed = response
        .headers()
        .get("access-control-expose-headers")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    assert!(exposed.contains("x-checksum-sha256"));
    assert!(exposed.contains("content-disposition"));
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/products")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "GET")
        .body(Body::empty())
        .unwrap();
    let response = send(common::build_test_app(), request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn section_templates_are_public() {
    let response = get(common::build_test_app(), "/api/v1/sections/templates").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let templates = json["data"].as_array().expect("data array");
    assert_eq!(templates.len(), 10);
    assert!(templates.iter().any(|t| t["kind"] == "hero"));
}
