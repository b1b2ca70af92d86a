//! Website builder: editor operations, save, publish and the public view.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{body_json, get, get_auth, json_request, post_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_site(app: &Router, token: &str, slug: &str) -> i64 {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/websites",
        json!({ "name": "Werkstatt Müller", "slug": slug }),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

async fn editor_post(app: &Router, token: &str, id: i64, action: &str, body: Value) -> Value {
    let response =
        post_json_auth(app.clone(), &format!("/api/v1/websites/{id}/editor/{action}"), body, token)
            .await;
    assert_eq!(response.status(), StatusCode::OK, "editor {action}");
    body_json(response).await["data"].clone()
}

fn kinds(sections: &Value) -> Vec<&str> {
    sections
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["kind"].as_str().unwrap())
        .collect()
}

#[sqlx::test(migrations = "../db/migrations")]
async fn saved_edits_are_what_gets_published(pool: PgPool) {
    let user = common::create_user(&pool, "anna@example.de", common::CUSTOMER_ROLE_ID).await;
    let token = common::customer_token(user.id);
    let app = common::build_db_test_app(pool);
    let id = create_site(&app, &token, "werkstatt-mueller").await;

    let response = get_auth(app.clone(), &format!("/api/v1/websites/{id}/editor"), &token).await;
    let opened = body_json(response).await["data"].clone();
    assert_eq!(kinds(&opened["sections"]), ["hero", "text", "contact"]);
    assert_eq!(opened["can_undo"], false);

    let added = editor_post(&app, &token, id, "ops", json!({ "op": "add", "kind": "faq" })).await;
    assert_eq!(kinds(&added["sections"]), ["hero", "text", "contact", "faq"]);
    assert_eq!(added["dirty"], true);

    let saved = editor_post(&app, &token, id, "save", json!({})).await;
    assert_eq!(saved["dirty"], false);
    assert_eq!(saved["can_undo"], true);

    let response = post_json_auth(
        app.clone(),
        &format!("/api/v1/websites/{id}/publish"),
        json!({ "published": true }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // An unsaved edit stays private.
    let hero_id = added["sections"][0]["id"].as_str().unwrap();
    editor_post(&app, &token, id, "ops", json!({ "op": "remove", "id": hero_id })).await;

    let response = get(app, "/api/v1/sites/werkstatt-mueller").await;
    assert_eq!(response.status(), StatusCode::OK);
    let public = body_json(response).await["data"].clone();
    assert_eq!(public["name"], "Werkstatt Müller");
    assert_eq!(kinds(&public["sections"]), ["hero", "text", "contact", "faq"]);
    assert!(public.get("owner_id").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn undo_and_redo_walk_the_history(pool: PgPool) {
    let user = common::create_user(&pool, "ben@example.de", common::CUSTOMER_ROLE_ID).await;
    let token = common::customer_token(user.id);
    let app = common::build_db_test_app(pool);
    let id = create_site(&app, &token, "ben-baut").await;

    editor_post(&app, &token, id, "ops", json!({ "op": "add", "kind": "gallery" })).await;
    editor_post(&app, &token, id, "ops", json!({ "op": "add", "kind": "cta", "index": 0 })).await;

    let undone = editor_post(&app, &token, id, "undo", json!({})).await;
    assert_eq!(kinds(&undone["sections"]), ["hero", "text", "contact", "gallery"]);
    assert_eq!(undone["can_redo"], true);

    // A new edit after undo drops the redo tail.
    let branched =
        editor_post(&app, &token, id, "ops", json!({ "op": "add", "kind": "video" })).await;
    assert_eq!(branched["can_redo"], false);

    let redo = editor_post(&app, &token, id, "redo", json!({})).await;
    assert_eq!(kinds(&redo["sections"]), ["hero", "text", "contact", "gallery", "video"]);

    let reset = editor_post(&app, &token, id, "reset", json!({})).await;
    assert_eq!(reset["can_undo"], false);
    assert_eq!(kinds(&reset["sections"]), ["hero", "text", "contact", "gallery", "video"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn closing_the_editor_discards_unsaved_changes(pool: PgPool) {
    let user = common::create_user(&pool, "clara@example.de", common::CUSTOMER_ROLE_ID).await;
    let token = common::customer_token(user.id);
    let app = common::build_db_test_app(pool);
    let id = create_site(&app, &token, "clara").await;

    editor_post(&app, &token, id, "ops", json!({ "op": "add", "kind": "image" })).await;
    let response = json_request(
        app.clone(),
        Method::DELETE,
        &format!("/api/v1/websites/{id}/editor"),
        json!({}),
        Some(&token),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app, &format!("/api/v1/websites/{id}/editor"), &token).await;
    let reopened = body_json(response).await["data"].clone();
    assert_eq!(kinds(&reopened["sections"]), ["hero", "text", "contact"]);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn other_customers_cannot_edit_or_see_drafts(pool: PgPool) {
    let owner = common::create_user(&pool, "owner@example.de", common::CUSTOMER_ROLE_ID).await;
    let other = common::create_user(&pool, "other@example.de", common::CUSTOMER_ROLE_ID).await;
    let app = common::build_db_test_app(pool);
    let id = create_site(&app, &common::customer_token(owner.id), "privat").await;

    let response = get_auth(
        app.clone(),
        &format!("/api/v1/websites/{id}/editor"),
        &common::customer_token(other.id),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get(app, "/api/v1/sites/privat").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
