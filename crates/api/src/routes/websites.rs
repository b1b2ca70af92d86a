//! Route definitions for the website builder.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{editor, websites};
use crate::state::AppState;

/// Owner routes mounted at `/websites`.
///
/// ```text
/// GET    /                    -> list_websites
/// POST   /                    -> create_website
/// GET    /{id}                -> get_website
/// PATCH  /{id}                -> update_website
/// DELETE /{id}                -> delete_website
/// POST   /{id}/publish        -> set_published
/// GET    /{id}/editor         -> open_editor
/// DELETE /{id}/editor         -> close (discard unsaved changes)
/// POST   /{id}/editor/ops     -> apply_op
/// POST   /{id}/editor/undo    -> undo
/// POST   /{id}/editor/redo    -> redo
/// POST   /{id}/editor/reset   -> reset
/// POST   /{id}/editor/save    -> save
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(websites::list_websites).post(websites::create_website),
        )
        .route(
            "/{id}",
            get(websites::get_website)
                .patch(websites::update_website)
                .delete(websites::delete_website),
        )
        .route("/{id}/publish", post(websites::set_published))
        .route(
            "/{id}/editor",
            get(editor::open_editor).delete(editor::close),
        )
        .route("/{id}/editor/ops", post(editor::apply_op))
        .route("/{id}/editor/undo", post(editor::undo))
        .route("/{id}/editor/redo", post(editor::redo))
        .route("/{id}/editor/reset", post(editor::reset))
        .route("/{id}/editor/save", post(editor::save))
}

/// Public rendering of published sites, mounted at `/sites`.
pub fn public_router() -> Router<AppState> {
    Router::new().route("/{slug}", get(websites::get_public_site))
}

/// Section template catalogue, mounted at `/sections`.
pub fn sections_router() -> Router<AppState> {
    Router::new().route("/templates", get(websites::list_templates))
}
