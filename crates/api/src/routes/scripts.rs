//! Customer and game-server routes for script distribution.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::scripts;
use crate::state::AppState;

/// Routes mounted at `/scripts`.
///
/// ```text
/// GET  /                      -> list_scripts
/// GET  /{id}/versions         -> list_versions
/// POST /{id}/download-token   -> create_download_token (licence holders)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(scripts::list_scripts))
        .route("/{id}/versions", get(scripts::list_versions))
        .route("/{id}/download-token", post(scripts::create_download_token))
}

/// `GET /licenses` for the caller's own licences.
pub fn licenses_router() -> Router<AppState> {
    Router::new().route("/", get(scripts::list_my_licenses))
}

/// Signed download links, mounted at `/downloads`.
pub fn downloads_router() -> Router<AppState> {
    Router::new().route("/{token}", get(scripts::download))
}

/// Game-server endpoints, mounted at `/cfx`.
pub fn cfx_router() -> Router<AppState> {
    Router::new().route("/verify", post(scripts::verify))
}
