//! Route definitions for `/media`.

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use shopforge_core::media::MAX_UPLOAD_BYTES;

use crate::handlers::media;
use crate::state::AppState;

/// Multipart framing on top of the file itself.
pub(crate) const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Routes mounted at `/media`.
///
/// ```text
/// GET    /               -> list_media (?kind=image|video|document|archive)
/// POST   /               -> upload_media (multipart)
/// GET    /{id}           -> get_media
/// PATCH  /{id}           -> update_media (alt text)
/// DELETE /{id}           -> delete_media
/// GET    /{id}/content   -> get_media_content (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(media::list_media)
                .post(media::upload_media)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD_BYTES)),
        )
        .route(
            "/{id}",
            get(media::get_media)
                .patch(media::update_media)
                .delete(media::delete_media),
        )
        .route("/{id}/content", get(media::get_media_content))
}
