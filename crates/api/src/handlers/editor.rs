//! Handlers for `/websites/{id}/editor`: the builder's editing session with
//! linear undo/redo history.
//!
//! A session is opened lazily from the saved document on first access and
//! lives in [`AppState::editor_sessions`] until it is closed or goes idle.
//! Edits stay in memory until `save` writes the current state back.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use shopforge_core::editor::{EditorOp, EditorSession, EditorState};
use shopforge_core::error::CoreError;
use shopforge_core::types::DbId;
use shopforge_db::repositories::WebsiteRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::websites::{load_owned_website, website_not_found};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

type EditorResponse = AppResult<Json<DataResponse<EditorState>>>;

/// GET /api/v1/websites/{id}/editor
pub async fn open_editor(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> EditorResponse {
    with_session(&state, &auth_user, id, |s| Ok(s.snapshot())).await
}

/// POST /api/v1/websites/{id}/editor/ops
///
/// Apply one [`EditorOp`] and commit the result to the history.
pub async fn apply_op(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(op): Json<EditorOp>,
) -> EditorResponse {
    with_session(&state, &auth_user, id, |s| s.apply(op)).await
}

/// POST /api/v1/websites/{id}/editor/undo
///
/// A no-op at the oldest entry; the returned state says so via `can_undo`.
pub async fn undo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> EditorResponse {
    with_session(&state, &auth_user, id, |s| Ok(s.undo())).await
}

/// POST /api/v1/websites/{id}/editor/redo
pub async fn redo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> EditorResponse {
    with_session(&state, &auth_user, id, |s| Ok(s.redo())).await
}

/// POST /api/v1/websites/{id}/editor/reset
///
/// Forget the history but keep the current document.
pub async fn reset(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> EditorResponse {
    with_session(&state, &auth_user, id, |s| Ok(s.reset())).await
}

/// POST /api/v1/websites/{id}/editor/save
///
/// Persist the current document. History is kept, so undo still works
/// after saving.
pub async fn save(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> EditorResponse {
    load_owned_website(&state, &auth_user, id).await?;

    let sections = state
        .editor_sessions
        .with_existing(auth_user.user_id, id, |s| s.sections().to_vec())
        .await
        .ok_or_else(no_open_session)?;

    WebsiteRepo::save_sections(&state.pool, id, &sections)
        .await?
        .ok_or(website_not_found(id))?;

    // Only mark clean if nothing was edited while the write was in flight.
    let snapshot = state
        .editor_sessions
        .with_existing(auth_user.user_id, id, |s| {
            if s.sections() == sections.as_slice() {
                s.mark_saved();
            }
            s.snapshot()
        })
        .await
        .ok_or_else(no_open_session)?;

    tracing::info!(website_id = id, sections = sections.len(), "Website document saved");
    Ok(Json(DataResponse { data: snapshot }))
}

/// DELETE /api/v1/websites/{id}/editor
///
/// Close the session, discarding unsaved changes and history.
pub async fn close(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let was_open = state.editor_sessions.close(auth_user.user_id, id).await;
    tracing::debug!(website_id = id, was_open, "Editor session closed");
    Ok(StatusCode::NO_CONTENT)
}

/// Run `f` on the caller's session, opening it from the saved document if
/// needed. Ownership is checked on every call.
async fn with_session(
    state: &AppState,
    user: &AuthUser,
    website_id: DbId,
    f: impl FnOnce(&mut EditorSession) -> Result<EditorState, CoreError>,
) -> EditorResponse {
    let site = load_owned_website(state, user, website_id).await?;
    let persisted = site.sections.0;

    let snapshot = state
        .editor_sessions
        .with_session(user.user_id, website_id, move || persisted, f)
        .await?;
    Ok(Json(DataResponse { data: snapshot }))
}

fn no_open_session() -> AppError {
    AppError::Core(CoreError::Conflict(
        "Es gibt keine offene Bearbeitung für diese Website".into(),
    ))
}
