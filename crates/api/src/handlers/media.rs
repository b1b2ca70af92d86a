//! Handlers for the `/media` library.
//!
//! Files live in the object store under `media/<owner>/<uuid>.<ext>`; the
//! `media_assets` table holds the metadata.

use axum::body::Body;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use shopforge_core::error::CoreError;
use shopforge_core::media::{self, MediaKind};
use shopforge_core::types::DbId;
use shopforge_db::models::media::{CreateMediaAsset, MediaAsset};
use shopforge_db::repositories::MediaRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MediaListParams {
    pub kind: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMediaRequest {
    pub alt_text: String,
}

/// POST /api/v1/media
///
/// Multipart form with a required `file` field and an optional `alt_text`.
pub async fn upload_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<MediaAsset>>)> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut alt_text = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "file" => {
                let name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((name, data.to_vec()));
            }
            "alt_text" => {
                alt_text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            _ => {}
        }
    }

    let (raw_name, data) =
        file.ok_or_else(|| AppError::BadRequest("Das Feld 'file' fehlt".into()))?;
    let file_name = media::sanitize_file_name(&raw_name);
    let media_type = media::classify(&file_name)?;
    media::validate_size(data.len())?;
    media::validate_alt_text(&alt_text)?;

    let (width, height) = match media_type.kind {
        MediaKind::Image => media::image_dimensions(&data)
            .map(|(w, h)| (Some(w as i32), Some(h as i32)))
            .unwrap_or((None, None)),
        _ => (None, None),
    };

    let key = media::storage_key(auth_user.user_id, media_type.extension);
    state.store.put(&key, &data, media_type.content_type).await?;

    let input = CreateMediaAsset {
        owner_id: auth_user.user_id,
        file_name,
        storage_key: key.clone(),
        content_type: media_type.content_type.to_string(),
        kind: media_type.kind.as_str().to_string(),
        size_bytes: data.len() as i64,
        width,
        height,
        alt_text,
    };

    let asset = match MediaRepo::create(&state.pool, &input).await {
        Ok(asset) => asset,
        Err(e) => {
            // Do not leave an orphaned object behind.
            if let Err(cleanup) = state.store.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        media_id = asset.id,
        owner_id = asset.owner_id,
        kind = %asset.kind,
        size_bytes = asset.size_bytes,
        "Media uploaded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: asset })))
}

/// GET /api/v1/media
///
/// The caller's library, newest first, optionally filtered by `kind`.
pub async fn list_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Query(params): Query<MediaListParams>,
) -> AppResult<Json<DataResponse<Vec<MediaAsset>>>> {
    if let Some(kind) = params.kind.as_deref() {
        validate_kind(kind)?;
    }
    let assets = MediaRepo::list_for_owner(
        &state.pool,
        auth_user.user_id,
        params.kind.as_deref(),
        shopforge_db::clamp_limit(params.limit),
        shopforge_db::clamp_offset(params.offset),
    )
    .await?;
    Ok(Json(DataResponse { data: assets }))
}

/// GET /api/v1/media/{id}
pub async fn get_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MediaAsset>>> {
    let asset = load_owned_asset(&state, &auth_user, id).await?;
    Ok(Json(DataResponse { data: asset }))
}

/// GET /api/v1/media/{id}/content
///
/// Public so published sites can embed the file.
pub async fn get_media_content(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Response> {
    let asset = MediaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(media_not_found(id))?;
    let bytes = state.store.get(&asset.storage_key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, asset.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        Body::from(bytes),
    )
        .into_response())
}

/// PATCH /api/v1/media/{id}
pub async fn update_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMediaRequest>,
) -> AppResult<Json<DataResponse<MediaAsset>>> {
    media::validate_alt_text(&input.alt_text)?;
    load_owned_asset(&state, &auth_user, id).await?;

    let asset = MediaRepo::update_alt_text(&state.pool, id, input.alt_text.trim())
        .await?
        .ok_or(media_not_found(id))?;
    Ok(Json(DataResponse { data: asset }))
}

/// DELETE /api/v1/media/{id}
pub async fn delete_media(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    load_owned_asset(&state, &auth_user, id).await?;

    let asset = MediaRepo::delete(&state.pool, id)
        .await?
        .ok_or(media_not_found(id))?;
    if let Err(e) = state.store.delete(&asset.storage_key).await {
        tracing::warn!(media_id = id, error = %e, "Failed to delete media object");
    }

    tracing::info!(media_id = id, "Media deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_owned_asset(state: &AppState, user: &AuthUser, id: DbId) -> AppResult<MediaAsset> {
    let asset = MediaRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(media_not_found(id))?;
    user.ensure_owner(asset.owner_id)?;
    Ok(asset)
}

fn media_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Mediendatei", id })
}

fn validate_kind(kind: &str) -> AppResult<()> {
    let known = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Document,
        MediaKind::Archive,
    ];
    if known.iter().any(|k| k.as_str() == kind) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Unbekannte Medienart '{kind}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kinds_pass_the_filter_check() {
        for kind in ["image", "video", "document", "archive"] {
            assert!(validate_kind(kind).is_ok(), "{kind}");
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(matches!(validate_kind("audio"), Err(AppError::BadRequest(_))));
    }
}
