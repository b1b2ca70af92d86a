//! Handlers for FiveM/CFX script distribution: the admin catalogue and
//! version uploads, licence management, signed download links and the
//! game-server verification endpoint.

use axum::body::Body;
use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shopforge_core::crypto::{sha256_hex, sign_token, verify_token};
use shopforge_core::error::CoreError;
use shopforge_core::media::{self, MediaKind};
use shopforge_core::scripts::{
    self, DownloadGrant, LicenseFacts, ScriptVersion, VerifyReason, DOWNLOAD_TOKEN_TTL_SECS,
};
use shopforge_core::types::DbId;
use shopforge_db::models::script::{
    CreateScript, CreateScriptVersion, License, Script, ScriptVersionRow, UpdateScript,
};
use shopforge_db::repositories::{LicenseRepo, ScriptRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const MAX_TITLE_LEN: usize = 120;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GrantLicenseRequest {
    pub user_id: DbId,
    pub script_id: DbId,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub revoked: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadTokenRequest {
    /// Pin a specific version; defaults to the latest.
    pub version_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct DownloadTokenResponse {
    pub token: String,
    pub url: String,
    pub version: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub license_key: String,
    pub resource_name: String,
    pub server_ip: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub reason: VerifyReason,
}

// ---------------------------------------------------------------------------
// Public catalogue
// ---------------------------------------------------------------------------

/// GET /api/v1/scripts
pub async fn list_scripts(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Script>>>> {
    let scripts = ScriptRepo::list(&state.pool)
        .await?
        .into_iter()
        .filter(|s| s.is_active)
        .collect();
    Ok(Json(DataResponse { data: scripts }))
}

/// GET /api/v1/scripts/{id}/versions
///
/// Version history with changelogs, newest first.
pub async fn list_versions(
    State(state): State<AppState>,
    Path(script_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ScriptVersionRow>>>> {
    let script = load_script(&state, script_id).await?;
    if !script.is_active {
        return Err(script_not_found(script_id));
    }
    let versions = ScriptRepo::list_versions(&state.pool, script_id).await?;
    Ok(Json(DataResponse { data: versions }))
}

// ---------------------------------------------------------------------------
// Admin catalogue
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/scripts
pub async fn admin_list_scripts(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Script>>>> {
    let scripts = ScriptRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: scripts }))
}

/// POST /api/v1/admin/scripts
pub async fn create_script(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateScript>,
) -> AppResult<(StatusCode, Json<DataResponse<Script>>)> {
    scripts::validate_resource_name(&input.resource_name)?;
    validate_title(&input.title)?;

    let script = ScriptRepo::create(&state.pool, &input).await?;
    tracing::info!(
        script_id = script.id,
        resource_name = %script.resource_name,
        admin_id = admin.user_id,
        "Script created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: script })))
}

/// PATCH /api/v1/admin/scripts/{id}
pub async fn update_script(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateScript>,
) -> AppResult<Json<DataResponse<Script>>> {
    if let Some(title) = &input.title {
        validate_title(title)?;
    }
    let script = ScriptRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(script_not_found(id))?;
    Ok(Json(DataResponse { data: script }))
}

/// POST /api/v1/admin/scripts/{id}/versions
///
/// Multipart form: `version` (`MAJOR.MINOR.PATCH`), optional `changelog`
/// and the `file` zip archive. Versions must strictly increase.
pub async fn upload_version(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(script_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<ScriptVersionRow>>)> {
    let script = load_script(&state, script_id).await?;

    let mut version: Option<String> = None;
    let mut changelog = String::new();
    let mut archive: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "version" => {
                version = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::BadRequest(e.to_string()))?,
                );
            }
            "changelog" => {
                changelog = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "file" => {
                let name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                archive = Some((name, data.to_vec()));
            }
            _ => {}
        }
    }

    let version = ScriptVersion::parse(
        &version.ok_or_else(|| AppError::BadRequest("Das Feld 'version' fehlt".into()))?,
    )?;
    let (file_name, data) =
        archive.ok_or_else(|| AppError::BadRequest("Das Feld 'file' fehlt".into()))?;
    if media::classify(&file_name)?.kind != MediaKind::Archive {
        return Err(AppError::BadRequest(
            "Script-Versionen müssen als .zip hochgeladen werden".into(),
        ));
    }
    media::validate_size(data.len())?;

    let latest = ScriptRepo::latest_version(&state.pool, script_id)
        .await?
        .map(|row| row.parsed());
    scripts::validate_next_version(latest, version)?;

    let key = format!("scripts/{script_id}/{version}.zip");
    state.store.put(&key, &data, "application/zip").await?;

    let input = CreateScriptVersion {
        script_id,
        version,
        changelog: changelog.trim().to_string(),
        storage_key: key.clone(),
        checksum_sha256: sha256_hex(&data),
        size_bytes: data.len() as i64,
    };
    let row = match ScriptRepo::create_version(&state.pool, &input).await {
        Ok(row) => row,
        Err(e) => {
            if let Err(cleanup) = state.store.delete(&key).await {
                tracing::warn!(key = %key, error = %cleanup, "Failed to remove orphaned archive");
            }
            return Err(e.into());
        }
    };

    tracing::info!(
        script_id,
        resource_name = %script.resource_name,
        version = %row.version,
        size_bytes = row.size_bytes,
        admin_id = admin.user_id,
        "Script version uploaded",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: row })))
}

// ---------------------------------------------------------------------------
// Licences
// ---------------------------------------------------------------------------

/// GET /api/v1/licenses
pub async fn list_my_licenses(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<License>>>> {
    let licenses = LicenseRepo::list_for_user(&state.pool, auth_user.user_id).await?;
    Ok(Json(DataResponse { data: licenses }))
}

/// GET /api/v1/admin/scripts/{id}/licenses
pub async fn admin_list_licenses(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(script_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<License>>>> {
    load_script(&state, script_id).await?;
    let licenses = LicenseRepo::list_for_script(&state.pool, script_id).await?;
    Ok(Json(DataResponse { data: licenses }))
}

/// POST /api/v1/admin/licenses
///
/// Grant a licence outside checkout. Fails with 409 if the user already
/// holds one for the script.
pub async fn grant_license(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<GrantLicenseRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<License>>)> {
    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Nutzer",
            id: input.user_id,
        }))?;
    load_script(&state, input.script_id).await?;

    let license = LicenseRepo::grant(&state.pool, input.user_id, input.script_id).await?;
    tracing::info!(
        license_id = license.id,
        user_id = input.user_id,
        script_id = input.script_id,
        admin_id = admin.user_id,
        "Licence granted",
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: license })))
}

/// PATCH /api/v1/admin/licenses/{id}
///
/// Revoke or restore a licence.
pub async fn set_license_revoked(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RevokeRequest>,
) -> AppResult<Json<DataResponse<License>>> {
    let license = LicenseRepo::set_revoked(&state.pool, id, input.revoked)
        .await?
        .ok_or(license_not_found(id))?;
    tracing::info!(license_id = id, revoked = input.revoked, admin_id = admin.user_id, "Licence updated");
    Ok(Json(DataResponse { data: license }))
}

/// POST /api/v1/admin/licenses/{id}/reset-ip
///
/// Clear the bound server IP so the next verification binds a new one.
pub async fn reset_license_ip(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<License>>> {
    let license = LicenseRepo::reset_ip(&state.pool, id)
        .await?
        .ok_or(license_not_found(id))?;
    tracing::info!(license_id = id, admin_id = admin.user_id, "Licence IP binding reset");
    Ok(Json(DataResponse { data: license }))
}

// ---------------------------------------------------------------------------
// Downloads
// ---------------------------------------------------------------------------

/// POST /api/v1/scripts/{id}/download-token
///
/// Requires an active licence for the script. The returned link is valid for
/// [`DOWNLOAD_TOKEN_TTL_SECS`] and needs no further authentication.
pub async fn create_download_token(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(script_id): Path<DbId>,
    body: Option<Json<DownloadTokenRequest>>,
) -> AppResult<Json<DataResponse<DownloadTokenResponse>>> {
    let input = body.map(|Json(b)| b).unwrap_or_default();

    let script = load_script(&state, script_id).await?;
    if !script.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Dieses Script ist nicht mehr verfügbar".into(),
        )));
    }

    let license = LicenseRepo::find_for_user_script(&state.pool, auth_user.user_id, script_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "Für dieses Script liegt keine Lizenz vor".into(),
            ))
        })?;
    if license.is_revoked {
        return Err(AppError::Core(CoreError::Forbidden(
            "Die Lizenz wurde widerrufen".into(),
        )));
    }

    let version = match input.version_id {
        Some(version_id) => ScriptRepo::find_version(&state.pool, version_id)
            .await?
            .filter(|v| v.script_id == script_id)
            .ok_or(version_not_found(version_id))?,
        None => ScriptRepo::latest_version(&state.pool, script_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Für dieses Script wurde noch keine Version hochgeladen".into())
            })?,
    };

    let expires_at = Utc::now() + chrono::Duration::seconds(DOWNLOAD_TOKEN_TTL_SECS);
    let grant = DownloadGrant {
        license_id: license.id,
        version_id: version.id,
    };
    let token = sign_token(
        &state.config.download_token_secret,
        &grant.to_payload(),
        expires_at.timestamp(),
    );
    let url = format!("{}/api/v1/downloads/{token}", state.config.public_base_url);

    tracing::info!(
        license_id = license.id,
        version = %version.version,
        user_id = auth_user.user_id,
        "Download link issued",
    );
    Ok(Json(DataResponse {
        data: DownloadTokenResponse {
            token,
            url,
            version: version.version,
            expires_at,
        },
    }))
}

/// GET /api/v1/downloads/{token}
///
/// Stream the archive a signed link points at. The licence is re-checked so
/// revoking it also cancels outstanding links.
pub async fn download(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    let payload = verify_token(
        &state.config.download_token_secret,
        &token,
        Utc::now().timestamp(),
    )?;
    let grant = DownloadGrant::from_payload(&payload)?;

    let license = LicenseRepo::find_by_id(&state.pool, grant.license_id)
        .await?
        .ok_or(license_not_found(grant.license_id))?;
    if license.is_revoked {
        return Err(AppError::Core(CoreError::Forbidden(
            "Die Lizenz wurde widerrufen".into(),
        )));
    }

    let version = ScriptRepo::find_version(&state.pool, grant.version_id)
        .await?
        .filter(|v| v.script_id == license.script_id)
        .ok_or(version_not_found(grant.version_id))?;
    let script = load_script(&state, version.script_id).await?;

    let bytes = state.store.get(&version.storage_key).await?;
    let disposition = format!(
        "attachment; filename=\"{}-{}.zip\"",
        script.resource_name, version.version
    );

    tracing::info!(license_id = license.id, version = %version.version, "Script downloaded");
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::HeaderName::from_static("x-checksum-sha256"),
                version.checksum_sha256,
            ),
        ],
        Body::from(bytes),
    )
        .into_response())
}

// ---------------------------------------------------------------------------
// Game-server verification
// ---------------------------------------------------------------------------

/// POST /api/v1/cfx/verify
///
/// Called by the resource on server start. Always answers 200 with a reason
/// unless the request itself is malformed. The first successful check binds
/// the licence to `server_ip`.
pub async fn verify(
    State(state): State<AppState>,
    Json(input): Json<VerifyRequest>,
) -> AppResult<Json<VerifyResponse>> {
    let server_ip = scripts::canonical_server_ip(&input.server_ip)?;

    let key = scripts::normalize_license_key(&input.license_key);
    if !scripts::is_valid_license_key_format(&key) {
        return Ok(Json(verdict(VerifyReason::MalformedKey)));
    }

    let license = LicenseRepo::find_with_script_by_key(&state.pool, &key).await?;
    let facts = license.as_ref().map(|l| LicenseFacts {
        resource_name: &l.resource_name,
        is_revoked: l.is_revoked,
        script_active: l.script_active,
        bound_ip: l.bound_ip.as_deref(),
    });
    let mut reason =
        scripts::verify_license(facts.as_ref(), input.resource_name.trim(), &server_ip);

    if let (true, Some(license)) = (reason.is_valid(), &license) {
        if !LicenseRepo::bind_verified_ip(&state.pool, license.id, &server_ip).await? {
            reason = VerifyReason::IpMismatch;
        }
    }

    tracing::info!(
        resource_name = %input.resource_name,
        %server_ip,
        reason = ?reason,
        "Licence verification",
    );
    Ok(Json(verdict(reason)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn verdict(reason: VerifyReason) -> VerifyResponse {
    VerifyResponse {
        valid: reason.is_valid(),
        reason,
    }
}

async fn load_script(state: &AppState, id: DbId) -> AppResult<Script> {
    ScriptRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(script_not_found(id))
}

fn script_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Skript", id })
}

fn version_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Skriptversion",
        id,
    })
}

fn license_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Lizenz", id })
}

fn validate_title(title: &str) -> AppResult<()> {
    let len = title.trim().chars().count();
    if len == 0 || len > MAX_TITLE_LEN {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Der Titel muss 1 bis {MAX_TITLE_LEN} Zeichen lang sein"
        ))));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::websites::website_not_found;

    #[test]
    fn not_found_messages_use_german_entity_names() {
        let errors = [
            (script_not_found(1), "Skript mit ID 1"),
            (version_not_found(2), "Skriptversion mit ID 2"),
            (license_not_found(3), "Lizenz mit ID 3"),
            (website_not_found(4), "Webseite mit ID 4"),
        ];
        for (err, expected) in errors {
            match err {
                AppError::Core(core) => assert!(core.to_string().starts_with(expected)),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn verdict_marks_only_ok_as_valid() {
        let ok = verdict(VerifyReason::Ok);
        assert!(ok.valid);
        let mismatch = verdict(VerifyReason::IpMismatch);
        assert!(!mismatch.valid);
        assert_eq!(mismatch.reason, VerifyReason::IpMismatch);
    }

    #[test]
    fn verdict_serializes_snake_case_reason() {
        let json = serde_json::to_value(verdict(VerifyReason::WrongResource)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["reason"], "wrong_resource");
    }

    #[test]
    fn titles_must_be_non_empty_and_bounded() {
        assert!(validate_title("Garage System").is_ok());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(MAX_TITLE_LEN + 1)).is_err());
    }
}
