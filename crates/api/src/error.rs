use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shopforge_core::error::CoreError;
use shopforge_core::storage::StorageError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce `{ "error", "code" }` JSON bodies.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `shopforge_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An object-store failure.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A resource addressed by something other than its id (slug, token).
    #[error("Not found: {0}")]
    NotFound(String),

    /// An internal error with a message for the logs only.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "Ein interner Fehler ist aufgetreten";

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Core(CoreError::Validation(describe_validation_errors(&errors)))
    }
}

/// Flatten `validator` errors into one message, preferring the field messages.
fn describe_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Ungültiger Wert für '{field}'"),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string())
                }
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            AppError::Database(err) => classify_sqlx_error(err),

            AppError::Storage(err) => match err {
                StorageError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "Die Datei wurde nicht gefunden".to_string(),
                ),
                other => {
                    tracing::error!(error = %other, "Storage error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        INTERNAL_MESSAGE.to_string(),
                    )
                }
            },

            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a sqlx error into an HTTP status, error code, and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique violations on constraints named `uq_*` map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str, String) {
    match err {
        sqlx::Error::RowNotFound => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Eintrag wurde nicht gefunden".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique_violation
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        "CONFLICT",
                        conflict_message(constraint),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

/// User-facing text for known unique constraints.
fn conflict_message(constraint: &str) -> String {
    match constraint {
        "uq_users_email" => "Diese E-Mail-Adresse ist bereits registriert".to_string(),
        "uq_websites_slug" => "Diese Adresse ist bereits vergeben".to_string(),
        "uq_products_slug" => "Ein Produkt mit diesem Slug existiert bereits".to_string(),
        "uq_coupons_code" => "Dieser Gutscheincode existiert bereits".to_string(),
        "uq_scripts_resource_name" => {
            "Ein Script mit diesem Ressourcennamen existiert bereits".to_string()
        }
        "uq_script_versions_script_version" => "Diese Version existiert bereits".to_string(),
        "uq_licenses_user_script" => {
            "Der Nutzer besitzt bereits eine Lizenz für dieses Script".to_string()
        }
        other => format!("Doppelter Wert verletzt Eindeutigkeit: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn status_and_body(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn core_errors_map_to_status_codes() {
        let cases = [
            (
                AppError::Core(CoreError::NotFound { entity: "Produkt", id: 3 }),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                AppError::Core(CoreError::Validation("x".into())),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (
                AppError::Core(CoreError::Conflict("x".into())),
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                AppError::Core(CoreError::Unauthorized("x".into())),
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
            ),
            (
                AppError::Core(CoreError::Forbidden("x".into())),
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
            ),
        ];
        for (err, status, code) in cases {
            let (got_status, body) = status_and_body(err).await;
            assert_eq!(got_status, status);
            assert_eq!(body["code"], code);
        }
    }

    #[tokio::test]
    async fn internal_details_are_not_leaked() {
        let (status, body) =
            status_and_body(AppError::InternalError("db password is hunter2".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn row_not_found_is_404() {
        let (status, _) = status_and_body(AppError::Database(sqlx::Error::RowNotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn missing_object_is_404() {
        let (status, body) =
            status_and_body(AppError::Storage(StorageError::NotFound("media/1/x.png".into())))
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }
}
