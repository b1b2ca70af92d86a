//! Access-token extractor. Refresh tokens never reach this path; they are
//! opaque and only accepted by `/auth/refresh`.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use shopforge_core::error::CoreError;
use shopforge_core::roles::ROLE_ADMIN;
use shopforge_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Caller identity taken from the access token's claims. The role is not
/// re-read from the database, so a role change applies on the next refresh.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    /// Role name (`"admin"` or `"customer"`).
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Fail with 403 unless the caller owns the resource or is an admin.
    pub fn ensure_owner(&self, owner_id: DbId) -> Result<(), AppError> {
        if self.user_id == owner_id || self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Core(CoreError::Forbidden(
                "Kein Zugriff auf diese Ressource".into(),
            )))
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Anmeldung erforderlich".into()))
            })?;

        let token = bearer_token(header).ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Ungültiges Authorization-Format. Erwartet: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized(
                "Sitzung ungültig oder abgelaufen".into(),
            ))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// The token part of a `Bearer` authorization header. The scheme is matched
/// case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc.def"), Some("abc.def"));
    }

    #[test]
    fn other_schemes_and_empty_tokens_are_rejected() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn owner_and_admin_pass_ownership_check() {
        let customer = AuthUser { user_id: 7, role: "customer".into() };
        let admin = AuthUser { user_id: 1, role: ROLE_ADMIN.into() };
        assert!(customer.ensure_owner(7).is_ok());
        assert!(customer.ensure_owner(8).is_err());
        assert!(admin.ensure_owner(8).is_ok());
    }
}
