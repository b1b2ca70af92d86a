//! Admin gate on top of [`AuthUser`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shopforge_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Catalogue, coupon, order-status, script and licence management all take
/// this extractor. A valid customer token gets 403, a missing one 401.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Administratorrechte erforderlich".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}
