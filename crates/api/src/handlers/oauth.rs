//! Handlers for `/auth/oauth/{provider}`: Discord and GitHub sign-in.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use shopforge_core::error::CoreError;
use shopforge_core::oauth::{OAuthProfile, OAuthProvider};
use shopforge_core::roles::ROLE_CUSTOMER;
use shopforge_db::models::user::{CreateUser, User};
use shopforge_db::repositories::{OAuthIdentityRepo, RoleRepo, UserRepo};

use crate::config::OAuthClientConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::auth::{
    create_auth_response, ensure_can_sign_in, issue_otp_challenge, LoginResponse,
};
use crate::oauth;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OAuthStartResponse {
    pub provider: OAuthProvider,
    pub authorize_url: String,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackRequest {
    pub code: String,
    pub state: String,
}

/// GET /api/v1/auth/oauth/{provider}/start
///
/// Returns the provider URL the browser should be sent to.
pub async fn start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> AppResult<Json<DataResponse<OAuthStartResponse>>> {
    let provider = OAuthProvider::from_name(&provider)?;
    let client = configured_client(&state, provider)?;

    let (authorize_url, oauth_state) =
        oauth::authorize_url(provider, client, &state.config.download_token_secret)?;

    Ok(Json(DataResponse {
        data: OAuthStartResponse {
            provider,
            authorize_url,
            state: oauth_state,
        },
    }))
}

/// POST /api/v1/auth/oauth/{provider}/callback
///
/// Verify `state`, exchange `code`, then sign in the linked account,
/// linking by verified e-mail or creating a new customer when needed.
pub async fn callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(input): Json<OAuthCallbackRequest>,
) -> AppResult<Json<LoginResponse>> {
    let provider = OAuthProvider::from_name(&provider)?;
    let client = configured_client(&state, provider)?;

    oauth::verify_state(provider, &input.state, &state.config.download_token_secret)?;
    if input.code.trim().is_empty() {
        return Err(AppError::BadRequest("Autorisierungscode fehlt".into()));
    }

    let access_token = oauth::exchange_code(&state.http, provider, client, &input.code).await?;
    let profile = oauth::fetch_profile(&state.http, provider, &access_token).await?;

    let user = find_or_create_user(&state, &profile).await?;
    ensure_can_sign_in(&user)?;

    if user.two_factor_enabled {
        let challenge = issue_otp_challenge(&state, user.id).await?;
        return Ok(Json(LoginResponse::OtpRequired(challenge)));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let response = create_auth_response(&state, &user, &role_name).await?;
    Ok(Json(LoginResponse::Tokens(response)))
}

fn configured_client(state: &AppState, provider: OAuthProvider) -> AppResult<&OAuthClientConfig> {
    state.config.oauth.client(provider).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Die Anmeldung über {} ist nicht eingerichtet",
            provider.as_str()
        )))
    })
}

async fn find_or_create_user(state: &AppState, profile: &OAuthProfile) -> AppResult<User> {
    let provider = profile.provider.as_str();

    if let Some(identity) = OAuthIdentityRepo::find(&state.pool, provider, &profile.subject).await? {
        return UserRepo::find_by_id(&state.pool, identity.user_id)
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "OAuth identity {} points to missing user {}",
                    identity.id, identity.user_id
                ))
            });
    }

    let email = profile.email.clone().ok_or_else(|| {
        AppError::Core(CoreError::Validation(
            "Der Anbieter hat keine bestätigte E-Mail-Adresse übermittelt".into(),
        ))
    })?;

    let user = match UserRepo::find_by_email(&state.pool, &email).await? {
        Some(existing) => existing,
        None => {
            let role_id = RoleRepo::find_id_by_name(&state.pool, ROLE_CUSTOMER).await?;
            let created = UserRepo::create(
                &state.pool,
                &CreateUser {
                    email,
                    display_name: profile.display_name.clone(),
                    password_hash: None,
                    role_id,
                },
            )
            .await?;
            tracing::info!(user_id = created.id, provider, "User registered via OAuth");
            created
        }
    };

    OAuthIdentityRepo::link(&state.pool, user.id, provider, &profile.subject).await?;
    tracing::info!(user_id = user.id, provider, "OAuth identity linked");
    Ok(user)
}
