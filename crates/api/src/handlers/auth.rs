//! Handlers for the `/auth` resource: registration, login with optional
//! one-time-passcode step, token refresh, logout and 2FA settings.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shopforge_core::error::CoreError;
use shopforge_core::otp::{
    challenge_state, ensure_usable, generate_otp, validate_code_format, verify_otp,
};
use shopforge_core::roles::ROLE_CUSTOMER;
use shopforge_core::types::{DbId, Timestamp};
use shopforge_db::models::oauth::OAuthIdentity;
use shopforge_db::models::user::{CreateUser, User, UserResponse};
use shopforge_db::repositories::{OAuthIdentityRepo, OtpRepo, RoleRepo, SessionRepo, UserRepo};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Consecutive failed logins before the account is locked.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// Minutes an account stays locked.
const LOCK_DURATION_MINS: i64 = 15;

const INVALID_CREDENTIALS: &str = "E-Mail-Adresse oder Passwort ist falsch";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Bitte gib eine gültige E-Mail-Adresse ein"))]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 80, message = "Der Anzeigename muss 1 bis 80 Zeichen lang sein"))]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub challenge_id: DbId,
    pub code: String,
}

/// Tokens plus the signed-in user.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

/// Returned by login instead of tokens when 2FA is enabled.
#[derive(Debug, Serialize)]
pub struct OtpChallengeResponse {
    pub otp_required: bool,
    pub challenge_id: DbId,
    pub expires_at: Timestamp,
    /// Only present when `OTP_EXPOSE_CODE` is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LoginResponse {
    Tokens(AuthResponse),
    OtpRequired(OtpChallengeResponse),
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub identities: Vec<OAuthIdentity>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
///
/// Create a customer account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    input.validate()?;
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    let role_id = RoleRepo::find_id_by_name(&state.pool, ROLE_CUSTOMER).await?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: normalize_email(&input.email),
            display_name: input.display_name.trim().to_string(),
            password_hash: Some(password_hash),
            role_id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");
    let response = create_auth_response(&state, &user, ROLE_CUSTOMER).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/auth/login
///
/// Authenticate with e-mail and password. Returns tokens, or a one-time
/// passcode challenge when the account has 2FA enabled.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let user = UserRepo::find_by_email(&state.pool, &normalize_email(&input.email))
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized(INVALID_CREDENTIALS.into())))?;

    ensure_can_sign_in(&user)?;

    // OAuth-only accounts have no password to check against.
    let Some(password_hash) = user.password_hash.as_deref() else {
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    };

    let password_valid = verify_password(&input.password, password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let lock_until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
        if let Some(until) =
            UserRepo::record_failed_login(&state.pool, user.id, MAX_FAILED_ATTEMPTS, lock_until)
                .await?
        {
            tracing::warn!(user_id = user.id, %until, "Account locked after failed logins");
        }
        return Err(AppError::Core(CoreError::Unauthorized(
            INVALID_CREDENTIALS.into(),
        )));
    }

    if user.two_factor_enabled {
        let challenge = issue_otp_challenge(&state, user.id).await?;
        return Ok(Json(LoginResponse::OtpRequired(challenge)));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let response = create_auth_response(&state, &user, &role_name).await?;
    Ok(Json(LoginResponse::Tokens(response)))
}

/// POST /api/v1/auth/otp/verify
///
/// Complete a 2FA login with the passcode from the challenge.
pub async fn verify_otp_code(
    State(state): State<AppState>,
    Json(input): Json<VerifyOtpRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_code_format(&input.code)?;

    let challenge = OtpRepo::find_by_id(&state.pool, input.challenge_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Unbekannte Anmeldeanfrage. Bitte melde dich erneut an.".into(),
            ))
        })?;
    ensure_usable(challenge_state(
        challenge.expires_at,
        challenge.consumed_at.is_some(),
        challenge.attempts,
        Utc::now(),
    ))?;

    if !verify_otp(&input.code, &challenge.code_hash) {
        OtpRepo::record_failed_attempt(&state.pool, challenge.id).await?;
        tracing::info!(challenge_id = challenge.id, "Wrong one-time passcode");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Der Code ist falsch".into(),
        )));
    }

    // Guards against two concurrent verifications of the same code.
    if !OtpRepo::consume(&state.pool, challenge.id).await? {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Der Code wurde bereits verwendet".into(),
        )));
    }

    let user = UserRepo::find_by_id(&state.pool, challenge.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Konto existiert nicht mehr".into())))?;
    ensure_can_sign_in(&user)?;

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let response = create_auth_response(&state, &user, &role_name).await?;
    Ok(Json(response))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a refresh token for new tokens. The presented session is
/// rotated; presenting an already rotated token revokes all of the user's
/// sessions.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::find_by_token_hash(&state.pool, &token_hash)
        .await?
        .ok_or_else(invalid_session)?;

    if session.revoked_at.is_some() {
        let revoked = SessionRepo::revoke_all_for_user(&state.pool, session.user_id).await?;
        tracing::warn!(
            user_id = session.user_id,
            session_id = session.id,
            revoked,
            "Rotated refresh token reused, all sessions revoked",
        );
        return Err(invalid_session());
    }
    if !session.is_usable(Utc::now()) {
        return Err(invalid_session());
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Konto existiert nicht mehr".into())))?;
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Das Konto ist deaktiviert".into(),
        )));
    }
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    SessionRepo::rotate(&state.pool, session.id, &refresh_hash, refresh_expiry(&state))
        .await?
        .ok_or_else(invalid_session)?;

    Ok(Json(build_auth_response(&state, &user, &role_name, refresh_plaintext)?))
}

/// POST /api/v1/auth/logout
///
/// Revoke every session of the caller. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth_user.user_id).await?;
    tracing::debug!(user_id = auth_user.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<MeResponse>>> {
    let user = load_user(&state, auth_user.user_id).await?;
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let identities = OAuthIdentityRepo::list_for_user(&state.pool, user.id).await?;
    Ok(Json(DataResponse {
        data: MeResponse {
            user: UserResponse::from_user(&user, &role_name),
            identities,
        },
    }))
}

/// POST /api/v1/auth/2fa/enable
pub async fn enable_two_factor(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    set_two_factor(&state, auth_user.user_id, true).await
}

/// POST /api/v1/auth/2fa/disable
pub async fn disable_two_factor(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    set_two_factor(&state, auth_user.user_id, false).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Reject deactivated and temporarily locked accounts.
pub(crate) fn ensure_can_sign_in(user: &User) -> AppResult<()> {
    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Das Konto ist deaktiviert".into(),
        )));
    }
    if let Some(locked_until) = user.locked_until {
        if locked_until > Utc::now() {
            return Err(AppError::Core(CoreError::Forbidden(
                "Das Konto ist vorübergehend gesperrt. Bitte versuche es später erneut.".into(),
            )));
        }
    }
    Ok(())
}

async fn load_user(state: &AppState, user_id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Nutzer",
            id: user_id,
        }))
}

async fn set_two_factor(
    state: &AppState,
    user_id: DbId,
    enabled: bool,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    UserRepo::set_two_factor(&state.pool, user_id, enabled).await?;
    tracing::info!(user_id, enabled, "Two-factor setting changed");

    let user = load_user(state, user_id).await?;
    let role_name = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from_user(&user, &role_name),
    }))
}

/// Create a passcode challenge and hand the code to the simulated channel.
pub(crate) async fn issue_otp_challenge(state: &AppState, user_id: DbId) -> AppResult<OtpChallengeResponse> {
    let otp = generate_otp(Utc::now());
    let challenge = OtpRepo::create(&state.pool, user_id, &otp.hash, otp.expires_at).await?;

    // Simulated delivery: the log stands in for SMS / e-mail.
    tracing::info!(
        user_id,
        challenge_id = challenge.id,
        code = %otp.code,
        "One-time passcode issued",
    );

    Ok(OtpChallengeResponse {
        otp_required: true,
        challenge_id: challenge.id,
        expires_at: challenge.expires_at,
        code: state.config.otp_expose_code.then_some(otp.code),
    })
}

/// Start a new session for `user` and build the token response.
pub(crate) async fn create_auth_response(
    state: &AppState,
    user: &User,
    role: &str,
) -> AppResult<AuthResponse> {
    let (refresh_plaintext, refresh_hash) = generate_refresh_token();
    SessionRepo::create(&state.pool, user.id, &refresh_hash, refresh_expiry(state)).await?;
    build_auth_response(state, user, role, refresh_plaintext)
}

fn build_auth_response(
    state: &AppState,
    user: &User,
    role: &str,
    refresh_token: String,
) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: UserResponse::from_user(user, role),
    })
}

fn refresh_expiry(state: &AppState) -> Timestamp {
    Utc::now() + chrono::Duration::days(state.config.jwt.refresh_token_expiry_days)
}

fn invalid_session() -> AppError {
    AppError::Core(CoreError::Unauthorized(
        "Sitzung ungültig oder abgelaufen".into(),
    ))
}
