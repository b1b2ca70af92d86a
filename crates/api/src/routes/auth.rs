//! Route definitions for `/auth`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, oauth};
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register                    -> register
/// POST /login                       -> login (tokens or OTP challenge)
/// POST /otp/verify                  -> verify_otp_code
/// POST /refresh                     -> refresh
/// POST /logout                      -> logout (requires auth)
/// GET  /me                          -> me (requires auth)
/// POST /2fa/enable                  -> enable_two_factor (requires auth)
/// POST /2fa/disable                 -> disable_two_factor (requires auth)
/// GET  /oauth/{provider}/start      -> oauth::start
/// POST /oauth/{provider}/callback   -> oauth::callback
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/otp/verify", post(auth::verify_otp_code))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/2fa/enable", post(auth::enable_two_factor))
        .route("/2fa/disable", post(auth::disable_two_factor))
        .route("/oauth/{provider}/start", get(oauth::start))
        .route("/oauth/{provider}/callback", post(oauth::callback))
}
