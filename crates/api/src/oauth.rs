//! Outbound OAuth calls: authorise URL, code exchange and profile fetch.

use chrono::Utc;
use rand::RngCore;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use shopforge_core::crypto::{sign_token, verify_token};
use shopforge_core::error::CoreError;
use shopforge_core::oauth::{OAuthProfile, OAuthProvider, OAUTH_STATE_TTL_SECS};

use crate::config::OAuthClientConfig;
use crate::error::{AppError, AppResult};

const CLIENT_USER_AGENT: &str = concat!("shopforge/", env!("CARGO_PKG_VERSION"));

/// Build the provider's authorise URL with a signed, expiring `state`.
pub fn authorize_url(
    provider: OAuthProvider,
    client: &OAuthClientConfig,
    secret: &str,
) -> AppResult<(String, String)> {
    let mut nonce = [0u8; 16];
    rand::rng().fill_bytes(&mut nonce);
    let expires_at = Utc::now().timestamp() + OAUTH_STATE_TTL_SECS;
    let state = sign_token(secret, &provider.state_payload(&hex::encode(nonce)), expires_at);

    let url = Url::parse_with_params(
        provider.authorize_url(),
        &[
            ("client_id", client.client_id.as_str()),
            ("redirect_uri", client.redirect_url.as_str()),
            ("response_type", "code"),
            ("scope", provider.scopes()),
            ("state", state.as_str()),
        ],
    )
    .map_err(|e| AppError::InternalError(format!("Invalid OAuth authorize URL: {e}")))?;

    Ok((url.to_string(), state))
}

/// Check a returned `state` value: signature, expiry and provider binding.
pub fn verify_state(provider: OAuthProvider, state: &str, secret: &str) -> AppResult<()> {
    let payload = verify_token(secret, state, Utc::now().timestamp())?;
    provider.check_state_payload(&payload)?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Exchange an authorisation code for an access token.
pub async fn exchange_code(
    http: &reqwest::Client,
    provider: OAuthProvider,
    client: &OAuthClientConfig,
    code: &str,
) -> AppResult<String> {
    let response = http
        .post(provider.token_url())
        .header(ACCEPT, "application/json")
        .header(USER_AGENT, CLIENT_USER_AGENT)
        .form(&[
            ("client_id", client.client_id.as_str()),
            ("client_secret", client.client_secret.as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", client.redirect_url.as_str()),
        ])
        .send()
        .await
        .map_err(|e| upstream_error(provider, "token request", e))?;

    let status = response.status();
    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| upstream_error(provider, "token response", e))?;

    match body.access_token {
        Some(token) if status.is_success() => Ok(token),
        _ => {
            tracing::warn!(
                provider = provider.as_str(),
                %status,
                error = body.error.as_deref().unwrap_or("none"),
                "OAuth code exchange rejected",
            );
            Err(AppError::Core(CoreError::Unauthorized(
                "Die Anmeldung beim Anbieter ist fehlgeschlagen".into(),
            )))
        }
    }
}

/// Fetch and normalise the signed-in account's profile.
pub async fn fetch_profile(
    http: &reqwest::Client,
    provider: OAuthProvider,
    access_token: &str,
) -> AppResult<OAuthProfile> {
    let json: Value = get_json(http, provider, provider.profile_url(), access_token).await?;
    let mut profile = OAuthProfile::from_provider_json(provider, &json)?;

    // GitHub hides private addresses from /user.
    if provider == OAuthProvider::Github && profile.email.is_none() {
        let emails: Value = get_json(
            http,
            provider,
            "https://api.github.com/user/emails",
            access_token,
        )
        .await?;
        profile.email = primary_verified_email(&emails);
    }
    Ok(profile)
}

async fn get_json(
    http: &reqwest::Client,
    provider: OAuthProvider,
    url: &str,
    access_token: &str,
) -> AppResult<Value> {
    let response = http
        .get(url)
        .bearer_auth(access_token)
        .header(ACCEPT, "application/json")
        .header(USER_AGENT, CLIENT_USER_AGENT)
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(|e| upstream_error(provider, "profile request", e))?;

    response
        .json()
        .await
        .map_err(|e| upstream_error(provider, "profile response", e))
}

fn primary_verified_email(emails: &Value) -> Option<String> {
    emails.as_array()?.iter().find_map(|entry| {
        let primary = entry.get("primary").and_then(Value::as_bool).unwrap_or(false);
        let verified = entry.get("verified").and_then(Value::as_bool).unwrap_or(false);
        entry
            .get("email")
            .and_then(Value::as_str)
            .filter(|_| primary && verified)
            .map(|e| e.trim().to_lowercase())
    })
}

fn upstream_error(provider: OAuthProvider, stage: &str, err: reqwest::Error) -> AppError {
    tracing::error!(provider = provider.as_str(), stage, error = %err, "OAuth provider call failed");
    AppError::Core(CoreError::Unauthorized(
        "Der Anmeldeanbieter ist nicht erreichbar".into(),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client() -> OAuthClientConfig {
        OAuthClientConfig {
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            redirect_url: "http://localhost:5173/auth/callback/discord".to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_client_and_state() {
        let (url, state) = authorize_url(OAuthProvider::Discord, &client(), "s3cret").unwrap();
        let parsed = Url::parse(&url).unwrap();
        assert_eq!(parsed.host_str(), Some("discord.com"));
        let params: std::collections::HashMap<_, _> = parsed.query_pairs().into_owned().collect();
        assert_eq!(params["client_id"], "cid");
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["state"], state);
        assert!(verify_state(OAuthProvider::Discord, &state, "s3cret").is_ok());
    }

    #[test]
    fn state_is_bound_to_provider_and_secret() {
        let (_, state) = authorize_url(OAuthProvider::Discord, &client(), "s3cret").unwrap();
        assert!(verify_state(OAuthProvider::Github, &state, "s3cret").is_err());
        assert!(verify_state(OAuthProvider::Discord, &state, "other").is_err());
    }

    #[test]
    fn picks_primary_verified_github_email() {
        let emails = json!([
            { "email": "old@example.com", "primary": false, "verified": true },
            { "email": "Main@Example.com", "primary": true, "verified": true }
        ]);
        assert_eq!(primary_verified_email(&emails).as_deref(), Some("main@example.com"));
        let unverified = json!([{ "email": "a@b.de", "primary": true, "verified": false }]);
        assert!(primary_verified_email(&unverified).is_none());
    }
}
