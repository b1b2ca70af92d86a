//! OAuth provider definitions and profile normalisation.
//!
//! The HTTP exchange lives in the API crate; this module only knows the
//! provider endpoints, the `state` payload format and how to turn each
//! provider's user JSON into an [`OAuthProfile`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;

/// Seconds an issued `state` value stays valid.
pub const OAUTH_STATE_TTL_SECS: i64 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthProvider {
    Discord,
    Github,
}

impl OAuthProvider {
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            "discord" => Ok(Self::Discord),
            "github" => Ok(Self::Github),
            other => Err(CoreError::Validation(format!(
                "Unbekannter Anmeldeanbieter '{other}'"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discord => "discord",
            Self::Github => "github",
        }
    }

    pub fn authorize_url(self) -> &'static str {
        match self {
            Self::Discord => "https://discord.com/oauth2/authorize",
            Self::Github => "https://github.com/login/oauth/authorize",
        }
    }

    pub fn token_url(self) -> &'static str {
        match self {
            Self::Discord => "https://discord.com/api/oauth2/token",
            Self::Github => "https://github.com/login/oauth/access_token",
        }
    }

    pub fn profile_url(self) -> &'static str {
        match self {
            Self::Discord => "https://discord.com/api/users/@me",
            Self::Github => "https://api.github.com/user",
        }
    }

    pub fn scopes(self) -> &'static str {
        match self {
            Self::Discord => "identify email",
            Self::Github => "read:user user:email",
        }
    }

    /// Payload signed into the `state` parameter.
    pub fn state_payload(self, nonce: &str) -> String {
        format!("oauth:{}:{nonce}", self.as_str())
    }

    /// Check that a verified `state` payload was issued for this provider.
    pub fn check_state_payload(self, payload: &str) -> Result<(), CoreError> {
        let prefix = format!("oauth:{}:", self.as_str());
        if payload.starts_with(&prefix) {
            Ok(())
        } else {
            Err(CoreError::Unauthorized(
                "Ungültiger Anmeldestatus".to_string(),
            ))
        }
    }
}

/// Provider-independent view of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    /// Stable account id at the provider.
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
}

impl OAuthProfile {
    /// Normalise the provider's user JSON.
    pub fn from_provider_json(provider: OAuthProvider, json: &Value) -> Result<Self, CoreError> {
        let missing = |field: &str| {
            CoreError::Internal(format!(
                "{} profile response is missing '{field}'",
                provider.as_str()
            ))
        };
        let str_field = |field: &str| json.get(field).and_then(Value::as_str).map(str::to_string);

        let subject = match json.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err(missing("id")),
        };

        let (display_name, email) = match provider {
            OAuthProvider::Discord => {
                let name = str_field("global_name")
                    .or_else(|| str_field("username"))
                    .ok_or_else(|| missing("username"))?;
                let verified = json
                    .get("verified")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                (name, str_field("email").filter(|_| verified))
            }
            OAuthProvider::Github => {
                let name = str_field("name")
                    .or_else(|| str_field("login"))
                    .ok_or_else(|| missing("login"))?;
                (name, str_field("email"))
            }
        };

        Ok(Self {
            provider,
            subject,
            display_name,
            email: email.map(|e| e.trim().to_lowercase()),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn provider_names() {
        assert_eq!(OAuthProvider::from_name("discord").unwrap(), OAuthProvider::Discord);
        assert_eq!(OAuthProvider::from_name("github").unwrap(), OAuthProvider::Github);
        assert!(OAuthProvider::from_name("myspace").is_err());
    }

    #[test]
    fn state_payload_is_bound_to_provider() {
        let payload = OAuthProvider::Discord.state_payload("abc");
        assert!(OAuthProvider::Discord.check_state_payload(&payload).is_ok());
        assert!(OAuthProvider::Github.check_state_payload(&payload).is_err());
    }

    #[test]
    fn discord_profile_uses_global_name_and_verified_email() {
        let json = json!({
            "id": "80351110224678912",
            "username": "nelly",
            "global_name": "Nelly",
            "email": "Nelly@Example.com",
            "verified": true
        });
        let profile = OAuthProfile::from_provider_json(OAuthProvider::Discord, &json).unwrap();
        assert_eq!(profile.subject, "80351110224678912");
        assert_eq!(profile.display_name, "Nelly");
        assert_eq!(profile.email.as_deref(), Some("nelly@example.com"));
    }

    #[test]
    fn discord_unverified_email_is_dropped() {
        let json = json!({ "id": "1", "username": "x", "email": "x@y.de", "verified": false });
        let profile = OAuthProfile::from_provider_json(OAuthProvider::Discord, &json).unwrap();
        assert!(profile.email.is_none());
    }

    #[test]
    fn github_profile_accepts_numeric_id() {
        let json = json!({ "id": 583231, "login": "octocat", "name": null, "email": null });
        let profile = OAuthProfile::from_provider_json(OAuthProvider::Github, &json).unwrap();
        assert_eq!(profile.subject, "583231");
        assert_eq!(profile.display_name, "octocat");
        assert!(profile.email.is_none());
    }

    #[test]
    fn missing_id_is_an_error() {
        let json = json!({ "login": "octocat" });
        assert!(OAuthProfile::from_provider_json(OAuthProvider::Github, &json).is_err());
    }
}
