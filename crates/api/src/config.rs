use std::path::PathBuf;

use shopforge_core::oauth::OAuthProvider;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the secrets have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for in-flight requests to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Root directory of the local object store (default: `./storage`).
    pub storage_root: PathBuf,
    /// HMAC secret for download links and OAuth `state` values.
    pub download_token_secret: String,
    /// Echo generated OTP codes in API responses (development only).
    pub otp_expose_code: bool,
    /// Externally reachable base URL, used to build download links.
    pub public_base_url: String,
    pub oauth: OAuthSettings,
}

/// Client credentials for each configured OAuth provider.
#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub discord: Option<OAuthClientConfig>,
    pub github: Option<OAuthClientConfig>,
}

#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl OAuthSettings {
    /// Read `OAUTH_<PROVIDER>_CLIENT_ID`, `_CLIENT_SECRET` and `_REDIRECT_URL`.
    ///
    /// A provider is enabled only when all three are set.
    pub fn from_env() -> Self {
        Self {
            discord: OAuthClientConfig::from_env("DISCORD"),
            github: OAuthClientConfig::from_env("GITHUB"),
        }
    }

    pub fn client(&self, provider: OAuthProvider) -> Option<&OAuthClientConfig> {
        match provider {
            OAuthProvider::Discord => self.discord.as_ref(),
            OAuthProvider::Github => self.github.as_ref(),
        }
    }
}

impl OAuthClientConfig {
    fn from_env(prefix: &str) -> Option<Self> {
        let var = |name: &str| {
            std::env::var(format!("OAUTH_{prefix}_{name}"))
                .ok()
                .filter(|v| !v.is_empty())
        };
        Some(Self {
            client_id: var("CLIENT_ID")?,
            client_secret: var("CLIENT_SECRET")?,
            redirect_url: var("REDIRECT_URL")?,
        })
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `HOST`                  | `0.0.0.0`                |
    /// | `PORT`                  | `3000`                   |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                     |
    /// | `STORAGE_ROOT`          | `./storage`              |
    /// | `DOWNLOAD_TOKEN_SECRET` | required                 |
    /// | `OTP_EXPOSE_CODE`       | `false`                  |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:3000`  |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values or a missing secret, so misconfiguration
    /// stops the server at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let storage_root =
            PathBuf::from(std::env::var("STORAGE_ROOT").unwrap_or_else(|_| "./storage".into()));

        let download_token_secret = std::env::var("DOWNLOAD_TOKEN_SECRET")
            .expect("DOWNLOAD_TOKEN_SECRET must be set in the environment");
        assert!(
            !download_token_secret.is_empty(),
            "DOWNLOAD_TOKEN_SECRET must not be empty"
        );

        let otp_expose_code = std::env::var("OTP_EXPOSE_CODE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            storage_root,
            download_token_secret,
            otp_expose_code,
            public_base_url,
            oauth: OAuthSettings::from_env(),
        }
    }
}
