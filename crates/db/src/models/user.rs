//! Accounts. Customers and admins share one table and differ by `role_id`.

use serde::{Deserialize, Serialize};
use shopforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A `users` row. Not `Serialize`, since it carries the password hash
/// and lockout counters. Handlers answer with [`UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    pub password_hash: Option<String>,
    pub role_id: DbId,
    pub is_active: bool,
    pub two_factor_enabled: bool,
    pub last_login_at: Option<Timestamp>,
    pub failed_login_count: i32,
    pub locked_until: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// What `/auth/me` and the login responses show about an account.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub display_name: String,
    /// Resolved role name (`"admin"` or `"customer"`).
    pub role: String,
    pub two_factor_enabled: bool,
    pub has_password: bool,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl UserResponse {
    pub fn from_user(user: &User, role: &str) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            role: role.to_string(),
            two_factor_enabled: user.two_factor_enabled,
            has_password: user.password_hash.is_some(),
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Registration and OAuth sign-up. `password_hash` is `None` for accounts
/// that only ever log in through a provider.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub display_name: String,
    pub password_hash: Option<String>,
    pub role_id: DbId,
}
