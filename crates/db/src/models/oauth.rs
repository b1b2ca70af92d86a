use serde::Serialize;
use shopforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// Link between a local user and an external OAuth account.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OAuthIdentity {
    pub id: DbId,
    pub user_id: DbId,
    pub provider: String,
    pub subject: String,
    pub created_at: Timestamp,
}
