use shopforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A pending two-factor login challenge.
#[derive(Debug, Clone, FromRow)]
pub struct OtpChallenge {
    pub id: DbId,
    pub user_id: DbId,
    pub code_hash: String,
    pub expires_at: Timestamp,
    pub attempts: i32,
    pub consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}
