//! Refresh-token sessions in `user_sessions`.

use shopforge_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::UserSession;

const COLUMNS: &str = "id, user_id, refresh_token_hash, rotated_from, expires_at, revoked_at, created_at";

pub struct SessionRepo;

impl SessionRepo {
    /// Start a session for a fresh sign-in.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        refresh_token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<UserSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .bind(refresh_token_hash)
            .bind(expires_at)
            .fetch_one(pool)
            .await
    }

    /// Look a session up by token hash, revoked or not.
    pub async fn find_by_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE refresh_token_hash = $1");
        sqlx::query_as::<_, UserSession>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// Revoke `old_id` and insert its successor in one transaction.
    ///
    /// Returns `None` when `old_id` was already revoked, i.e. another request
    /// rotated it first.
    pub async fn rotate(
        pool: &PgPool,
        old_id: DbId,
        new_token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let user_id: Option<DbId> = sqlx::query_scalar(
            "UPDATE user_sessions SET revoked_at = NOW()
             WHERE id = $1 AND revoked_at IS NULL
             RETURNING user_id",
        )
        .bind(old_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(user_id) = user_id else {
            return Ok(None);
        };

        let query = format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, rotated_from, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .bind(new_token_hash)
            .bind(old_id)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(session))
    }

    /// Revoke every open session of a user. Returns how many were open.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW()
             WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
