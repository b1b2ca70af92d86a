//! Repository for the `otp_challenges` table.

use shopforge_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::otp::OtpChallenge;

const COLUMNS: &str = "id, user_id, code_hash, expires_at, attempts, consumed_at, created_at";

pub struct OtpRepo;

impl OtpRepo {
    /// Issue a new challenge, consuming any still-open ones for the user.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        code_hash: &str,
        expires_at: Timestamp,
    ) -> Result<OtpChallenge, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query(
            "UPDATE otp_challenges SET consumed_at = NOW()
             WHERE user_id = $1 AND consumed_at IS NULL",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO otp_challenges (user_id, code_hash, expires_at)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        let challenge = sqlx::query_as::<_, OtpChallenge>(&query)
            .bind(user_id)
            .bind(code_hash)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(challenge)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<OtpChallenge>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM otp_challenges WHERE id = $1");
        sqlx::query_as::<_, OtpChallenge>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn record_failed_attempt(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE otp_challenges SET attempts = attempts + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a challenge used. Returns `false` if it had already been consumed.
    pub async fn consume(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE otp_challenges SET consumed_at = NOW()
             WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
