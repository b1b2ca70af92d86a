//! Repository for the `users` table.

use shopforge_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "id, email, display_name, password_hash, role_id, is_active, \
                       two_factor_enabled, last_login_at, failed_login_count, locked_until, \
                       created_at, updated_at";

/// Accounts, login bookkeeping and the 2FA flag.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (email, display_name, password_hash, role_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.email)
            .bind(&input.display_name)
            .bind(&input.password_hash)
            .bind(input.role_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by (already lower-cased) email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Count a failed password attempt in one statement. Once the counter
    /// reaches `max_attempts` the account is locked until `lock_until` and the
    /// counter starts over. Returns the lock time if this attempt set one.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        max_attempts: i32,
        lock_until: Timestamp,
    ) -> Result<Option<Timestamp>, sqlx::Error> {
        let locked: Option<(Option<Timestamp>,)> = sqlx::query_as(
            "UPDATE users SET
                failed_login_count = CASE
                    WHEN failed_login_count + 1 >= $2 THEN 0
                    ELSE failed_login_count + 1
                END,
                locked_until = CASE
                    WHEN failed_login_count + 1 >= $2 THEN $3
                    ELSE locked_until
                END
             WHERE id = $1
             RETURNING CASE WHEN locked_until = $3 THEN locked_until END",
        )
        .bind(id)
        .bind(max_attempts)
        .bind(lock_until)
        .fetch_optional(pool)
        .await?;
        Ok(locked.and_then(|(until,)| until))
    }

    /// Reset the failure counter, clear any lock and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET
                failed_login_count = 0,
                locked_until = NULL,
                last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Turn two-factor login on or off. Returns `true` if the row was updated.
    pub async fn set_two_factor(
        pool: &PgPool,
        id: DbId,
        enabled: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET two_factor_enabled = $2 WHERE id = $1")
            .bind(id)
            .bind(enabled)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
