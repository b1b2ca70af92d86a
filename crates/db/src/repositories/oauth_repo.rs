//! Repository for the `oauth_identities` table.

use shopforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::oauth::OAuthIdentity;

const COLUMNS: &str = "id, user_id, provider, subject, created_at";

pub struct OAuthIdentityRepo;

impl OAuthIdentityRepo {
    pub async fn find(
        pool: &PgPool,
        provider: &str,
        subject: &str,
    ) -> Result<Option<OAuthIdentity>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM oauth_identities WHERE provider = $1 AND subject = $2");
        sqlx::query_as::<_, OAuthIdentity>(&query)
            .bind(provider)
            .bind(subject)
            .fetch_optional(pool)
            .await
    }

    pub async fn link(
        pool: &PgPool,
        user_id: DbId,
        provider: &str,
        subject: &str,
    ) -> Result<OAuthIdentity, sqlx::Error> {
        let query = format!(
            "INSERT INTO oauth_identities (user_id, provider, subject)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OAuthIdentity>(&query)
            .bind(user_id)
            .bind(provider)
            .bind(subject)
            .fetch_one(pool)
            .await
    }

    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<OAuthIdentity>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM oauth_identities WHERE user_id = $1 ORDER BY created_at"
        );
        sqlx::query_as::<_, OAuthIdentity>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }
}
