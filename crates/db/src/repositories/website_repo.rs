//! Repository for the `websites` table.

use shopforge_core::sections::Section;
use shopforge_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::website::{CreateWebsite, UpdateWebsite, Website};

const COLUMNS: &str = "id, owner_id, name, slug, sections, is_published, published_at, \
                       created_at, updated_at";

pub struct WebsiteRepo;

impl WebsiteRepo {
    /// Create a website seeded with `sections`.
    pub async fn create(
        pool: &PgPool,
        owner_id: DbId,
        input: &CreateWebsite,
        sections: &[Section],
    ) -> Result<Website, sqlx::Error> {
        let query = format!(
            "INSERT INTO websites (owner_id, name, slug, sections)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Website>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(Json(sections))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Website>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM websites WHERE id = $1");
        sqlx::query_as::<_, Website>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Public lookup: only published sites are visible.
    pub async fn find_published_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<Website>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM websites WHERE slug = $1 AND is_published = true");
        sqlx::query_as::<_, Website>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Website>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM websites
             WHERE owner_id = $1
             ORDER BY updated_at DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Website>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateWebsite,
    ) -> Result<Option<Website>, sqlx::Error> {
        let query = format!(
            "UPDATE websites SET
                name = COALESCE($2, name),
                slug = COALESCE($3, slug)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Website>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_optional(pool)
            .await
    }

    /// Persist the section document.
    pub async fn save_sections(
        pool: &PgPool,
        id: DbId,
        sections: &[Section],
    ) -> Result<Option<Website>, sqlx::Error> {
        let query = format!("UPDATE websites SET sections = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Website>(&query)
            .bind(id)
            .bind(Json(sections))
            .fetch_optional(pool)
            .await
    }

    /// Toggle publication. `published_at` keeps the time of the latest publish.
    pub async fn set_published(
        pool: &PgPool,
        id: DbId,
        published: bool,
    ) -> Result<Option<Website>, sqlx::Error> {
        let query = format!(
            "UPDATE websites SET
                is_published = $2,
                published_at = CASE WHEN $2 THEN NOW() ELSE published_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Website>(&query)
            .bind(id)
            .bind(published)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM websites WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
