//! Repository for the `media_assets` table.

use shopforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::media::{CreateMediaAsset, MediaAsset};

const COLUMNS: &str = "id, owner_id, file_name, storage_key, content_type, kind, size_bytes, \
                       width, height, alt_text, created_at";

pub struct MediaRepo;

impl MediaRepo {
    pub async fn create(pool: &PgPool, input: &CreateMediaAsset) -> Result<MediaAsset, sqlx::Error> {
        let query = format!(
            "INSERT INTO media_assets
                (owner_id, file_name, storage_key, content_type, kind, size_bytes,
                 width, height, alt_text)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(input.owner_id)
            .bind(&input.file_name)
            .bind(&input.storage_key)
            .bind(&input.content_type)
            .bind(&input.kind)
            .bind(input.size_bytes)
            .bind(input.width)
            .bind(input.height)
            .bind(&input.alt_text)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MediaAsset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM media_assets WHERE id = $1");
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List an owner's assets, newest first, optionally filtered by kind.
    pub async fn list_for_owner(
        pool: &PgPool,
        owner_id: DbId,
        kind: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MediaAsset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM media_assets
             WHERE owner_id = $1 AND ($2::TEXT IS NULL OR kind = $2)
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(owner_id)
            .bind(kind)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update_alt_text(
        pool: &PgPool,
        id: DbId,
        alt_text: &str,
    ) -> Result<Option<MediaAsset>, sqlx::Error> {
        let query = format!("UPDATE media_assets SET alt_text = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(id)
            .bind(alt_text)
            .fetch_optional(pool)
            .await
    }

    /// Delete the row and return it so the caller can remove the stored object.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<MediaAsset>, sqlx::Error> {
        let query = format!("DELETE FROM media_assets WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, MediaAsset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
