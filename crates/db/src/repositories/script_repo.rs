//! Repository for the `scripts` and `script_versions` tables.

use shopforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::script::{CreateScript, CreateScriptVersion, Script, ScriptVersionRow, UpdateScript};

const COLUMNS: &str = "id, resource_name, title, description, is_active, created_at, updated_at";

const VERSION_COLUMNS: &str = "id, script_id, version, version_major, version_minor, \
                               version_patch, changelog, storage_key, checksum_sha256, \
                               size_bytes, created_at";

pub struct ScriptRepo;

impl ScriptRepo {
    pub async fn create(pool: &PgPool, input: &CreateScript) -> Result<Script, sqlx::Error> {
        let query = format!(
            "INSERT INTO scripts (resource_name, title, description)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Script>(&query)
            .bind(&input.resource_name)
            .bind(&input.title)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Script>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scripts WHERE id = $1");
        sqlx::query_as::<_, Script>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Script>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scripts ORDER BY resource_name");
        sqlx::query_as::<_, Script>(&query).fetch_all(pool).await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateScript,
    ) -> Result<Option<Script>, sqlx::Error> {
        let query = format!(
            "UPDATE scripts SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Script>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    pub async fn create_version(
        pool: &PgPool,
        input: &CreateScriptVersion,
    ) -> Result<ScriptVersionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO script_versions
                (script_id, version, version_major, version_minor, version_patch,
                 changelog, storage_key, checksum_sha256, size_bytes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {VERSION_COLUMNS}"
        );
        sqlx::query_as::<_, ScriptVersionRow>(&query)
            .bind(input.script_id)
            .bind(input.version.to_string())
            .bind(to_i32(input.version.major))
            .bind(to_i32(input.version.minor))
            .bind(to_i32(input.version.patch))
            .bind(&input.changelog)
            .bind(&input.storage_key)
            .bind(&input.checksum_sha256)
            .bind(input.size_bytes)
            .fetch_one(pool)
            .await
    }

    /// Versions of a script, newest first.
    pub async fn list_versions(
        pool: &PgPool,
        script_id: DbId,
    ) -> Result<Vec<ScriptVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM script_versions
             WHERE script_id = $1
             ORDER BY version_major DESC, version_minor DESC, version_patch DESC"
        );
        sqlx::query_as::<_, ScriptVersionRow>(&query)
            .bind(script_id)
            .fetch_all(pool)
            .await
    }

    pub async fn latest_version(
        pool: &PgPool,
        script_id: DbId,
    ) -> Result<Option<ScriptVersionRow>, sqlx::Error> {
        let query = format!(
            "SELECT {VERSION_COLUMNS} FROM script_versions
             WHERE script_id = $1
             ORDER BY version_major DESC, version_minor DESC, version_patch DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, ScriptVersionRow>(&query)
            .bind(script_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_version(
        pool: &PgPool,
        version_id: DbId,
    ) -> Result<Option<ScriptVersionRow>, sqlx::Error> {
        let query = format!("SELECT {VERSION_COLUMNS} FROM script_versions WHERE id = $1");
        sqlx::query_as::<_, ScriptVersionRow>(&query)
            .bind(version_id)
            .fetch_optional(pool)
            .await
    }
}

fn to_i32(part: u32) -> i32 {
    i32::try_from(part).unwrap_or(i32::MAX)
}
