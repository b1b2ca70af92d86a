//! Repository for the `licenses` table.

use shopforge_core::scripts::generate_license_key;
use shopforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::script::{License, LicenseWithScript};

const COLUMNS: &str = "id, user_id, script_id, order_id, license_key, bound_ip, is_revoked, \
                       last_verified_at, created_at";

pub struct LicenseRepo;

impl LicenseRepo {
    /// Issue licences for every script product in a paid order.
    ///
    /// A user holds at most one licence per script; re-purchases keep the
    /// existing key. Returns the licences created by this call.
    pub async fn issue_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<License>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let targets: Vec<(DbId, DbId)> = sqlx::query_as(
            "SELECT DISTINCT o.user_id, p.script_id
             FROM orders o
             JOIN order_items oi ON oi.order_id = o.id
             JOIN products p ON p.id = oi.product_id
             WHERE o.id = $1 AND p.script_id IS NOT NULL",
        )
        .bind(order_id)
        .fetch_all(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO licenses (user_id, script_id, order_id, license_key)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, script_id) DO NOTHING
             RETURNING {COLUMNS}"
        );
        let mut issued = Vec::new();
        for (user_id, script_id) in targets {
            let row = sqlx::query_as::<_, License>(&query)
                .bind(user_id)
                .bind(script_id)
                .bind(order_id)
                .bind(generate_license_key())
                .fetch_optional(&mut *tx)
                .await?;
            match row {
                Some(license) => issued.push(license),
                None => tracing::debug!(user_id, script_id, "Licence already held, keeping existing key"),
            }
        }

        tx.commit().await?;
        Ok(issued)
    }

    /// Grant a licence by hand (admin). Fails on `uq_licenses_user_script`.
    pub async fn grant(pool: &PgPool, user_id: DbId, script_id: DbId) -> Result<License, sqlx::Error> {
        let query = format!(
            "INSERT INTO licenses (user_id, script_id, license_key)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, License>(&query)
            .bind(user_id)
            .bind(script_id)
            .bind(generate_license_key())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<License>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM licenses WHERE id = $1");
        sqlx::query_as::<_, License>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_for_user_script(
        pool: &PgPool,
        user_id: DbId,
        script_id: DbId,
    ) -> Result<Option<License>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM licenses WHERE user_id = $1 AND script_id = $2");
        sqlx::query_as::<_, License>(&query)
            .bind(user_id)
            .bind(script_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<License>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM licenses WHERE user_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, License>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    pub async fn list_for_script(
        pool: &PgPool,
        script_id: DbId,
    ) -> Result<Vec<License>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM licenses WHERE script_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, License>(&query)
            .bind(script_id)
            .fetch_all(pool)
            .await
    }

    /// Look up a key together with its script, for game-server verification.
    pub async fn find_with_script_by_key(
        pool: &PgPool,
        license_key: &str,
    ) -> Result<Option<LicenseWithScript>, sqlx::Error> {
        sqlx::query_as::<_, LicenseWithScript>(
            "SELECT l.id, l.license_key, l.bound_ip, l.is_revoked,
                    s.resource_name, s.is_active AS script_active
             FROM licenses l
             JOIN scripts s ON s.id = l.script_id
             WHERE l.license_key = $1",
        )
        .bind(license_key)
        .fetch_optional(pool)
        .await
    }

    /// Bind `server_ip` if the licence is unbound and stamp the check, in one
    /// statement. Returns `false` when another IP holds the binding, which
    /// includes losing a race against a concurrent first verification.
    pub async fn bind_verified_ip(
        pool: &PgPool,
        id: DbId,
        server_ip: &str,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as(
            "UPDATE licenses SET
                bound_ip = COALESCE(bound_ip, $2),
                last_verified_at = NOW()
             WHERE id = $1 AND (bound_ip IS NULL OR bound_ip = $2)
             RETURNING id",
        )
        .bind(id)
        .bind(server_ip)
        .fetch_optional(pool)
        .await?;
        Ok(row.is_some())
    }

    pub async fn set_revoked(
        pool: &PgPool,
        id: DbId,
        revoked: bool,
    ) -> Result<Option<License>, sqlx::Error> {
        let query = format!("UPDATE licenses SET is_revoked = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, License>(&query)
            .bind(id)
            .bind(revoked)
            .fetch_optional(pool)
            .await
    }

    /// Clear the bound server IP so the key can move to another server.
    pub async fn reset_ip(pool: &PgPool, id: DbId) -> Result<Option<License>, sqlx::Error> {
        let query = format!("UPDATE licenses SET bound_ip = NULL WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, License>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
