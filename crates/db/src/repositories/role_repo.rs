//! Repository for the `roles` lookup table.

use shopforge_core::types::DbId;
use sqlx::PgPool;

pub struct RoleRepo;

impl RoleRepo {
    /// Resolve a role id to its name.
    pub async fn resolve_name(pool: &PgPool, role_id: DbId) -> Result<String, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT name FROM roles WHERE id = $1")
            .bind(role_id)
            .fetch_one(pool)
            .await
    }

    /// Resolve a role name to its id.
    pub async fn find_id_by_name(pool: &PgPool, name: &str) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>("SELECT id FROM roles WHERE name = $1")
            .bind(name)
            .fetch_one(pool)
            .await
    }
}
