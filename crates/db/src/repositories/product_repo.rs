//! Repository for the `products` table.

use shopforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::product::{CreateProduct, Product, UpdateProduct};

const COLUMNS: &str = "id, slug, name, description, price_cents, currency, kind, script_id, \
                       is_active, created_at, updated_at";

pub struct ProductRepo;

impl ProductRepo {
    pub async fn create(pool: &PgPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (slug, name, description, price_cents, kind, script_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.slug)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price_cents)
            .bind(&input.kind)
            .bind(input.script_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE slug = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Fetch several active products at once (cart resolution).
    pub async fn find_active_by_ids(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<Product>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM products WHERE id = ANY($1) AND is_active = true");
        sqlx::query_as::<_, Product>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM products
             WHERE ($1 OR is_active = true)
             ORDER BY name
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(include_inactive)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Apply the non-`None` fields of `input`. Returns `None` if no such row.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, sqlx::Error> {
        let query = format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price_cents = COALESCE($4, price_cents),
                is_active = COALESCE($5, is_active)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price_cents)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }
}
