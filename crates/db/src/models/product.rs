//! Catalogue product model and DTOs.

use serde::{Deserialize, Serialize};
use shopforge_core::types::{Cents, DbId, Timestamp};
use sqlx::FromRow;

pub const PRODUCT_KIND_DIGITAL: &str = "digital";
pub const PRODUCT_KIND_SCRIPT: &str = "script";
pub const PRODUCT_KIND_SERVICE: &str = "service";

pub const VALID_PRODUCT_KINDS: &[&str] =
    &[PRODUCT_KIND_DIGITAL, PRODUCT_KIND_SCRIPT, PRODUCT_KIND_SERVICE];

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub price_cents: Cents,
    pub currency: String,
    pub kind: String,
    pub script_id: Option<DbId>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: Cents,
    pub kind: String,
    pub script_id: Option<DbId>,
}

/// All fields optional; only provided ones are applied.
#[derive(Debug, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<Cents>,
    pub is_active: Option<bool>,
}
