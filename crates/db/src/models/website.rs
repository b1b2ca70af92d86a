//! Website document model.

use serde::{Deserialize, Serialize};
use shopforge_core::sections::Section;
use shopforge_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `websites` table. `sections` is the ordered JSONB document.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Website {
    pub id: DbId,
    pub owner_id: DbId,
    pub name: String,
    pub slug: String,
    pub sections: Json<Vec<Section>>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateWebsite {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateWebsite {
    pub name: Option<String>,
    pub slug: Option<String>,
}
