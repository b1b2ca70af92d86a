use serde::Serialize;
use shopforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `media_assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MediaAsset {
    pub id: DbId,
    pub owner_id: DbId,
    pub file_name: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub content_type: String,
    pub kind: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub alt_text: String,
    pub created_at: Timestamp,
}

#[derive(Debug)]
pub struct CreateMediaAsset {
    pub owner_id: DbId,
    pub file_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub kind: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub alt_text: String,
}
