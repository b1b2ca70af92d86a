//! Script, script version and licence models.

use serde::{Deserialize, Serialize};
use shopforge_core::types::{DbId, Timestamp};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Script {
    pub id: DbId,
    pub resource_name: String,
    pub title: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Deserialize)]
pub struct CreateScript {
    pub resource_name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateScript {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ScriptVersionRow {
    pub id: DbId,
    pub script_id: DbId,
    pub version: String,
    pub version_major: i32,
    pub version_minor: i32,
    pub version_patch: i32,
    pub changelog: String,
    #[serde(skip_serializing)]
    pub storage_key: String,
    pub checksum_sha256: String,
    pub size_bytes: i64,
    pub created_at: Timestamp,
}

impl ScriptVersionRow {
    pub fn parsed(&self) -> shopforge_core::scripts::ScriptVersion {
        shopforge_core::scripts::ScriptVersion {
            major: self.version_major.max(0) as u32,
            minor: self.version_minor.max(0) as u32,
            patch: self.version_patch.max(0) as u32,
        }
    }
}

#[derive(Debug)]
pub struct CreateScriptVersion {
    pub script_id: DbId,
    pub version: shopforge_core::scripts::ScriptVersion,
    pub changelog: String,
    pub storage_key: String,
    pub checksum_sha256: String,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct License {
    pub id: DbId,
    pub user_id: DbId,
    pub script_id: DbId,
    pub order_id: Option<DbId>,
    pub license_key: String,
    pub bound_ip: Option<String>,
    pub is_revoked: bool,
    pub last_verified_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// Licence joined with what a game-server verification needs.
#[derive(Debug, Clone, FromRow)]
pub struct LicenseWithScript {
    pub id: DbId,
    pub license_key: String,
    pub bound_ip: Option<String>,
    pub is_revoked: bool,
    pub resource_name: String,
    pub script_active: bool,
}
