use std::sync::Arc;

use shopforge_core::editor::EditorSessions;
use shopforge_core::storage::ObjectStore;

use crate::config::ServerConfig;

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheap to clone: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    pub pool: shopforge_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Media files and script archives.
    pub store: Arc<dyn ObjectStore>,
    /// Open website-builder sessions with their undo/redo history.
    pub editor_sessions: Arc<EditorSessions>,
    /// Outbound client for OAuth code exchange.
    pub http: reqwest::Client,
}
