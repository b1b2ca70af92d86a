//! Website-builder editing sessions.
//!
//! An [`EditorSession`] wraps a [`LinearHistory`] of section documents for
//! one user editing one website. [`EditorSessions`] is the registry kept in
//! the API state; each session is only ever touched under its lock.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::CoreError;
use crate::history::{LinearHistory, DEFAULT_HISTORY_LIMIT};
use crate::sections::{self, Section, SectionKind};
use crate::types::{DbId, Timestamp};

/// Sessions untouched for this long are dropped on the next registry access.
pub const EDITOR_SESSION_IDLE_MINS: u64 = 60;

/// One editing step requested by the builder UI.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditorOp {
    Add {
        kind: SectionKind,
        #[serde(default)]
        index: Option<usize>,
    },
    Remove {
        id: Uuid,
    },
    Move {
        id: Uuid,
        to_index: usize,
    },
    Update {
        id: Uuid,
        content: Value,
    },
    Duplicate {
        id: Uuid,
    },
    /// Replace the whole document (e.g. after a drag-and-drop batch).
    Replace {
        sections: Vec<Section>,
    },
}

/// Editor state returned to the UI after every operation.
#[derive(Debug, Clone, Serialize)]
pub struct EditorState {
    pub website_id: DbId,
    pub sections: Vec<Section>,
    pub can_undo: bool,
    pub can_redo: bool,
    pub position: usize,
    pub history_len: usize,
    pub dirty: bool,
    pub updated_at: Timestamp,
}

#[derive(Debug)]
pub struct EditorSession {
    website_id: DbId,
    history: LinearHistory<Vec<Section>>,
    saved: Vec<Section>,
    last_touched: Instant,
}

impl EditorSession {
    /// Open a session seeded with the persisted document.
    pub fn open(website_id: DbId, persisted: Vec<Section>) -> Self {
        Self {
            website_id,
            history: LinearHistory::with_limit(persisted.clone(), DEFAULT_HISTORY_LIMIT),
            saved: persisted,
            last_touched: Instant::now(),
        }
    }

    pub fn website_id(&self) -> DbId {
        self.website_id
    }

    pub fn sections(&self) -> &[Section] {
        self.history.current()
    }

    /// Apply `op` to the current document and commit the result.
    pub fn apply(&mut self, op: EditorOp) -> Result<EditorState, CoreError> {
        let current = self.history.current();
        let next = match op {
            EditorOp::Add { kind, index } => {
                sections::insert_section(current, Section::from_template(kind), index)?
            }
            EditorOp::Remove { id } => sections::remove_section(current, id)?,
            EditorOp::Move { id, to_index } => sections::move_section(current, id, to_index)?,
            EditorOp::Update { id, content } => {
                sections::update_section_content(current, id, &content)?
            }
            EditorOp::Duplicate { id } => sections::duplicate_section(current, id)?,
            EditorOp::Replace { sections: doc } => {
                sections::validate_document(&doc)?;
                doc
            }
        };
        self.history.commit(next);
        Ok(self.snapshot())
    }

    pub fn undo(&mut self) -> EditorState {
        self.history.undo();
        self.snapshot()
    }

    pub fn redo(&mut self) -> EditorState {
        self.history.redo();
        self.snapshot()
    }

    /// Drop all history, keeping the current document as the only entry.
    pub fn reset(&mut self) -> EditorState {
        let current = self.history.current().clone();
        self.history.reset(current);
        self.snapshot()
    }

    /// Record that the current document has been persisted.
    pub fn mark_saved(&mut self) {
        self.saved = self.history.current().clone();
    }

    pub fn is_dirty(&self) -> bool {
        self.history.current() != &self.saved
    }

    pub fn snapshot(&self) -> EditorState {
        EditorState {
            website_id: self.website_id,
            sections: self.history.current().clone(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            position: self.history.position(),
            history_len: self.history.len(),
            dirty: self.is_dirty(),
            updated_at: self.history.current_entry().created_at(),
        }
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }
}

/// Registry of open editor sessions keyed by `(user_id, website_id)`.
#[derive(Debug)]
pub struct EditorSessions {
    sessions: Mutex<HashMap<(DbId, DbId), EditorSession>>,
    idle_timeout: Duration,
}

impl Default for EditorSessions {
    fn default() -> Self {
        Self::new(Duration::from_secs(EDITOR_SESSION_IDLE_MINS * 60))
    }
}

impl EditorSessions {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// Run `f` against the session for `(user_id, website_id)`.
    ///
    /// When no session is open, one is created from `load()`'s document.
    pub async fn with_session<R>(
        &self,
        user_id: DbId,
        website_id: DbId,
        load: impl FnOnce() -> Vec<Section>,
        f: impl FnOnce(&mut EditorSession) -> R,
    ) -> R {
        let mut sessions = self.sessions.lock().await;
        self.sweep_idle(&mut sessions);

        let session = sessions
            .entry((user_id, website_id))
            .or_insert_with(|| EditorSession::open(website_id, load()));
        session.touch();
        f(session)
    }

    /// Run `f` only if a session is already open.
    pub async fn with_existing<R>(
        &self,
        user_id: DbId,
        website_id: DbId,
        f: impl FnOnce(&mut EditorSession) -> R,
    ) -> Option<R> {
        let mut sessions = self.sessions.lock().await;
        self.sweep_idle(&mut sessions);

        sessions.get_mut(&(user_id, website_id)).map(|session| {
            session.touch();
            f(session)
        })
    }

    /// Close a session. Returns `true` if one was open.
    pub async fn close(&self, user_id: DbId, website_id: DbId) -> bool {
        self.sessions
            .lock()
            .await
            .remove(&(user_id, website_id))
            .is_some()
    }

    /// Close every session on a website (e.g. when it is deleted).
    pub async fn close_website(&self, website_id: DbId) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|(_, wid), _| *wid != website_id);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    fn sweep_idle(&self, sessions: &mut HashMap<(DbId, DbId), EditorSession>) {
        let timeout = self.idle_timeout;
        sessions.retain(|_, s| s.last_touched.elapsed() < timeout);
    }
}
