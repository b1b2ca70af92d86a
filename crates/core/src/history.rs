//! Linear undo/redo history over immutable state snapshots.
//!
//! A [`LinearHistory`] always holds at least one entry. Entries after the
//! current position are the redo tail; committing a new state from a
//! non-tail position discards that tail (it is never merged back).

use chrono::Utc;
use serde::Serialize;

use crate::types::Timestamp;

/// Default number of entries kept by an editor session before the oldest
/// snapshots are dropped.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// One snapshot of application state plus the moment it was recorded.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry<T> {
    state: T,
    created_at: Timestamp,
}

impl<T> HistoryEntry<T> {
    fn new(state: T) -> Self {
        Self {
            state,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Ordered snapshots plus a cursor. Invariant: `position < entries.len()`.
#[derive(Debug, Clone)]
pub struct LinearHistory<T> {
    entries: Vec<HistoryEntry<T>>,
    position: usize,
    limit: Option<usize>,
}

impl<T> LinearHistory<T> {
    /// Create a history seeded with `initial` and no size limit.
    pub fn new(initial: T) -> Self {
        Self {
            entries: vec![HistoryEntry::new(initial)],
            position: 0,
            limit: None,
        }
    }

    /// Create a history that keeps at most `max_entries` snapshots.
    ///
    /// A limit of zero is treated as one: the current state is always kept.
    pub fn with_limit(initial: T, max_entries: usize) -> Self {
        Self {
            limit: Some(max_entries.max(1)),
            ..Self::new(initial)
        }
    }

    /// Record `state` as the newest entry.
    ///
    /// Drops every entry after the current position, appends the new one and
    /// moves the cursor to it. Oldest entries are evicted when over the limit.
    pub fn commit(&mut self, state: T) {
        self.entries.truncate(self.position + 1);
        self.entries.push(HistoryEntry::new(state));

        if let Some(limit) = self.limit {
            let overflow = self.entries.len().saturating_sub(limit);
            if overflow > 0 {
                self.entries.drain(..overflow);
            }
        }

        self.position = self.entries.len() - 1;
    }

    /// Step back one entry. Returns `None` (and changes nothing) at the start.
    pub fn undo(&mut self) -> Option<&T> {
        if self.position == 0 {
            return None;
        }
        self.position -= 1;
        Some(&self.entries[self.position].state)
    }

    /// Step forward one entry. Returns `None` (and changes nothing) at the tail.
    pub fn redo(&mut self) -> Option<&T> {
        if self.position + 1 >= self.entries.len() {
            return None;
        }
        self.position += 1;
        Some(&self.entries[self.position].state)
    }

    /// Collapse the history to a single entry holding `current`.
    pub fn reset(&mut self, current: T) {
        self.entries.clear();
        self.entries.push(HistoryEntry::new(current));
        self.position = 0;
    }

    pub fn current(&self) -> &T {
        &self.entries[self.position].state
    }

    pub fn current_entry(&self) -> &HistoryEntry<T> {
        &self.entries[self.position]
    }

    pub fn can_undo(&self) -> bool {
        self.position > 0
    }

    pub fn can_redo(&self) -> bool {
        self.position + 1 < self.entries.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false`; a history is never empty. Present for clippy's
    /// `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[HistoryEntry<T>] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn states(history: &LinearHistory<&'static str>) -> Vec<&'static str> {
        history.entries().iter().map(|e| *e.state()).collect()
    }

    #[test]
    fn new_history_has_single_entry() {
        let history = LinearHistory::new("A");
        assert_eq!(history.len(), 1);
        assert_eq!(history.position(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(*history.current(), "A");
    }

    #[test]
    fn commit_enables_undo_and_disables_redo() {
        let mut history = LinearHistory::new(0);
        for n in 1..=5 {
            history.commit(n);
            assert!(history.can_undo());
            assert!(!history.can_redo());
            assert_eq!(history.position(), n as usize);
        }
    }

    #[test]
    fn can_undo_tracks_position() {
        let mut history = LinearHistory::new(0);
        history.commit(1);
        history.commit(2);
        assert!(history.can_undo());
        history.undo();
        assert!(history.can_undo());
        history.undo();
        assert_eq!(history.position(), 0);
        assert!(!history.can_undo());
    }

    #[test]
    fn undo_then_redo_restores_state() {
        let mut history = LinearHistory::new("A");
        history.commit("B");
        history.commit("C");
        let before = *history.current();

        assert_eq!(history.undo(), Some(&"B"));
        assert_eq!(history.redo(), Some(&before));
        assert_eq!(*history.current(), before);
    }

    #[test]
    fn undo_at_start_is_noop() {
        let mut history = LinearHistory::new("A");
        assert_eq!(history.undo(), None);
        assert_eq!(history.position(), 0);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn redo_at_tail_is_noop() {
        let mut history = LinearHistory::new("A");
        history.commit("B");
        assert_eq!(history.redo(), None);
        assert_eq!(history.position(), 1);
    }

    #[test]
    fn commit_after_undo_discards_redo_tail() {
        let mut history = LinearHistory::new("A");
        history.commit("B");
        assert_eq!(history.undo(), Some(&"A"));
        assert_eq!(history.position(), 0);

        history.commit("C");
        assert_eq!(states(&history), vec!["A", "C"]);
        assert_eq!(history.position(), 1);
        assert!(!history.can_redo());

        assert_eq!(history.redo(), None);
        assert_eq!(states(&history), vec!["A", "C"]);
        assert_eq!(history.position(), 1);
    }

    #[test]
    fn reset_leaves_one_entry() {
        let mut history = LinearHistory::new("A");
        history.commit("B");
        history.commit("C");
        history.undo();

        history.reset("Z");
        assert_eq!(history.len(), 1);
        assert_eq!(*history.current(), "Z");
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_and_redo_do_not_touch_entries() {
        let mut history = LinearHistory::new("A");
        history.commit("B");
        let created = history.entries()[1].created_at();

        history.undo();
        history.redo();
        assert_eq!(states(&history), vec!["A", "B"]);
        assert_eq!(history.entries()[1].created_at(), created);
    }

    #[test]
    fn limit_evicts_oldest_and_keeps_position_at_tail() {
        let mut history = LinearHistory::with_limit(0, 3);
        for n in 1..=5 {
            history.commit(n);
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.position(), 2);
        assert_eq!(*history.current(), 5);

        assert_eq!(history.undo(), Some(&4));
        assert_eq!(history.undo(), Some(&3));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn zero_limit_keeps_current_state() {
        let mut history = LinearHistory::with_limit("A", 0);
        history.commit("B");
        assert_eq!(history.len(), 1);
        assert_eq!(*history.current(), "B");
        assert!(!history.can_undo());
    }

    #[test]
    fn is_never_empty() {
        let mut history = LinearHistory::new(1);
        history.reset(2);
        assert!(!history.is_empty());
    }
}
