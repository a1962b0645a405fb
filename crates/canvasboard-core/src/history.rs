//! Linear undo/redo over full snapshots of the element collection.

use crate::config::HISTORY_LIMIT;
use crate::element::Element;

/// Ordered snapshots plus a cursor.
///
/// The cursor always indexes a valid snapshot. Saving truncates everything
/// after the cursor, so there is never more than one future.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Vec<Element>>,
    cursor: usize,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl History {
    /// Start a history whose only snapshot is `initial`.
    pub fn new(initial: Vec<Element>) -> Self {
        Self::with_limit(initial, HISTORY_LIMIT)
    }

    /// Start a history that keeps at most `limit` snapshots (at least 1).
    pub fn with_limit(initial: Vec<Element>, limit: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Record a new state, discarding any redo future.
    pub fn save(&mut self, elements: &[Element]) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(elements.to_vec());
        self.cursor = self.snapshots.len() - 1;

        // Limit history size
        if self.snapshots.len() > self.limit {
            let excess = self.snapshots.len() - self.limit;
            self.snapshots.drain(..excess);
            self.cursor -= excess;
        }
        log::debug!("history: saved snapshot {} of {}", self.cursor + 1, self.snapshots.len());
    }

    /// Step back. Returns the snapshot to restore, or `None` at the start.
    pub fn undo(&mut self) -> Option<&[Element]> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        log::debug!("history: undo to {}", self.cursor);
        Some(&self.snapshots[self.cursor])
    }

    /// Step forward. Returns the snapshot to restore, or `None` at the end.
    pub fn redo(&mut self) -> Option<&[Element]> {
        if self.cursor + 1 >= self.snapshots.len() {
            return None;
        }
        self.cursor += 1;
        log::debug!("history: redo to {}", self.cursor);
        Some(&self.snapshots[self.cursor])
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The snapshot at the cursor.
    pub fn current(&self) -> &[Element] {
        &self.snapshots[self.cursor]
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Maximum number of snapshots kept.
    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Always false: a history holds at least its initial snapshot.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}
