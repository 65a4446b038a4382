//! Bounded undo/redo history of whole-document snapshots.
//!
//! History lives only in memory. It starts empty on every open and is never
//! written to disk.

use crate::error::{CoreError, CoreResult};
use crate::model::{Document, HistoryStatus};
use std::collections::VecDeque;

/// Default number of undo entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Undo and redo stacks.
///
/// The undo stack is bounded; when full, recording a new entry evicts the
/// oldest one. The redo stack is bounded implicitly since it only ever
/// receives entries popped from the undo side.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    undo: VecDeque<Document>,
    redo: Vec<Document>,
    capacity: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    /// Creates empty history keeping at most `capacity` undo entries.
    ///
    /// A capacity of zero disables undo.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            redo: Vec::new(),
            capacity,
        }
    }

    /// Records the document as it was before a mutation.
    ///
    /// Clears the redo stack unconditionally.
    pub fn record_before_mutation(&mut self, previous: Document) {
        self.redo.clear();
        self.push_undo(previous);
    }

    fn push_undo(&mut self, doc: Document) {
        if self.capacity == 0 {
            return;
        }
        while self.undo.len() >= self.capacity {
            self.undo.pop_front();
        }
        self.undo.push_back(doc);
    }

    /// Pops the latest undo entry, pushing `current` onto redo.
    ///
    /// Returns the document to install.
    ///
    /// # Errors
    ///
    /// Returns `NothingToUndo` if the undo stack is empty; `current` is
    /// dropped and nothing changes.
    pub fn undo(&mut self, current: Document) -> CoreResult<Document> {
        let previous = self.undo.pop_back().ok_or(CoreError::NothingToUndo)?;
        self.redo.push(current);
        Ok(previous)
    }

    /// Pops the latest redo entry, pushing `current` onto undo.
    ///
    /// # Errors
    ///
    /// Returns `NothingToRedo` if the redo stack is empty.
    pub fn redo(&mut self, current: Document) -> CoreResult<Document> {
        let next = self.redo.pop().ok_or(CoreError::NothingToRedo)?;
        self.push_undo(current);
        Ok(next)
    }

    /// Returns whether undo and redo are possible.
    #[must_use]
    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: !self.undo.is_empty(),
            can_redo: !self.redo.is_empty(),
        }
    }

    /// Number of undo entries.
    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo entries.
    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Maximum number of undo entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
