//! Per-note undo/redo history.
//!
//! Each note id maps to its own linear history of content snapshots. The
//! undo stack holds the seed content at the bottom and the current content
//! at the top; the redo stack holds undone snapshots, most recent at the
//! front.
use std::collections::{HashMap, VecDeque};

use log::trace;

/// Undo and redo stacks of one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryEntry {
    undo: Vec<String>,
    redo: VecDeque<String>,
}

impl HistoryEntry {
    fn seeded(initial: String) -> Self {
        Self {
            undo: vec![initial],
            redo: VecDeque::new(),
        }
    }

    pub fn undo_stack(&self) -> &[String] {
        &self.undo
    }
}

/// Linear undo/redo history keyed by note id.
#[derive(Debug, Clone, Default)]
pub struct HistoryTracker {
    entries: HashMap<String, HistoryEntry>,
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `id` with `initial` as the oldest reachable state.
    pub fn reset(&mut self, id: &str, initial: &str) {
        trace!("History reset for note {}", id);
        self.entries
            .insert(id.to_string(), HistoryEntry::seeded(initial.to_string()));
    }

    /// Seeds the history the first time a note is observed; later calls do nothing.
    pub fn observe(&mut self, id: &str, content: &str) {
        if !self.is_tracked(id) {
            self.reset(id, content);
        }
    }

    /// Records a committed edit.
    ///
    /// A value equal to the current top is ignored. Otherwise it is pushed
    /// and the redo stack is discarded. An untracked note is seeded with
    /// the value instead.
    pub fn record_edit(&mut self, id: &str, content: &str) {
        let Some(entry) = self.entries.get_mut(id) else {
            self.reset(id, content);
            return;
        };

        if entry.undo.last().map(String::as_str) == Some(content) {
            return;
        }
        entry.undo.push(content.to_string());
        entry.redo.clear();
        trace!("History for {} now {} deep", id, entry.undo.len());
    }

    /// Steps one edit back, returning the content to restore.
    pub fn undo(&mut self, id: &str) -> Option<String> {
        let entry = self.entries.get_mut(id)?;
        if entry.undo.len() <= 1 {
            return None;
        }
        let current = entry.undo.pop()?;
        entry.redo.push_front(current);
        entry.undo.last().cloned()
    }

    /// Re-applies the most recently undone edit, returning the content to restore.
    pub fn redo(&mut self, id: &str) -> Option<String> {
        let entry = self.entries.get_mut(id)?;
        let next = entry.redo.pop_front()?;
        entry.undo.push(next.clone());
        Some(next)
    }

    /// Forgets the history of a deleted note
    pub fn purge(&mut self, id: &str) {
        self.entries.remove(id);
    }

    pub fn is_tracked(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn can_undo(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| e.undo.len() > 1)
    }

    pub fn can_redo(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| !e.redo.is_empty())
    }

    pub fn entry(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.get(id)
    }
}
