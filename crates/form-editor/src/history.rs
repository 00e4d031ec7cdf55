//! Snapshot-based undo/redo.
//!
//! Every committed edit pushes the whole document. Snapshots are immutable
//! once recorded, so undo and redo only move a cursor. Recording after an
//! undo discards the redo tail, and the oldest snapshot is dropped once
//! `max_levels` is exceeded.

use form_spec::Questionnaire;

pub const DEFAULT_MAX_LEVELS: usize = 50;

#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<Questionnaire>,
    cursor: usize,
    /// 0 means unlimited.
    max_levels: usize,
}

impl History {
    pub fn new(initial: Questionnaire) -> Self {
        Self::with_max_levels(initial, DEFAULT_MAX_LEVELS)
    }

    pub fn with_max_levels(initial: Questionnaire, max_levels: usize) -> Self {
        Self {
            snapshots: vec![initial],
            cursor: 0,
            max_levels,
        }
    }

    /// Records `doc` as the newest state.
    pub fn record(&mut self, doc: Questionnaire) {
        self.snapshots.truncate(self.cursor + 1);
        self.snapshots.push(doc);
        if self.max_levels > 0 && self.snapshots.len() > self.max_levels {
            let excess = self.snapshots.len() - self.max_levels;
            self.snapshots.drain(..excess);
        }
        self.cursor = self.snapshots.len() - 1;
    }

    pub fn current(&self) -> Option<&Questionnaire> {
        self.snapshots.get(self.cursor)
    }

    pub fn undo(&mut self) -> Option<&Questionnaire> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn redo(&mut self) -> Option<&Questionnaire> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of recorded snapshots, the initial one included.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }
}
