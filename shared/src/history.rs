//! Per-client undo/redo state: an ordered snapshot stack and the cursor
//! (`track`) pointing at the snapshot currently on screen.
//!
//! The stack is never empty and `track` always indexes into it.

use crate::wire::{ValidationError, MAX_HISTORY_LEN};
use crate::{HistorySync, Snapshot};

#[derive(Clone, Debug, PartialEq)]
pub struct History {
    stack: Vec<Snapshot>,
    track: usize,
}

impl History {
    /// Starts from the blank-canvas snapshot at index 0.
    pub fn new(blank: Snapshot) -> Self {
        Self {
            stack: vec![blank],
            track: 0,
        }
    }

    pub fn track(&self) -> usize {
        self.track
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.stack
    }

    pub fn current(&self) -> &Snapshot {
        &self.stack[self.track]
    }

    pub fn can_undo(&self) -> bool {
        self.track > 0
    }

    pub fn can_redo(&self) -> bool {
        self.track + 1 < self.stack.len()
    }

    /// Records a finished local edit. Any redo states past the cursor are
    /// discarded. Returns `false` when `snapshot` is empty or equals the
    /// current one.
    ///
    /// The stack never grows past [`MAX_HISTORY_LEN`]: the oldest edits after
    /// the blank floor are evicted so every sync stays relayable.
    pub fn commit(&mut self, snapshot: Snapshot) -> bool {
        if snapshot.is_empty() || *self.current() == snapshot {
            return false;
        }
        self.stack.truncate(self.track + 1);
        self.stack.push(snapshot);
        if self.stack.len() > MAX_HISTORY_LEN {
            let overflow = self.stack.len() - MAX_HISTORY_LEN;
            self.stack.drain(1..1 + overflow);
        }
        self.track = self.stack.len() - 1;
        true
    }

    /// Moves the cursor back one step and returns the state to broadcast.
    pub fn undo(&mut self) -> Option<HistorySync> {
        if !self.can_undo() {
            return None;
        }
        self.track -= 1;
        Some(self.to_sync())
    }

    /// Moves the cursor forward one step and returns the state to broadcast.
    pub fn redo(&mut self) -> Option<HistorySync> {
        if !self.can_redo() {
            return None;
        }
        self.track += 1;
        Some(self.to_sync())
    }

    pub fn to_sync(&self) -> HistorySync {
        HistorySync {
            track: self.track,
            stack: self.stack.clone(),
        }
    }

    /// Replaces the whole local state with a peer's. Last message wins; there
    /// is no merge. A sync that would break the cursor invariant leaves the
    /// local state untouched.
    pub fn apply_sync(&mut self, sync: HistorySync) -> Result<&Snapshot, ValidationError> {
        sync.validate()?;
        self.stack = sync.stack;
        self.track = sync.track;
        Ok(self.current())
    }
}
