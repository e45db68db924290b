//! History ledger - bounded undo/redo over whole-document snapshots.
//!
//! Every entry is a full snapshot, so any entry can be restored directly
//! without replaying the ones before it. The ledger itself is a plain state
//! machine; [`EditorSession`](crate::EditorSession) drives it against a
//! live document.

mod error;
mod ledger;

use std::fmt;

pub use error::HistoryError;
pub use ledger::{HistoryLedger, RecordOutcome, Transition, DEFAULT_CAPACITY};

/// Which way a transition moves the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Undo,
    Redo,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Undo => "undo",
            Direction::Redo => "redo",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of a history listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub index: usize,
    pub label: String,
    /// The live document matches this entry.
    pub current: bool,
    /// The entry lies after the cursor and can be redone.
    pub redoable: bool,
}
