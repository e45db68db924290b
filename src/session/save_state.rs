use std::time::SystemTime;

use crate::persistence::ProjectId;

/// Whether the live document has reached durable storage.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    /// Nothing edited since the session opened or a project was loaded.
    #[default]
    Clean,
    /// Edited, and no save covering the edit has finished yet.
    Dirty,
    Saved { id: ProjectId, at: SystemTime },
    /// The last save attempt finished without writing a record.
    Failed(String),
}

impl SaveState {
    pub fn is_dirty(&self) -> bool {
        matches!(self, SaveState::Dirty)
    }

    pub fn last_saved(&self) -> Option<SystemTime> {
        match self {
            SaveState::Saved { at, .. } => Some(*at),
            _ => None,
        }
    }
}

/// Revision-gated [`SaveState`]. Every edit bumps the revision; a save
/// only settles the state if no edit happened since it started.
#[derive(Debug, Default)]
pub(crate) struct SaveTracker {
    revision: u64,
    state: SaveState,
}

impl SaveTracker {
    pub(crate) fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn state(&self) -> &SaveState {
        &self.state
    }

    /// Record an edit; returns the revision a save of it must carry.
    pub(crate) fn mark_dirty(&mut self) -> u64 {
        self.revision += 1;
        self.state = SaveState::Dirty;
        self.revision
    }

    pub(crate) fn mark_clean(&mut self) {
        self.revision += 1;
        self.state = SaveState::Clean;
    }

    /// Returns false (and changes nothing) when `revision` is stale.
    pub(crate) fn settle(&mut self, revision: u64, state: SaveState) -> bool {
        if revision != self.revision {
            log::debug!(
                "ignoring save for revision {} (current {})",
                revision,
                self.revision
            );
            return false;
        }
        self.state = state;
        true
    }
}
