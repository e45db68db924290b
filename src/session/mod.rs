//! Editor session - the root that wires a live document to its history
//! and to durable storage.
//!
//! ```ignore
//! let document = InMemoryDocument::new(Scene::new(800.0, 600.0));
//! let session = EditorSession::open(document, InMemoryKeyValueStore::new(), EditorConfig::default())?;
//!
//! session.apply(Mutation::Add(Element::rect("r1", 40.0, 20.0)))?;
//! session.undo().await?;
//! session.save()?;
//! ```

mod autosave;
mod save_state;

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use crate::codec::{Snapshot, SnapshotCodec};
use crate::collab::{Invitation, InviteService};
use crate::config::EditorConfig;
use crate::document::{Document, Mutation};
use crate::error::EditorError;
use crate::history::{Direction, HistoryEntry, HistoryError, HistoryLedger};
use crate::persistence::{PersistenceGateway, Preferences, ProjectId, ProjectRecord, SaveReport};
use crate::store::KeyValueStore;

pub use autosave::AutosaveTask;
pub use save_state::SaveState;

use autosave::{SaveJob, Shared};

/// A live document together with its undo/redo history and persistence.
///
/// Every history-worthy change is captured as a full snapshot. When
/// autosave is on, the snapshot is also saved in the background.
pub struct EditorSession<D, S> {
    document: D,
    codec: SnapshotCodec,
    ledger: Mutex<HistoryLedger>,
    gateway: Arc<PersistenceGateway<S>>,
    shared: Arc<Shared>,
    default_project_name: String,
}

impl<D, S> EditorSession<D, S>
where
    D: Document,
    S: KeyValueStore + 'static,
{
    /// Open a session over `store`, configured by `config`.
    pub fn open(document: D, store: S, config: EditorConfig) -> Result<Self, EditorError> {
        let gateway = PersistenceGateway::new(store)
            .with_transform(config.transform.build())
            .with_retention_limit(config.retention_limit)
            .with_key_prefix(config.key_prefix.clone())
            .with_preferences_key(config.preferences_key.clone());
        Self::with_gateway(document, gateway, config)
    }

    /// Open a session over an already configured gateway. Only the history,
    /// codec and preference defaults are taken from `config`.
    pub fn with_gateway(
        document: D,
        gateway: PersistenceGateway<S>,
        config: EditorConfig,
    ) -> Result<Self, EditorError> {
        let preferences = gateway.load_preferences().unwrap_or_else(|| Preferences {
            project_name: config.default_project_name.clone(),
            autosave_enabled: config.autosave,
            collaborators: Vec::new(),
        });
        let session = EditorSession {
            document,
            codec: SnapshotCodec::new().with_metadata_fields(config.metadata_fields),
            ledger: Mutex::new(HistoryLedger::new(config.history_capacity)),
            gateway: Arc::new(gateway),
            shared: Arc::new(Shared::new(preferences)),
            default_project_name: config.default_project_name,
        };

        let initial = session.capture()?;
        session.lock_ledger("open")?.record(initial)?;
        log::debug!("session opened");
        Ok(session)
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn codec(&self) -> &SnapshotCodec {
        &self.codec
    }

    pub fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }

    // ========================================================================
    // Editing and history
    // ========================================================================

    /// Snapshot the document as it is now.
    pub fn capture(&self) -> Result<Snapshot, EditorError> {
        let scene = self.document.scene()?;
        Ok(self.codec.serialize(&scene)?)
    }

    /// Apply a mutation and record it if it is history-worthy.
    ///
    /// Returns the background autosave started for the new entry, if any.
    pub fn apply(&self, mutation: Mutation) -> Result<Option<AutosaveTask>, EditorError> {
        let change = self.document.apply(mutation)?;
        if !change.is_history_worthy() {
            return Ok(None);
        }
        self.record()
    }

    /// Append the current document state to the history.
    ///
    /// Refused with `TransitionPending` while an undo/redo is still waiting
    /// for the document.
    pub fn record(&self) -> Result<Option<AutosaveTask>, EditorError> {
        let snapshot = {
            let mut ledger = self.lock_ledger("record")?;
            ledger.ensure_idle()?;
            let snapshot = self.capture()?;
            let outcome = ledger.record(snapshot.clone())?;
            log::debug!("recorded snapshot: {:?}", outcome);
            snapshot
        };

        let revision = self.lock_tracker("record")?.mark_dirty();
        if !self.autosave_enabled()? {
            return Ok(None);
        }
        let job = SaveJob {
            gateway: Arc::clone(&self.gateway),
            shared: Arc::clone(&self.shared),
            name: self.project_name()?,
            snapshot,
            revision,
            automatic: true,
        };
        Ok(Some(job.spawn()))
    }

    /// Step back one entry. Resolves to false when there is nothing to undo.
    ///
    /// The cursor only moves once the document has rebuilt itself. Dropping
    /// the future before that abandons the undo.
    pub async fn undo(&self) -> Result<bool, EditorError> {
        self.step(Direction::Undo).await
    }

    /// Step forward one entry. Resolves to false when there is nothing to
    /// redo.
    pub async fn redo(&self) -> Result<bool, EditorError> {
        self.step(Direction::Redo).await
    }

    async fn step(&self, direction: Direction) -> Result<bool, EditorError> {
        let Some(transition) = self.lock_ledger("begin")?.begin(direction)? else {
            return Ok(false);
        };
        let guard = TransitionGuard {
            ledger: &self.ledger,
            ticket: transition.ticket(),
            armed: true,
        };

        let reconstruction = self
            .codec
            .restore(&self.document, transition.snapshot())
            .map_err(|source| HistoryError::Codec { direction, source })?;
        reconstruction
            .await
            .map_err(|source| HistoryError::Reconstruction { direction, source })?;

        let cursor = guard.commit()?;
        self.lock_tracker(direction.as_str())?.mark_dirty();
        log::debug!("{} landed on entry {}", direction, cursor);
        Ok(true)
    }

    pub fn can_undo(&self) -> Result<bool, EditorError> {
        Ok(self.lock_ledger("can_undo")?.can_undo())
    }

    pub fn can_redo(&self) -> Result<bool, EditorError> {
        Ok(self.lock_ledger("can_redo")?.can_redo())
    }

    /// The history entry the live document is expected to match.
    pub fn current_snapshot(&self) -> Result<Option<Snapshot>, EditorError> {
        Ok(self.lock_ledger("current_snapshot")?.current().cloned())
    }

    /// One row per history entry, oldest first.
    pub fn history(&self) -> Result<Vec<HistoryEntry>, EditorError> {
        Ok(self.lock_ledger("history")?.view())
    }

    // ========================================================================
    // Projects
    // ========================================================================

    /// Save the current document under the current project name.
    pub fn save(&self) -> Result<SaveReport, EditorError> {
        let snapshot = self.capture()?;
        let revision = self.lock_tracker("save")?.revision();
        let job = SaveJob {
            gateway: Arc::clone(&self.gateway),
            shared: Arc::clone(&self.shared),
            name: self.project_name()?,
            snapshot,
            revision,
            automatic: false,
        };
        Ok(job.run()?)
    }

    /// Saved projects, newest first.
    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, EditorError> {
        Ok(self.gateway.list_projects()?)
    }

    pub fn delete_project(&self, id: &ProjectId) -> Result<bool, EditorError> {
        Ok(self.gateway.delete_project(id)?)
    }

    /// Load a saved project into the document and start a fresh history
    /// from it.
    pub async fn open_project(&self, id: &ProjectId) -> Result<ProjectRecord, EditorError> {
        self.lock_ledger("open_project")?.ensure_idle()?;
        let record = self.gateway.load_project(id)?;
        self.codec.restore(&self.document, &record.snapshot)?.await?;

        self.lock_ledger("open_project")?.reset(record.snapshot.clone())?;
        self.lock_tracker("open_project")?.mark_clean();
        self.update_preferences(|preferences| {
            preferences.project_name = record.name.clone();
        })?;
        log::info!("opened project {} ({})", record.id, record.name);
        Ok(record)
    }

    // ========================================================================
    // Preferences
    // ========================================================================

    pub fn project_name(&self) -> Result<String, EditorError> {
        Ok(self.lock_preferences("project_name")?.project_name.clone())
    }

    /// Rename the active project. A blank name falls back to the default.
    pub fn set_project_name(&self, name: &str) -> Result<(), EditorError> {
        let name = match name.trim() {
            "" => self.default_project_name.clone(),
            trimmed => trimmed.to_string(),
        };
        self.update_preferences(|preferences| preferences.project_name = name)
    }

    pub fn autosave_enabled(&self) -> Result<bool, EditorError> {
        Ok(self.lock_preferences("autosave_enabled")?.autosave_enabled)
    }

    pub fn set_autosave(&self, enabled: bool) -> Result<(), EditorError> {
        self.update_preferences(|preferences| preferences.autosave_enabled = enabled)
    }

    /// Flip autosave, returning the new setting.
    pub fn toggle_autosave(&self) -> Result<bool, EditorError> {
        let mut enabled = false;
        self.update_preferences(|preferences| {
            preferences.autosave_enabled = !preferences.autosave_enabled;
            enabled = preferences.autosave_enabled;
        })?;
        Ok(enabled)
    }

    pub fn collaborators(&self) -> Result<Vec<String>, EditorError> {
        Ok(self.lock_preferences("collaborators")?.collaborators.clone())
    }

    /// Returns false if `email` was already listed.
    pub fn add_collaborator(&self, email: &str) -> Result<bool, EditorError> {
        let mut added = false;
        self.update_preferences(|preferences| {
            if !preferences.collaborators.iter().any(|c| c == email) {
                preferences.collaborators.push(email.to_string());
                added = true;
            }
        })?;
        Ok(added)
    }

    pub fn remove_collaborator(&self, email: &str) -> Result<bool, EditorError> {
        let mut removed = false;
        self.update_preferences(|preferences| {
            let before = preferences.collaborators.len();
            preferences.collaborators.retain(|c| c != email);
            removed = preferences.collaborators.len() != before;
        })?;
        Ok(removed)
    }

    /// Invite `invitee` to the active project and list them as a
    /// collaborator once the service accepts.
    pub async fn invite<I: InviteService>(
        &self,
        service: &I,
        inviter: &str,
        invitee: &str,
    ) -> Result<(), EditorError> {
        let invitation = Invitation {
            project_id: self.project_name()?,
            inviter: inviter.to_string(),
            invitee: invitee.to_string(),
        };
        service.send_invite(&invitation).await?;
        self.add_collaborator(invitee)?;
        Ok(())
    }

    // ========================================================================
    // Save state
    // ========================================================================

    pub fn save_state(&self) -> Result<SaveState, EditorError> {
        Ok(self.lock_tracker("save_state")?.state().clone())
    }

    /// When the current document state was last saved, if it has been.
    pub fn last_saved(&self) -> Result<Option<SystemTime>, EditorError> {
        Ok(self.lock_tracker("last_saved")?.state().last_saved())
    }

    pub fn has_unsaved_changes(&self) -> Result<bool, EditorError> {
        Ok(self.lock_tracker("has_unsaved_changes")?.state().is_dirty())
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn update_preferences(&self, update: impl FnOnce(&mut Preferences)) -> Result<(), EditorError> {
        let snapshot = {
            let mut preferences = self.lock_preferences("update_preferences")?;
            update(&mut preferences);
            preferences.clone()
        };
        self.gateway.save_preferences(&snapshot)?;
        Ok(())
    }

    fn lock_ledger(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, HistoryLedger>, EditorError> {
        self.ledger
            .lock()
            .map_err(|_| EditorError::History(HistoryError::LockPoisoned(operation)))
    }

    fn lock_preferences(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, Preferences>, EditorError> {
        self.shared
            .preferences
            .lock()
            .map_err(|_| EditorError::LockPoisoned(operation))
    }

    fn lock_tracker(
        &self,
        operation: &'static str,
    ) -> Result<MutexGuard<'_, save_state::SaveTracker>, EditorError> {
        self.shared
            .tracker
            .lock()
            .map_err(|_| EditorError::LockPoisoned(operation))
    }
}

/// Aborts the ledger transition unless it was committed.
struct TransitionGuard<'a> {
    ledger: &'a Mutex<HistoryLedger>,
    ticket: u64,
    armed: bool,
}

impl TransitionGuard<'_> {
    fn commit(mut self) -> Result<usize, HistoryError> {
        self.armed = false;
        self.ledger
            .lock()
            .map_err(|_| HistoryError::LockPoisoned("commit"))?
            .commit(self.ticket)
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.ledger.lock() {
            Ok(mut ledger) => {
                if let Err(err) = ledger.abort(self.ticket) {
                    log::warn!("failed to abort transition {}: {}", self.ticket, err);
                } else {
                    log::debug!("transition {} aborted", self.ticket);
                }
            }
            Err(_) => log::warn!("history lock poisoned; transition {} left open", self.ticket),
        }
    }
}
