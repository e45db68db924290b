use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::codec::Snapshot;
use crate::persistence::{PersistenceError, PersistenceGateway, Preferences, SaveReport};
use crate::store::KeyValueStore;

use super::save_state::{SaveState, SaveTracker};

/// State shared between a session and its in-flight saves.
pub(crate) struct Shared {
    pub(crate) preferences: Mutex<Preferences>,
    pub(crate) tracker: Mutex<SaveTracker>,
}

impl Shared {
    pub(crate) fn new(preferences: Preferences) -> Self {
        Shared {
            preferences: Mutex::new(preferences),
            tracker: Mutex::new(SaveTracker::default()),
        }
    }

    fn settle(&self, revision: u64, state: SaveState) {
        match self.tracker.lock() {
            Ok(mut tracker) => {
                tracker.settle(revision, state);
            }
            Err(_) => log::warn!("save tracker lock poisoned; dropping save result"),
        }
    }

    /// Turn autosave off after a quota failure and try to remember that.
    fn disable_autosave<S: KeyValueStore>(&self, gateway: &PersistenceGateway<S>) {
        let preferences = match self.preferences.lock() {
            Ok(mut preferences) => {
                preferences.autosave_enabled = false;
                preferences.clone()
            }
            Err(_) => {
                log::warn!("preferences lock poisoned; autosave left enabled");
                return;
            }
        };
        log::warn!("store quota exceeded; autosave disabled");
        if let Err(err) = gateway.save_preferences(&preferences) {
            log::warn!("failed to persist disabled autosave: {}", err);
        }
    }
}

/// One save of one snapshot, carrying the revision it was taken at.
pub(crate) struct SaveJob<S> {
    pub(crate) gateway: Arc<PersistenceGateway<S>>,
    pub(crate) shared: Arc<Shared>,
    pub(crate) name: String,
    pub(crate) snapshot: Snapshot,
    pub(crate) revision: u64,
    /// Quota failures switch autosave off.
    pub(crate) automatic: bool,
}

impl<S: KeyValueStore> SaveJob<S> {
    pub(crate) fn run(self) -> Result<SaveReport, PersistenceError> {
        let result = self.gateway.save_project(&self.name, &self.snapshot);
        let state = match &result {
            Ok(report) => match &report.record {
                Some(record) => SaveState::Saved {
                    id: record.id.clone(),
                    at: record.created_at,
                },
                None => SaveState::Failed(format!("project {} was not written", self.name)),
            },
            Err(err) => {
                if self.automatic && err.is_quota_exceeded() {
                    self.shared.disable_autosave(&*self.gateway);
                }
                SaveState::Failed(err.to_string())
            }
        };
        self.shared.settle(self.revision, state);
        result
    }
}

impl<S: KeyValueStore + 'static> SaveJob<S> {
    /// Run on tokio's blocking pool when a runtime is available, otherwise
    /// right away on the calling thread.
    pub(crate) fn spawn(self) -> AutosaveTask {
        match Handle::try_current() {
            Ok(handle) => AutosaveTask::Spawned(handle.spawn_blocking(move || {
                if let Err(err) = self.run() {
                    log::warn!("autosave failed: {}", err);
                }
            })),
            Err(_) => {
                if let Err(err) = self.run() {
                    log::warn!("autosave failed: {}", err);
                }
                AutosaveTask::Completed
            }
        }
    }
}

/// Handle to a background autosave. Dropping it does not cancel the save.
#[derive(Debug)]
pub enum AutosaveTask {
    Spawned(JoinHandle<()>),
    /// Ran inline because no runtime was available.
    Completed,
}

impl AutosaveTask {
    pub fn is_finished(&self) -> bool {
        match self {
            AutosaveTask::Spawned(handle) => handle.is_finished(),
            AutosaveTask::Completed => true,
        }
    }

    /// Wait for the save to finish. Its outcome is visible through
    /// [`EditorSession::save_state`](crate::EditorSession::save_state).
    pub async fn wait(self) {
        if let AutosaveTask::Spawned(handle) = self {
            if let Err(err) = handle.await {
                log::warn!("autosave task did not finish: {}", err);
            }
        }
    }
}
