use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use super::{
    Change, Document, DocumentError, Mutation, Reconstruction, ReconstructionHandle, Scene,
};

/// How [`InMemoryDocument`] completes replacement requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconstructionMode {
    /// Replace the scene and resolve at once.
    #[default]
    Immediate,
    /// Queue the request until `complete_next` or `fail_next` is called.
    Deferred,
}

struct PendingReplace {
    scene: Scene,
    handle: ReconstructionHandle,
}

struct DocumentState {
    scene: Scene,
    selection: Option<String>,
    mode: ReconstructionMode,
    pending: VecDeque<PendingReplace>,
    revision: u64,
}

/// In-memory document backed by `Arc<RwLock<..>>`.
///
/// Clone-friendly (cloning shares the same live document), so a caller can
/// hand one clone to an editor session and keep another to drive pending
/// reconstructions. Mutations are refused while a reconstruction is pending.
#[derive(Clone)]
pub struct InMemoryDocument {
    state: Arc<RwLock<DocumentState>>,
}

impl Default for InMemoryDocument {
    fn default() -> Self {
        Self::new(Scene::default())
    }
}

impl InMemoryDocument {
    pub fn new(scene: Scene) -> Self {
        Self::with_mode(scene, ReconstructionMode::Immediate)
    }

    pub fn with_mode(scene: Scene, mode: ReconstructionMode) -> Self {
        InMemoryDocument {
            state: Arc::new(RwLock::new(DocumentState {
                scene,
                selection: None,
                mode,
                pending: VecDeque::new(),
                revision: 0,
            })),
        }
    }

    pub fn set_mode(&self, mode: ReconstructionMode) -> Result<(), DocumentError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DocumentError::LockPoisoned("set mode"))?;
        state.mode = mode;
        Ok(())
    }

    /// Currently selected element id.
    pub fn selection(&self) -> Result<Option<String>, DocumentError> {
        let state = self
            .state
            .read()
            .map_err(|_| DocumentError::LockPoisoned("selection"))?;
        Ok(state.selection.clone())
    }

    /// Bumped on every applied mutation and completed reconstruction.
    pub fn revision(&self) -> Result<u64, DocumentError> {
        let state = self
            .state
            .read()
            .map_err(|_| DocumentError::LockPoisoned("revision"))?;
        Ok(state.revision)
    }

    pub fn pending_reconstructions(&self) -> Result<usize, DocumentError> {
        let state = self
            .state
            .read()
            .map_err(|_| DocumentError::LockPoisoned("pending"))?;
        Ok(state.pending.len())
    }

    /// Finish the oldest pending reconstruction, installing its scene.
    ///
    /// Returns false if nothing was pending. A request whose caller has
    /// already stopped waiting is discarded without touching the scene.
    pub fn complete_next(&self) -> Result<bool, DocumentError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DocumentError::LockPoisoned("complete"))?;
        let Some(next) = state.pending.pop_front() else {
            return Ok(false);
        };
        if next.handle.is_cancelled() {
            log::debug!("discarding reconstruction nobody is waiting for");
            return Ok(true);
        }
        install(&mut state, next.scene);
        next.handle.complete();
        Ok(true)
    }

    /// Fail the oldest pending reconstruction; the scene stays as it was.
    pub fn fail_next(&self, reason: impl Into<String>) -> Result<bool, DocumentError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DocumentError::LockPoisoned("fail"))?;
        match state.pending.pop_front() {
            Some(next) => {
                next.handle.fail(DocumentError::Rejected(reason.into()));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Drop the oldest pending reconstruction without resolving it.
    pub fn abandon_next(&self) -> Result<bool, DocumentError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DocumentError::LockPoisoned("abandon"))?;
        Ok(state.pending.pop_front().is_some())
    }
}

fn install(state: &mut DocumentState, scene: Scene) {
    if let Some(selected) = &state.selection {
        if !scene.contains(selected) {
            state.selection = None;
        }
    }
    state.scene = scene;
    state.revision += 1;
}

impl Document for InMemoryDocument {
    fn apply(&self, mutation: Mutation) -> Result<Change, DocumentError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| DocumentError::LockPoisoned("apply"))?;
        if !state.pending.is_empty() {
            return Err(DocumentError::Busy);
        }

        let change = if mutation.is_history_worthy() {
            Change::Edited
        } else {
            Change::Transient
        };

        match mutation {
            Mutation::Add(element) => {
                if state.scene.contains(&element.id) {
                    return Err(DocumentError::DuplicateElement(element.id));
                }
                state.scene.elements.push(element);
            }
            Mutation::Remove { id } => {
                if state.scene.remove(&id).is_none() {
                    return Err(DocumentError::UnknownElement(id));
                }
                if state.selection.as_deref() == Some(id.as_str()) {
                    state.selection = None;
                }
            }
            Mutation::Replace(element) => match state.scene.find_mut(&element.id) {
                Some(existing) => *existing = element,
                None => return Err(DocumentError::UnknownElement(element.id)),
            },
            Mutation::Move { id, left, top } => match state.scene.find_mut(&id) {
                Some(existing) => {
                    existing.left = left;
                    existing.top = top;
                }
                None => return Err(DocumentError::UnknownElement(id)),
            },
            Mutation::SetBackground(background) => state.scene.background = background,
            Mutation::Clear => {
                state.scene.elements.clear();
                state.selection = None;
            }
            Mutation::Select(selection) => {
                if let Some(id) = &selection {
                    if !state.scene.contains(id) {
                        return Err(DocumentError::UnknownElement(id.clone()));
                    }
                }
                state.selection = selection;
            }
        }

        state.revision += 1;
        Ok(change)
    }

    fn scene(&self) -> Result<Scene, DocumentError> {
        let state = self
            .state
            .read()
            .map_err(|_| DocumentError::LockPoisoned("scene"))?;
        Ok(state.scene.clone())
    }

    fn replace(&self, scene: Scene) -> Reconstruction {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(_) => return Reconstruction::ready(Err(DocumentError::LockPoisoned("replace"))),
        };
        if !state.pending.is_empty() {
            return Reconstruction::ready(Err(DocumentError::Busy));
        }
        match state.mode {
            ReconstructionMode::Immediate => {
                install(&mut state, scene);
                Reconstruction::ready(Ok(()))
            }
            ReconstructionMode::Deferred => {
                let (handle, reconstruction) = Reconstruction::channel();
                state.pending.push_back(PendingReplace { scene, handle });
                reconstruction
            }
        }
    }
}
