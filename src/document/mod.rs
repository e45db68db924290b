//! Document facade - the contract for the live, externally rendered canvas.
//!
//! The history and persistence core never reaches into the document. It
//! applies [`Mutation`]s, reads the full [`Scene`], and asks for a complete
//! replacement through [`Document::replace`], which resolves asynchronously
//! once the engine has finished rebuilding (image decoding and the like).
//!
//! [`InMemoryDocument`] is a reference implementation. In deferred mode its
//! reconstructions stay pending until [`InMemoryDocument::complete_next`] is
//! called, which makes ordering around undo/redo observable in tests.

mod in_memory;
mod reconstruction;
mod scene;

use std::fmt;

pub use in_memory::{InMemoryDocument, ReconstructionMode};
pub use reconstruction::{Reconstruction, ReconstructionHandle};
pub use scene::{Element, ElementKind, Scene, Style, SCENE_VERSION};

/// A structural edit applied to the live document.
#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    Add(Element),
    Remove { id: String },
    /// Swap an existing element (matched by id) for a new version of it.
    Replace(Element),
    Move { id: String, left: f64, top: f64 },
    SetBackground(Option<String>),
    Clear,
    /// Change the active selection. Not recorded in history.
    Select(Option<String>),
}

impl Mutation {
    pub fn is_history_worthy(&self) -> bool {
        !matches!(self, Mutation::Select(_))
    }
}

/// Outcome of a successfully applied mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// The document changed in a way that belongs in history.
    Edited,
    /// Transient change (selection, hover) that history ignores.
    Transient,
}

impl Change {
    pub fn is_history_worthy(&self) -> bool {
        matches!(self, Change::Edited)
    }
}

/// Error type for document operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    UnknownElement(String),
    DuplicateElement(String),
    /// A reconstruction is still in progress.
    Busy,
    /// The engine refused the operation.
    Rejected(String),
    /// The reconstruction was dropped before it completed.
    Abandoned,
    LockPoisoned(&'static str),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentError::UnknownElement(id) => write!(f, "unknown element: {}", id),
            DocumentError::DuplicateElement(id) => write!(f, "duplicate element: {}", id),
            DocumentError::Busy => write!(f, "document is reconstructing"),
            DocumentError::Rejected(reason) => write!(f, "document rejected operation: {}", reason),
            DocumentError::Abandoned => write!(f, "reconstruction abandoned"),
            DocumentError::LockPoisoned(operation) => {
                write!(f, "document lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for DocumentError {}

/// The live, mutable document owned by the graphics engine.
pub trait Document {
    /// Apply one mutation, reporting whether it is history-worthy.
    fn apply(&self, mutation: Mutation) -> Result<Change, DocumentError>;

    /// Read the complete current state.
    fn scene(&self) -> Result<Scene, DocumentError>;

    /// Replace the entire state. The returned future resolves once the
    /// document has been rebuilt and is ready to render.
    fn replace(&self, scene: Scene) -> Reconstruction;
}
