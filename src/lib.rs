//! Snapshot-based undo/redo history and local project persistence for
//! canvas editors.
//!
//! The pieces:
//!
//! - [`document`]: the contract a live canvas fulfils, plus an in-memory one.
//! - [`codec`]: whole-document snapshots and the text transforms applied to
//!   stored records.
//! - [`history`]: the bounded undo/redo ledger.
//! - [`persistence`]: retention-capped project storage over a [`store`].
//! - [`EditorSession`]: ties them together, with autosave.

pub mod codec;
pub mod collab;
pub mod config;
pub mod document;
mod error;
pub mod history;
pub mod persistence;
mod session;
pub mod store;

pub use codec::{Snapshot, SnapshotCodec, TransformKind};
pub use collab::{InMemoryInviteService, Invitation, InviteError, InviteService};
pub use config::EditorConfig;
pub use document::{Document, InMemoryDocument, Mutation, Scene};
pub use error::EditorError;
pub use history::{Direction, HistoryEntry, HistoryError, HistoryLedger};
pub use persistence::{
    PersistenceError, PersistenceGateway, Preferences, ProjectId, ProjectRecord, SaveReport,
};
pub use session::{AutosaveTask, EditorSession, SaveState};
pub use store::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore};
