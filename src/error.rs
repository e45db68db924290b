use std::fmt;

use crate::codec::CodecError;
use crate::collab::InviteError;
use crate::document::DocumentError;
use crate::history::HistoryError;
use crate::persistence::PersistenceError;

/// Error type for [`EditorSession`](crate::EditorSession) operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    Codec(CodecError),
    History(HistoryError),
    Persistence(PersistenceError),
    Document(DocumentError),
    Invite(InviteError),
    LockPoisoned(&'static str),
}

impl EditorError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, EditorError::Persistence(err) if err.is_quota_exceeded())
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::Codec(err) => write!(f, "codec error: {}", err),
            EditorError::History(err) => write!(f, "history error: {}", err),
            EditorError::Persistence(err) => write!(f, "persistence error: {}", err),
            EditorError::Document(err) => write!(f, "document error: {}", err),
            EditorError::Invite(err) => write!(f, "invite error: {}", err),
            EditorError::LockPoisoned(operation) => {
                write!(f, "session lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for EditorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EditorError::Codec(err) => Some(err),
            EditorError::History(err) => Some(err),
            EditorError::Persistence(err) => Some(err),
            EditorError::Document(err) => Some(err),
            EditorError::Invite(err) => Some(err),
            EditorError::LockPoisoned(_) => None,
        }
    }
}

impl From<CodecError> for EditorError {
    fn from(err: CodecError) -> Self {
        EditorError::Codec(err)
    }
}

impl From<HistoryError> for EditorError {
    fn from(err: HistoryError) -> Self {
        EditorError::History(err)
    }
}

impl From<PersistenceError> for EditorError {
    fn from(err: PersistenceError) -> Self {
        EditorError::Persistence(err)
    }
}

impl From<DocumentError> for EditorError {
    fn from(err: DocumentError) -> Self {
        EditorError::Document(err)
    }
}

impl From<InviteError> for EditorError {
    fn from(err: InviteError) -> Self {
        EditorError::Invite(err)
    }
}
