use std::fmt;

use crate::codec::CodecError;
use crate::document::DocumentError;

use super::Direction;

/// Error type for undo/redo transitions. The ledger is unchanged whenever
/// one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// Another undo/redo is still waiting for the document.
    TransitionPending { direction: Direction },
    /// The ticket does not belong to the transition in flight.
    StaleTransition { ticket: u64 },
    /// The ledger entry could not be decoded.
    Codec {
        direction: Direction,
        source: CodecError,
    },
    /// The document failed to rebuild itself from the entry.
    Reconstruction {
        direction: Direction,
        source: DocumentError,
    },
    LockPoisoned(&'static str),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::TransitionPending { direction } => {
                write!(f, "cannot start {}: a transition is still pending", direction)
            }
            HistoryError::StaleTransition { ticket } => {
                write!(f, "transition {} is not in flight", ticket)
            }
            HistoryError::Codec { direction, source } => {
                write!(f, "{} failed to decode entry: {}", direction, source)
            }
            HistoryError::Reconstruction { direction, source } => {
                write!(f, "{} failed to rebuild document: {}", direction, source)
            }
            HistoryError::LockPoisoned(operation) => {
                write!(f, "history lock poisoned during {}", operation)
            }
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HistoryError::Codec { source, .. } => Some(source),
            HistoryError::Reconstruction { source, .. } => Some(source),
            _ => None,
        }
    }
}
