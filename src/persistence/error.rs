use std::fmt;

use crate::store::StoreError;

/// Error type for project persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// The store has no room for the write. The only error a save
    /// propagates.
    QuotaExceeded {
        key: String,
        requested: usize,
        remaining: usize,
    },
    /// No project with this id is stored.
    NotFound { id: String },
    /// A stored record could not be decoded.
    Corrupt { key: String, message: String },
    /// Any other store failure.
    Store(StoreError),
}

impl PersistenceError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, PersistenceError::QuotaExceeded { .. })
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::QuotaExceeded {
                key,
                requested,
                remaining,
            } => write!(
                f,
                "storage quota exceeded saving {} ({} bytes requested, {} remaining)",
                key, requested, remaining
            ),
            PersistenceError::NotFound { id } => write!(f, "project not found: {}", id),
            PersistenceError::Corrupt { key, message } => {
                write!(f, "corrupt record {}: {}", key, message)
            }
            PersistenceError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<StoreError> for PersistenceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::QuotaExceeded {
                key,
                requested,
                remaining,
            } => PersistenceError::QuotaExceeded {
                key,
                requested,
                remaining,
            },
            other => PersistenceError::Store(other),
        }
    }
}

impl PersistenceError {
    pub(crate) fn corrupt(key: &str, err: impl fmt::Display) -> Self {
        PersistenceError::Corrupt {
            key: key.to_string(),
            message: err.to_string(),
        }
    }
}
