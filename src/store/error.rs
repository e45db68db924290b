use std::fmt;

/// Error type for key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store rejected a write for capacity reasons.
    QuotaExceeded {
        key: String,
        requested: usize,
        remaining: usize,
    },
    /// The underlying lock was poisoned.
    LockPoisoned(&'static str),
    /// Filesystem or other backend failure.
    Io(String),
}

impl StoreError {
    /// Whether this error means the store is out of space.
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StoreError::QuotaExceeded { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::QuotaExceeded {
                key,
                requested,
                remaining,
            } => write!(
                f,
                "quota exceeded writing {} ({} bytes requested, {} remaining)",
                key, requested, remaining
            ),
            StoreError::LockPoisoned(operation) => {
                write!(f, "store lock poisoned during {}", operation)
            }
            StoreError::Io(message) => write!(f, "store io error: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}
