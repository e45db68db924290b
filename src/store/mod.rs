//! Key-value stores - durable string storage backing project persistence.
//!
//! Stores hold encoded text under string keys, the way browser local storage
//! does. Project records live under a shared key prefix; preferences live
//! under their own key.
//!
//! ## Example
//!
//! ```ignore
//! use canvas_history::{InMemoryKeyValueStore, KeyValueStore};
//!
//! let store = InMemoryKeyValueStore::with_quota(5 * 1024 * 1024);
//! store.set("editor-storage", "{}".into())?;
//! assert_eq!(store.get("editor-storage")?.as_deref(), Some("{}"));
//! ```

mod error;
mod file;
mod in_memory;

pub use error::StoreError;
pub use file::FileKeyValueStore;
pub use in_memory::InMemoryKeyValueStore;

/// Abstract string storage keyed by string identifiers.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`. Returns None if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite the value under `key`.
    ///
    /// Fails with [`StoreError::QuotaExceeded`] when the store has no room
    /// for the write. A rejected write leaves the previous value in place.
    fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Remove the value under `key`. Returns true if one existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// List every key currently in the store.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// List the keys that start with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}
