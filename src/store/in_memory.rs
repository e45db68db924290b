use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::{KeyValueStore, StoreError};

/// In-memory key-value store backed by `Arc<RwLock<BTreeMap>>`.
///
/// Clone-friendly (cloning shares the same underlying storage). An optional
/// quota caps the total bytes of keys plus values, which mirrors how browser
/// local storage accounts for space.
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    storage: Arc<RwLock<BTreeMap<String, String>>>,
    quota: Option<usize>,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKeyValueStore {
    /// Create an unbounded store.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(BTreeMap::new())),
            quota: None,
        }
    }

    /// Create a store that rejects writes once `quota` bytes are in use.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            storage: Arc::new(RwLock::new(BTreeMap::new())),
            quota: Some(quota),
        }
    }

    /// Total bytes of keys plus values currently stored.
    pub fn usage(&self) -> Result<usize, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("usage"))?;
        Ok(storage.iter().map(|(k, v)| k.len() + v.len()).sum())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("len"))?;
        Ok(storage.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("get"))?;
        Ok(storage.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("set"))?;

        if let Some(quota) = self.quota {
            let used: usize = storage
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let requested = key.len() + value.len();
            if used + requested > quota {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    requested,
                    remaining: quota.saturating_sub(used),
                });
            }
        }

        storage.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("remove"))?;
        Ok(storage.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("keys"))?;
        Ok(storage.keys().cloned().collect())
    }
}
