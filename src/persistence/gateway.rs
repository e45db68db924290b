use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use crate::codec::{Base64Transform, Snapshot, TextTransform};
use crate::config::{DEFAULT_KEY_PREFIX, DEFAULT_PREFERENCES_KEY, DEFAULT_RETENTION_LIMIT};
use crate::store::{KeyValueStore, StoreError};

use super::{Preferences, PersistenceError, ProjectId, ProjectRecord};

/// What a [`PersistenceGateway::save_project`] call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// The record written, or None if a non-fatal failure skipped the write.
    pub record: Option<ProjectRecord>,
    /// Older projects removed to stay within the retention limit.
    pub evicted: Vec<ProjectId>,
    /// Keys that held undecodable data and were removed.
    pub purged: Vec<String>,
}

impl SaveReport {
    pub fn is_saved(&self) -> bool {
        self.record.is_some()
    }
}

struct Scan {
    records: Vec<(String, ProjectRecord)>,
    purged: Vec<String>,
}

/// Durable, retention-capped project storage over a [`KeyValueStore`].
///
/// Every save writes a new record under `prefix + id`. Before writing, the
/// gateway drops records it cannot decode and evicts the oldest valid ones
/// until there is room for the new record. Saves are serialized, so
/// concurrent callers never both see a free slot.
pub struct PersistenceGateway<S> {
    store: S,
    transform: Box<dyn TextTransform>,
    key_prefix: String,
    preferences_key: String,
    retention_limit: usize,
    clock: fn() -> SystemTime,
    save_lock: Mutex<()>,
}

impl<S> PersistenceGateway<S> {
    pub fn new(store: S) -> Self {
        PersistenceGateway {
            store,
            transform: Box::new(Base64Transform),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            preferences_key: DEFAULT_PREFERENCES_KEY.to_string(),
            retention_limit: DEFAULT_RETENTION_LIMIT,
            clock: SystemTime::now,
            save_lock: Mutex::new(()),
        }
    }

    /// Set the reversible transform applied to encoded records.
    pub fn with_transform(mut self, transform: Box<dyn TextTransform>) -> Self {
        self.transform = transform;
        self
    }

    /// Set the maximum number of stored projects. Zero is raised to one.
    pub fn with_retention_limit(mut self, limit: usize) -> Self {
        self.retention_limit = limit.max(1);
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_preferences_key(mut self, key: impl Into<String>) -> Self {
        self.preferences_key = key.into();
        self
    }

    /// Override the timestamp source for new records.
    pub fn with_clock(mut self, clock: fn() -> SystemTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn retention_limit(&self) -> usize {
        self.retention_limit
    }

    pub fn key_for(&self, id: &ProjectId) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    /// Save `snapshot` as a new project record named `name`.
    ///
    /// Only [`PersistenceError::QuotaExceeded`] is returned as an error.
    /// Corrupt entries, failed evictions and other store failures are
    /// logged; the report then shows what actually happened.
    pub fn save_project(
        &self,
        name: &str,
        snapshot: &Snapshot,
    ) -> Result<SaveReport, PersistenceError> {
        // guards no data, so a poisoned lock is still usable
        let _serialized = self.save_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let Scan {
            mut records,
            purged,
        } = self.scan();
        let mut report = SaveReport {
            purged,
            ..SaveReport::default()
        };

        if records.len() >= self.retention_limit {
            records.sort_by(|(_, a), (_, b)| a.age_key().cmp(&b.age_key()));
            let excess = records.len() - self.retention_limit + 1;
            for (key, record) in records.into_iter().take(excess) {
                match self.store.remove(&key) {
                    Ok(_) => {
                        log::debug!("evicted project {} ({})", record.id, record.name);
                        report.evicted.push(record.id);
                    }
                    Err(err) => log::warn!("failed to evict project {}: {}", key, err),
                }
            }
        }

        let record = ProjectRecord::new(name, snapshot.clone(), (self.clock)());
        match self.store_record(&record) {
            Ok(()) => {
                log::info!("saved project {} ({})", record.id, record.name);
                report.record = Some(record);
                Ok(report)
            }
            Err(err) if err.is_quota_exceeded() => {
                log::error!("failed to save project {}: {}", record.name, err);
                Err(err)
            }
            Err(err) => {
                log::warn!("failed to save project {}: {}", record.name, err);
                Ok(report)
            }
        }
    }

    /// Encode and write one record under its key.
    pub fn store_record(&self, record: &ProjectRecord) -> Result<(), PersistenceError> {
        let key = self.key_for(&record.id);
        let json = serde_json::to_string(record).map_err(|e| PersistenceError::corrupt(&key, e))?;
        self.store.set(&key, self.transform.encode(&json))?;
        Ok(())
    }

    /// All readable projects, newest first. Unreadable entries are skipped.
    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>, PersistenceError> {
        let keys = self.project_keys()?;
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            match self.read(&key) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(err) => log::warn!("skipping unreadable project {}: {}", key, err),
            }
        }
        records.sort_by(|a, b| b.age_key().cmp(&a.age_key()));
        Ok(records)
    }

    pub fn load_project(&self, id: &ProjectId) -> Result<ProjectRecord, PersistenceError> {
        let key = self.key_for(id);
        let found = if key == self.preferences_key {
            None
        } else {
            self.read(&key)?
        };
        found.ok_or_else(|| PersistenceError::NotFound { id: id.to_string() })
    }

    /// Returns true if a project was removed.
    pub fn delete_project(&self, id: &ProjectId) -> Result<bool, PersistenceError> {
        let key = self.key_for(id);
        if key == self.preferences_key {
            return Ok(false);
        }
        Ok(self.store.remove(&key)?)
    }

    /// Read stored preferences. None when absent or unreadable.
    pub fn load_preferences(&self) -> Option<Preferences> {
        match self.store.get(&self.preferences_key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(preferences) => Some(preferences),
                Err(err) => {
                    log::warn!("ignoring unreadable preferences: {}", err);
                    None
                }
            },
            Ok(None) => None,
            Err(err) => {
                log::warn!("failed to read preferences: {}", err);
                None
            }
        }
    }

    pub fn save_preferences(&self, preferences: &Preferences) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(preferences)
            .map_err(|e| PersistenceError::corrupt(&self.preferences_key, e))?;
        self.store.set(&self.preferences_key, json)?;
        Ok(())
    }

    /// Keys under the project prefix, minus the preferences entry when
    /// the two namespaces overlap.
    fn project_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = self.store.keys_with_prefix(&self.key_prefix)?;
        keys.retain(|key| *key != self.preferences_key);
        Ok(keys)
    }

    fn read(&self, key: &str) -> Result<Option<ProjectRecord>, PersistenceError> {
        match self.store.get(key)? {
            Some(raw) => self.decode(key, &raw).map(Some),
            None => Ok(None),
        }
    }

    fn decode(&self, key: &str, raw: &str) -> Result<ProjectRecord, PersistenceError> {
        let json = self
            .transform
            .decode(raw)
            .map_err(|e| PersistenceError::corrupt(key, e))?;
        serde_json::from_str(&json).map_err(|e| PersistenceError::corrupt(key, e))
    }

    /// Collect valid records and remove the ones that fail to decode.
    /// Nothing here is allowed to fail the caller.
    fn scan(&self) -> Scan {
        let mut scan = Scan {
            records: Vec::new(),
            purged: Vec::new(),
        };
        let keys = match self.project_keys() {
            Ok(keys) => keys,
            Err(err) => {
                log::warn!("failed to enumerate projects: {}", err);
                return scan;
            }
        };

        for key in keys {
            let raw = match self.store.get(&key) {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(err) => {
                    log::warn!("failed to read project {}: {}", key, err);
                    continue;
                }
            };
            match self.decode(&key, &raw) {
                Ok(record) => scan.records.push((key, record)),
                Err(err) => {
                    log::warn!("removing corrupt project {}: {}", key, err);
                    match self.store.remove(&key) {
                        Ok(_) => scan.purged.push(key),
                        Err(err) => log::warn!("failed to remove corrupt project {}: {}", key, err),
                    }
                }
            }
        }
        scan
    }
}
