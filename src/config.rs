//! Editor configuration.
//!
//! Built with chained `with_*` setters or parsed from JSON; every field has
//! a default, so a partial document is enough.

use serde::{Deserialize, Serialize};

use crate::codec::TransformKind;
use crate::history::DEFAULT_CAPACITY;

pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";
pub const DEFAULT_KEY_PREFIX: &str = "project_";
pub const DEFAULT_PREFERENCES_KEY: &str = "editor-storage";
pub const DEFAULT_RETENTION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Snapshots kept by the history ledger.
    pub history_capacity: usize,
    /// Projects kept in the store.
    pub retention_limit: usize,
    /// Autosave state when no preferences have been stored yet.
    pub autosave: bool,
    /// Custom element metadata kept in snapshots.
    pub metadata_fields: Vec<String>,
    pub key_prefix: String,
    pub preferences_key: String,
    pub default_project_name: String,
    pub transform: TransformKind,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            history_capacity: DEFAULT_CAPACITY,
            retention_limit: DEFAULT_RETENTION_LIMIT,
            autosave: true,
            metadata_fields: Vec::new(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            preferences_key: DEFAULT_PREFERENCES_KEY.to_string(),
            default_project_name: DEFAULT_PROJECT_NAME.to_string(),
            transform: TransformKind::default(),
        }
    }
}

impl EditorConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    pub fn with_retention_limit(mut self, limit: usize) -> Self {
        self.retention_limit = limit;
        self
    }

    pub fn with_autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }

    pub fn with_metadata_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata_fields = fields.into_iter().map(Into::into).collect();
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

    pub fn with_default_project_name(mut self, name: impl Into<String>) -> Self {
        self.default_project_name = name.into();
        self
    }

    pub fn with_transform(mut self, transform: TransformKind) -> Self {
        self.transform = transform;
        self
    }
}
