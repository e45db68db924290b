use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::codec::Snapshot;

/// Unique identifier of a saved project record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        ProjectId(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        ProjectId(value.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        ProjectId(value)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One durably saved project: a named, timestamped snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub id: ProjectId,
    pub name: String,
    pub snapshot: Snapshot,
    pub created_at: SystemTime,
}

impl ProjectRecord {
    pub fn new(name: impl Into<String>, snapshot: Snapshot, created_at: SystemTime) -> Self {
        ProjectRecord {
            id: ProjectId::generate(),
            name: name.into(),
            snapshot,
            created_at,
        }
    }

    /// Ordering used for retention: oldest first, id as tie-breaker.
    pub(crate) fn age_key(&self) -> (SystemTime, &ProjectId) {
        (self.created_at, &self.id)
    }
}

/// Cross-session editor state. Stored apart from project records and never
/// counted against retention.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub project_name: String,
    pub autosave_enabled: bool,
    pub collaborators: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences {
            project_name: crate::config::DEFAULT_PROJECT_NAME.to_string(),
            autosave_enabled: true,
            collaborators: Vec::new(),
        }
    }
}
