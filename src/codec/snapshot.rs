use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Immutable serialized capture of a whole document at one instant.
///
/// Cloning shares the underlying buffer, so a snapshot can sit in the
/// history ledger and travel to an autosave task without copying.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Snapshot {
    fn from(value: String) -> Self {
        Snapshot(Arc::from(value))
    }
}

impl From<&str> for Snapshot {
    fn from(value: &str) -> Self {
        Snapshot(Arc::from(value))
    }
}

impl AsRef<str> for Snapshot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for Snapshot {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const PREVIEW: usize = 48;
        match self.0.char_indices().nth(PREVIEW) {
            Some((cut, _)) => write!(f, "Snapshot({:?}.. {} bytes)", &self.0[..cut], self.len()),
            None => write!(f, "Snapshot({:?})", &*self.0),
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Snapshot, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Snapshot::from)
    }
}
