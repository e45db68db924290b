//! Project persistence - retention-capped project records and preferences.
//!
//! ## Example
//!
//! ```ignore
//! use canvas_history::{InMemoryKeyValueStore, PersistenceGateway, Snapshot};
//!
//! let gateway = PersistenceGateway::new(InMemoryKeyValueStore::new())
//!     .with_retention_limit(5);
//! let report = gateway.save_project("Holiday card", &snapshot)?;
//! let latest = gateway.list_projects()?.into_iter().next();
//! ```

mod error;
mod gateway;
mod record;

pub use error::PersistenceError;
pub use gateway::{PersistenceGateway, SaveReport};
pub use record::{Preferences, ProjectId, ProjectRecord};
