//! Repository layer for durable client data
//!
//! Repositories hold the few records that must survive a restart:
//! - Last known player position
//! - Stored GPS permission decision
//! - Player continue/new choice and saved player id
//!
//! Every record is a JSON string under a fixed [`StorageKey`]. Point-of-interest
//! content is loaded from catalogs, not repositories.

mod error;
mod file;
mod memory;
mod traits;
mod types;

pub use error::{RepositoryError, Result};
pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
pub use traits::{KeyValueStore, RecordStore};
pub use types::{PermissionRecord, PermissionStatus, PlayerChoice, PlayerChoiceRecord, StorageKey};
