//! Persisted record types and their storage keys.

mod records;

pub use records::{PermissionRecord, PermissionStatus, PlayerChoice, PlayerChoiceRecord, StorageKey};
