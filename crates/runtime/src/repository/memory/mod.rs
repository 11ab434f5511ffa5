//! In-memory repository implementations for tests and local runs.

mod kv;

pub use kv::InMemoryKeyValueStore;
