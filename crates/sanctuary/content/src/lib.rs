//! Data-driven points of interest and their dialogs.
//!
//! Content is authored as RON and converted into core types:
//! - proximity targets (location, trigger radius, cooldown)
//! - the dialog each target presents when it fires
//! - an optional demo route for simulated walks
//!
//! Content is consumed by the runtime at build time and never mutated.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    CatalogLoader, DialogSpec, LoadResult, PointCatalog, PointDefaults, PointOfInterest,
    PointSpec,
};
