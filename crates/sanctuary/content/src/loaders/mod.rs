//! Content loaders for reading point-of-interest catalogs from files.

pub mod catalog;

pub use catalog::{
    CatalogLoader, DialogSpec, PointCatalog, PointDefaults, PointOfInterest, PointSpec,
};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
