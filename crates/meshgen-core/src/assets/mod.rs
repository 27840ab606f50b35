//! Generated asset bookkeeping.
//!
//! - `AssetRegistry` - ordered list of produced meshes with JSON persistence
//! - `clear_output_cache` - bulk deletion of generated files

mod cache;
mod registry;

use std::path::PathBuf;

use thiserror::Error;

pub use cache::{CacheReport, clear_output_cache};
pub use registry::{AssetRecord, AssetRegistry};

/// Errors from asset registry operations.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The file to register or export does not exist.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// The path is not in the registry.
    #[error("No asset registered at {0}")]
    Unknown(PathBuf),

    /// Deleting the asset file failed; the entry was kept.
    #[error("Could not delete {path}: {reason}")]
    Remove { path: PathBuf, reason: String },

    /// Copying the asset failed.
    #[error("Could not export to {dest}: {reason}")]
    Export { dest: PathBuf, reason: String },

    /// Reading or writing the manifest failed.
    #[error("Asset manifest {path}: {reason}")]
    Manifest { path: PathBuf, reason: String },

    /// Walking a cache directory failed.
    #[error("Failed to clean {dir}: {reason}")]
    Cache { dir: PathBuf, reason: String },
}
