//! Viewport port.
//!
//! The 3D view is an external collaborator: it receives mesh buffers and
//! can write a raster snapshot of what it currently shows.

use std::path::Path;

use thiserror::Error;

use crate::domain::MeshBuffers;

/// Errors reported by a viewport.
#[derive(Debug, Error)]
pub enum ViewportError {
    #[error("Viewport cannot {0}")]
    Unsupported(&'static str),

    #[error("Nothing to capture: no mesh loaded")]
    Empty,

    #[error("Snapshot failed: {0}")]
    Snapshot(String),
}

/// Displays meshes.
#[cfg_attr(test, mockall::automock)]
pub trait ViewportPort: Send + Sync {
    /// Replace the displayed mesh.
    fn update_mesh(&self, mesh: &MeshBuffers) -> Result<(), ViewportError>;

    /// Write a raster image of the current view to `path`.
    fn capture_snapshot(&self, path: &Path) -> Result<(), ViewportError>;
}
