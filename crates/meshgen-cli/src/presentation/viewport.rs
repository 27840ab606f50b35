//! Terminal stand-in for the 3D viewport.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use meshgen_core::ports::{ViewportError, ViewportPort};
use meshgen_core::MeshBuffers;

/// Reports mesh statistics instead of rendering.
///
/// There is no rasterizer, so snapshots are always `Unsupported`.
#[derive(Debug, Default)]
pub struct TerminalViewport {
    current: Mutex<Option<(usize, usize)>>,
}

impl TerminalViewport {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(vertices, faces)` of the mesh on display.
    pub fn current(&self) -> Option<(usize, usize)> {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ViewportPort for TerminalViewport {
    fn update_mesh(&self, mesh: &MeshBuffers) -> Result<(), ViewportError> {
        if mesh.is_empty() {
            return Err(ViewportError::Empty);
        }
        println!(
            "Mesh: {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.face_count()
        );
        if let Some((min, max)) = mesh.bounds() {
            println!(
                "Bounds: [{:.3}, {:.3}, {:.3}] .. [{:.3}, {:.3}, {:.3}]",
                min[0], min[1], min[2], max[0], max[1], max[2]
            );
        }
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) =
            Some((mesh.vertex_count(), mesh.face_count()));
        Ok(())
    }

    fn capture_snapshot(&self, _path: &Path) -> Result<(), ViewportError> {
        if self.current().is_none() {
            return Err(ViewportError::Empty);
        }
        Err(ViewportError::Unsupported("capture snapshots in a terminal"))
    }
}
