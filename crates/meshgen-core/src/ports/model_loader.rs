//! Model loader port.
//!
//! Makes sure the external inference project and its weights are present
//! before a generation runs. Implementations may be slow and network-bound.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while preparing the inference environment.
#[derive(Debug, Clone, Error)]
pub enum LoaderError {
    /// The InstantMesh checkout is missing.
    #[error("InstantMesh repository not found at {0}. Please clone it.")]
    MissingCheckout(PathBuf),

    /// The entry script that wraps the inference program is missing.
    #[error("Entry script not found at {0}")]
    MissingEntryPoint(PathBuf),

    /// Downloading weights failed.
    #[error("Failed to download weights from {repo}: {reason}")]
    Download { repo: String, reason: String },

    /// Filesystem error while placing weights.
    #[error("IO error: {0}")]
    Io(String),
}

/// Prepares the external model environment.
#[async_trait]
pub trait ModelLoaderPort: Send + Sync {
    /// Check the installation and fetch weights on demand.
    ///
    /// Returns immediately once the environment has been found ready.
    async fn ensure_ready(&self, low_resource: bool) -> Result<(), LoaderError>;

    /// Whether a previous `ensure_ready` succeeded.
    fn is_ready(&self) -> bool;

    /// Forget readiness so the next `ensure_ready` checks again.
    fn unload(&self);
}
