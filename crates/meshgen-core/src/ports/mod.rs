//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the core domain expects from infrastructure.
//! They contain no implementation details and use only domain types.
//!
//! # Design Rules
//!
//! - No `tokio::process` types in any signature
//! - Intent-based methods (run a command, ensure readiness, show a mesh)
//! - Every port is object-safe and usable as `Arc<dyn Port>`

pub mod model_loader;
pub mod process_runner;
pub mod viewport;

use thiserror::Error;

pub use model_loader::{LoaderError, ModelLoaderPort};
pub use process_runner::{CommandSpec, ProcessExit, ProcessResult, ProcessRunner};
pub use viewport::{ViewportError, ViewportPort};

/// Domain-specific errors for process runner operations.
///
/// A nonzero exit code is not an error at this level; it is reported through
/// [`ProcessResult`]. These variants cover failures to run the program at all.
#[derive(Debug, Clone, Error)]
pub enum ProcessError {
    /// The program does not exist.
    #[error("Program not found: {0}")]
    NotFound(String),

    /// The program exists but could not be started.
    #[error("Failed to start {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    /// Waiting on the child failed.
    #[error("Failed to wait for process: {0}")]
    WaitFailed(String),
}

/// Core error type for semantic domain errors.
///
/// This is the canonical error type used across the core domain.
/// Adapters should map this to their own error types (CLI exit codes,
/// serialized UI errors).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Process operation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Model environment could not be prepared.
    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Asset registry operation failed.
    #[error(transparent)]
    Asset(#[from] crate::assets::AssetError),

    /// Settings validation error.
    #[error(transparent)]
    Settings(#[from] crate::settings::SettingsError),

    /// Path resolution error.
    #[error(transparent)]
    Path(#[from] crate::paths::PathError),

    /// Validation error (invalid input).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Internal error (unexpected condition).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::domain::RequestError> for CoreError {
    fn from(err: crate::domain::RequestError) -> Self {
        Self::Validation(err.to_string())
    }
}
