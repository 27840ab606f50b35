//! # meshgen-core
//!
//! Domain types, events and port definitions for driving an external
//! image-to-3D inference program.
//!
//! This crate holds everything that does not touch processes or the network:
//! generation requests, the event vocabulary emitted by a generation session,
//! the user-facing log sink, the asset registry, settings and path resolution.
//! Adapters that spawn processes or download weights live in `meshgen-runtime`.
#![deny(unused_crate_dependencies)]

pub mod assets;
pub mod domain;
pub mod events;
pub mod logs;
pub mod paths;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use assets::{AssetError, AssetRecord, AssetRegistry, CacheReport, clear_output_cache};
pub use domain::{
    GenerationRequest, ImageInput, MeshBuffers, MeshError, ModelId, RequestError, ViewTag,
    load_mesh,
};
pub use events::{FailureKind, GenerationError, GenerationEvent, GenerationFailure};
pub use logs::{LogEntry, LogSink, Severity};
pub use paths::{PathError, ResolvedPaths, data_root, ensure_dir};
pub use ports::{
    CommandSpec, CoreError, LoaderError, ModelLoaderPort, ProcessError, ProcessExit,
    ProcessResult, ProcessRunner, ViewportError, ViewportPort,
};
pub use settings::{Settings, SettingsError, validate_settings};

#[cfg(test)]
use tempfile as _;
