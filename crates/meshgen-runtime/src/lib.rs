//! # meshgen-runtime
//!
//! OS-level adapters for meshgen: running the inference program as a child
//! process, the single-slot generation session that drives it, and the
//! loader that prepares the InstantMesh checkout and weights.
//!
//! # Structure
//!
//! - `process` - `TokioProcessRunner`, line readers, SIGTERM → SIGKILL shutdown
//! - `session` - `GenerationSession`, milestones, artifact resolution
//! - `loader` - `InstantMeshLoader` and the Hugging Face weight fetcher
#![deny(unused_crate_dependencies)]

pub mod loader;
pub mod process;
pub mod session;

pub use loader::{HfWeightFetcher, InstantMeshLoader, WeightFetcher};
pub use process::{DEFAULT_GRACE, TokioProcessRunner, terminate_child};
pub use session::{
    GenerationHandle, GenerationId, GenerationSession, Milestone, PipelineConfig, SessionError,
    SessionPhase, default_milestones,
};

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;
