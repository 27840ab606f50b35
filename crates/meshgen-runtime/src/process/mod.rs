//! Child process execution.
//!
//! - `TokioProcessRunner` - the `ProcessRunner` port adapter
//! - `terminate_child` - SIGTERM → SIGKILL escalation with reaping
//! - `spawn_line_reader` - lossy byte-wise line reading
//! - `spawn_merged_reader` - one reader for the pipe shared by stdout and stderr

mod runner;
mod shutdown;
mod stream;

pub use runner::{DEFAULT_GRACE, TokioProcessRunner};
pub use shutdown::terminate_child;
pub use stream::{spawn_line_reader, spawn_merged_reader};
