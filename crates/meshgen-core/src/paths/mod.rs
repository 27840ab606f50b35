//! Path utilities for meshgen data directories and user-configurable locations.
//!
//! - `data_root` - where everything lives unless overridden
//! - `ResolvedPaths` - every location derived from settings in one place
//!
//! No interactive/terminal I/O here; the CLI prints `ResolvedPaths` as-is.

mod error;
mod platform;
mod resolver;

pub use error::PathError;
pub use platform::{DATA_DIR_ENV, data_root, ensure_dir};
pub use resolver::{ASSET_MANIFEST_FILE, ENV_FILE, LAST_LOG_FILE, ResolvedPaths};
