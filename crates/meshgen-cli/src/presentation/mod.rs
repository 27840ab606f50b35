//! Shared CLI presentation utilities.
//!
//! Format-only: no domain transforms here.

pub mod progress;
pub mod tables;
pub mod viewport;

pub use progress::GenerationProgress;
pub use tables::{format_bytes, print_asset_table, print_separator, truncate_string};
pub use viewport::TerminalViewport;
