//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that parse CLI-specific input, call the session or the
//!   asset registry, and format output for the terminal.

pub mod assets;
pub mod check;
pub mod clean_cache;
pub mod export;
pub mod generate;
pub mod logs;
pub mod paths;
