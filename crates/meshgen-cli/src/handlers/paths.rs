//! Paths command handler.
//!
//! Displays all resolved paths for diagnostics.

use anyhow::Result;

use crate::bootstrap::CliContext;

/// Print every resolved path in `key = value` format.
pub fn execute(ctx: &CliContext) -> Result<()> {
    println!("{}", ctx.paths);
    Ok(())
}
