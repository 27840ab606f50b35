//! Export command handler.

use std::path::Path;

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::handlers::assets::registered_path;
use crate::presentation::format_bytes;

/// Copy an asset to `dest`.
///
/// Unregistered files can be exported too; the registry is not changed.
pub fn execute(ctx: &CliContext, asset: &Path, dest: &Path) -> Result<()> {
    let registry = ctx.assets()?;
    let source = registered_path(&registry, asset);
    let bytes = registry.export(&source, dest).map_err(CliError::from)?;
    println!(
        "📦 Exported {} -> {} ({})",
        source.display(),
        dest.display(),
        format_bytes(bytes)
    );
    Ok(())
}
