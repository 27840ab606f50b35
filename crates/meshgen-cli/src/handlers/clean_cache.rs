//! Clean-cache command handler.
//!
//! Deletes generated meshes and thumbnails, then drops registry entries
//! whose files are gone.

use anyhow::Result;
use meshgen_core::{AssetRegistry, CacheReport, ResolvedPaths, clear_output_cache};

use crate::bootstrap::CliContext;
use crate::error::CliError;
use crate::utils::input;

pub fn execute(ctx: &CliContext, force: bool) -> Result<()> {
    if !force {
        for dir in ctx.paths.cache_dirs() {
            println!("  {}", dir.display());
        }
        if !input::prompt_confirmation("Delete all generated files in these directories?")? {
            println!("Clean cancelled.");
            return Ok(());
        }
    }

    let report = clean(&ctx.paths)?;
    println!(
        "🧹 Cache cleaned. Removed {} files ({:.2} MB).",
        report.files,
        report.megabytes()
    );
    Ok(())
}

/// Clear the cache directories and reconcile the manifest with the disk.
pub fn clean(paths: &ResolvedPaths) -> Result<CacheReport, CliError> {
    let report = clear_output_cache(&paths.cache_dirs())?;
    // Loading skips entries whose file vanished; saving makes that stick.
    let registry = AssetRegistry::load(&paths.asset_manifest)?;
    registry.save()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgen_core::Settings;
    use std::fs;

    #[test]
    fn clears_outputs_and_forgets_deleted_assets() {
        let root = tempfile::tempdir().unwrap();
        let paths = ResolvedPaths::resolve(&Settings::with_defaults(), root.path()).unwrap();
        fs::create_dir_all(&paths.output_dir).unwrap();
        let generated = paths.output_dir.join("cat.obj");
        fs::write(&generated, [0u8; 64]).unwrap();

        let kept = root.path().join("imported.obj");
        fs::write(&kept, "v 0 0 0\n").unwrap();

        let mut registry = AssetRegistry::load(&paths.asset_manifest).unwrap();
        registry.register(&generated, None).unwrap();
        registry.register(&kept, None).unwrap();
        registry.save().unwrap();

        let report = clean(&paths).unwrap();
        assert_eq!(report.files, 1);
        assert_eq!(report.bytes, 64);

        let reloaded = AssetRegistry::load(&paths.asset_manifest).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.list()[0].path, kept);
    }
}
