//! Asset command handlers: list, remove, import and show.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use meshgen_core::ports::ViewportPort;
use meshgen_core::{AssetError, AssetRecord, AssetRegistry, LogSink, MeshBuffers, load_mesh};

use crate::bootstrap::CliContext;
use crate::commands::AssetsCommand;
use crate::error::CliError;
use crate::presentation::{format_bytes, print_asset_table};
use crate::utils::input;

pub fn execute(ctx: &CliContext, command: &AssetsCommand) -> Result<()> {
    match command {
        AssetsCommand::List { json } => list(ctx, *json),
        AssetsCommand::Remove { path, force } => remove(ctx, path, *force),
        AssetsCommand::Import { path } => import(ctx, path),
        AssetsCommand::Show { path } => show(ctx, path),
    }
}

fn list(ctx: &CliContext, json: bool) -> Result<()> {
    let registry = ctx.assets()?;
    if json {
        println!("{}", serde_json::to_string_pretty(registry.list())?);
        return Ok(());
    }
    if registry.is_empty() {
        println!("No assets yet. Run 'meshgen generate --image <path>' to create one.");
        return Ok(());
    }
    print_asset_table(registry.list());
    Ok(())
}

fn remove(ctx: &CliContext, path: &Path, force: bool) -> Result<()> {
    let mut registry = ctx.assets()?;
    let path = registered_path(&registry, path);
    let Some(record) = registry.get(&path) else {
        println!("No asset registered at: {}", path.display());
        println!("Use 'meshgen assets list' to see registered assets.");
        return Ok(());
    };

    if !force {
        println!(
            "{} ({})",
            record.path.display(),
            format_bytes(record.size_bytes)
        );
        if !input::prompt_confirmation("Delete this asset from disk?")? {
            println!("Remove operation cancelled.");
            return Ok(());
        }
    }

    let removed = remove_asset(&mut registry, &path)?;
    println!("🗑️  Removed {}", removed.file_name());
    Ok(())
}

/// Delete an asset and persist the registry.
///
/// The manifest is only rewritten when the entry was actually dropped.
pub fn remove_asset(registry: &mut AssetRegistry, path: &Path) -> Result<AssetRecord, CliError> {
    let record = registry.remove(path)?;
    registry.save()?;
    Ok(record)
}

fn import(ctx: &CliContext, path: &Path) -> Result<()> {
    let mut registry = ctx.assets()?;
    let record = import_asset(&mut registry, path)?;
    println!(
        "✅ Imported {} ({})",
        record.path.display(),
        format_bytes(record.size_bytes)
    );
    Ok(())
}

/// Register an existing mesh under its absolute path.
pub fn import_asset(registry: &mut AssetRegistry, path: &Path) -> Result<AssetRecord, CliError> {
    let absolute = fs::canonicalize(path).map_err(|_| AssetError::NotFound(path.to_path_buf()))?;
    if registry.get(&absolute).is_some() {
        return Err(CliError::Arguments(format!(
            "{} is already registered",
            absolute.display()
        )));
    }
    let record = registry.register(absolute, None)?;
    registry.save()?;
    Ok(record)
}

fn show(ctx: &CliContext, path: &Path) -> Result<()> {
    let registry = ctx.assets()?;
    show_asset(&registry, ctx.viewport.as_ref(), &ctx.log, path)?;
    println!("✅ Showing {}", registered_path(&registry, path).display());
    Ok(())
}

/// Reload a registered asset into the viewport.
///
/// Only paths in the registry are accepted; anything else is an argument
/// error so stray files are imported first.
pub fn show_asset(
    registry: &AssetRegistry,
    viewport: &dyn ViewportPort,
    log: &LogSink,
    path: &Path,
) -> Result<MeshBuffers, CliError> {
    let key = registered_path(registry, path);
    let record = registry
        .get(&key)
        .ok_or_else(|| AssetError::Unknown(key.clone()))?;
    if !record.path.is_file() {
        return Err(AssetError::NotFound(record.path.clone()).into());
    }

    log.info(format!("Loading {}...", record.file_name()));
    let mesh = load_mesh(&record.path).inspect_err(|e| log.error(e.to_string()))?;
    viewport
        .update_mesh(&mesh)
        .inspect_err(|e| log.error(format!("Viewport rejected mesh: {e}")))?;
    log.success(format!("Showing {}", record.file_name()));
    Ok(mesh)
}

/// The registry key for a user-supplied path: as given if registered,
/// otherwise its canonical form.
pub fn registered_path(registry: &AssetRegistry, path: &Path) -> PathBuf {
    if registry.get(path).is_some() {
        return path.to_path_buf();
    }
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
