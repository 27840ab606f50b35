//! Check command handler.
//!
//! Verifies the InstantMesh checkout and downloads missing weights without
//! running a generation.

use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use meshgen_core::ModelLoaderPort;
use tracing::debug;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub async fn execute(ctx: &CliContext, low_vram: bool) -> Result<()> {
    let loader = &ctx.loader;
    loader.check_install().map_err(|e| CliError::Setup(e.to_string()))?;

    let missing = loader.missing_weights();
    if missing.is_empty() {
        debug!("All weights present");
    } else {
        println!("Missing weights in {}:", loader.weights_dir().display());
        for file in &missing {
            println!("  - {file}");
        }
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message("Preparing InstantMesh...");

    let result = loader.ensure_ready(low_vram).await;
    spinner.finish_and_clear();
    result.map_err(|e| CliError::Setup(e.to_string()))?;

    println!("✅ InstantMesh is ready");
    println!("   Checkout: {}", ctx.paths.checkout_dir.display());
    println!("   Weights:  {}", loader.weights_dir().display());
    Ok(())
}
