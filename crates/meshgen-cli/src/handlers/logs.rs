//! Logs command handler.
//!
//! Each `generate` run stores its rendered log sink; this prints or clears it.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

use crate::bootstrap::CliContext;

pub fn execute(ctx: &CliContext, clear: bool) -> Result<()> {
    let path = &ctx.paths.last_log;
    if clear {
        if clear_log(path)? {
            println!("Log cleared.");
        } else {
            println!("No log to clear.");
        }
        return Ok(());
    }

    match read_log(path)? {
        Some(text) => print!("{text}"),
        None => println!("No generation has been logged yet."),
    }
    Ok(())
}

/// The stored log, or `None` if no generation ran yet.
pub fn read_log(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

/// Delete the stored log. Returns whether there was one.
pub fn clear_log(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
    }
}
