//! Output cache cleanup.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::AssetError;

/// What a cleanup removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheReport {
    pub files: usize,
    pub bytes: u64,
}

impl CacheReport {
    #[allow(clippy::cast_precision_loss)]
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Delete every file below `dirs`, keeping the directories themselves.
///
/// Directories that do not exist are skipped. Files that cannot be deleted
/// are logged and left in place.
pub fn clear_output_cache(dirs: &[&Path]) -> Result<CacheReport, AssetError> {
    let mut report = CacheReport::default();
    for dir in dirs {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "Cache directory absent, skipping");
            continue;
        }
        clear_dir(dir, &mut report).map_err(|e| AssetError::Cache {
            dir: dir.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    Ok(report)
}

fn clear_dir(dir: &Path, report: &mut CacheReport) -> Result<(), walkdir::Error> {
    // Collected first so deletion does not race the directory iterator.
    let files = WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter(|entry| entry.as_ref().map_or(true, |e| !e.file_type().is_dir()))
        .collect::<Result<Vec<_>, _>>()?;

    for entry in files {
        let path = entry.path();
        let size = entry.metadata().map_or(0, |m| m.len());
        match fs::remove_file(path) {
            Ok(()) => {
                report.files += 1;
                report.bytes += size;
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete cached file"),
        }
    }
    Ok(())
}
