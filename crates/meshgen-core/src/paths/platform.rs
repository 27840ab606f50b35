//! Platform data directory and user path normalization.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::PathError;

/// Environment variable overriding the data root.
pub const DATA_DIR_ENV: &str = "MESHGEN_DATA_DIR";

/// Get the root directory for application data (checkout, outputs, assets).
///
/// Resolution order:
/// 1. `MESHGEN_DATA_DIR` environment variable
/// 2. System data directory (e.g., `~/.local/share/meshgen`)
///
/// The directory is created if it does not exist.
pub fn data_root() -> Result<PathBuf, PathError> {
    let root = match env::var(DATA_DIR_ENV) {
        Ok(raw) if !raw.trim().is_empty() => normalize_user_path(&raw)?,
        _ => dirs::data_local_dir()
            .ok_or(PathError::NoDataDir)?
            .join("meshgen"),
    };
    ensure_dir(&root)?;
    Ok(root)
}

/// Create `path` and its parents unless it already is a directory.
pub fn ensure_dir(path: &Path) -> Result<(), PathError> {
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(PathError::NotADirectory(path.to_path_buf()));
    }
    fs::create_dir_all(path).map_err(|e| PathError::CreateFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Normalize a user-provided path, expanding `~` and making it absolute.
pub(super) fn normalize_user_path(raw: &str) -> Result<PathBuf, PathError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PathError::EmptyPath);
    }

    let expanded = if trimmed == "~" {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?
    } else if let Some(rest) = trimmed.strip_prefix("~/") {
        dirs::home_dir().ok_or(PathError::NoHomeDir)?.join(rest)
    } else {
        PathBuf::from(trimmed)
    };

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(expanded))
            .map_err(|e| PathError::CurrentDirError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_rejected() {
        assert!(matches!(normalize_user_path("  "), Err(PathError::EmptyPath)));
    }

    #[test]
    fn absolute_paths_pass_through() {
        let path = normalize_user_path("/opt/InstantMesh").unwrap();
        assert_eq!(path, PathBuf::from("/opt/InstantMesh"));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let path = normalize_user_path("outputs").unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("outputs"));
    }

    #[test]
    fn ensure_dir_rejects_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(matches!(ensure_dir(&file), Err(PathError::NotADirectory(_))));

        let nested = dir.path().join("a/b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
