//! Registry of generated meshes.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::AssetError;

/// A produced artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub path: PathBuf,
    pub created_at: DateTime<Local>,
    pub size_bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<PathBuf>,
}

impl AssetRecord {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

/// On-disk form of the registry.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    assets: Vec<AssetRecord>,
}

/// Ordered list of assets, newest last.
///
/// Optionally backed by a JSON manifest so the list survives restarts.
#[derive(Debug, Default)]
pub struct AssetRegistry {
    records: Vec<AssetRecord>,
    manifest: Option<PathBuf>,
}

impl AssetRegistry {
    /// Create an empty in-memory registry.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
            manifest: None,
        }
    }

    /// Open a registry persisted at `manifest`.
    ///
    /// A missing manifest yields an empty registry. Entries whose file no
    /// longer exists are skipped.
    pub fn load(manifest: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let manifest = manifest.into();
        let records = if manifest.exists() {
            let text = fs::read_to_string(&manifest).map_err(|e| AssetError::Manifest {
                path: manifest.clone(),
                reason: e.to_string(),
            })?;
            let parsed: Manifest =
                serde_json::from_str(&text).map_err(|e| AssetError::Manifest {
                    path: manifest.clone(),
                    reason: e.to_string(),
                })?;
            let total = parsed.assets.len();
            let present: Vec<AssetRecord> = parsed
                .assets
                .into_iter()
                .filter(|record| record.path.exists())
                .collect();
            if present.len() != total {
                debug!(
                    skipped = total - present.len(),
                    "Dropped manifest entries for missing files"
                );
            }
            present
        } else {
            Vec::new()
        };

        Ok(Self {
            records,
            manifest: Some(manifest),
        })
    }

    /// Write the registry to its manifest. No-op for in-memory registries.
    pub fn save(&self) -> Result<(), AssetError> {
        let Some(manifest) = &self.manifest else {
            return Ok(());
        };
        let manifest_err = |reason: String| AssetError::Manifest {
            path: manifest.clone(),
            reason,
        };

        if let Some(parent) = manifest.parent() {
            fs::create_dir_all(parent).map_err(|e| manifest_err(e.to_string()))?;
        }
        let body = serde_json::to_string_pretty(&Manifest {
            assets: self.records.clone(),
        })
        .map_err(|e| manifest_err(e.to_string()))?;
        fs::write(manifest, body).map_err(|e| manifest_err(e.to_string()))
    }

    /// Add an existing file. A thumbnail that does not exist is dropped.
    pub fn register(
        &mut self,
        path: impl Into<PathBuf>,
        thumbnail: Option<PathBuf>,
    ) -> Result<AssetRecord, AssetError> {
        let path = path.into();
        let metadata = fs::metadata(&path).map_err(|_| AssetError::NotFound(path.clone()))?;
        if !metadata.is_file() {
            return Err(AssetError::NotFound(path));
        }

        let record = AssetRecord {
            path,
            created_at: Local::now(),
            size_bytes: metadata.len(),
            thumbnail: thumbnail.filter(|thumb| thumb.is_file()),
        };
        debug!(path = %record.path.display(), "Registered asset");
        self.records.push(record.clone());
        Ok(record)
    }

    /// All assets in registration order.
    pub fn list(&self) -> &[AssetRecord] {
        &self.records
    }

    pub fn get(&self, path: &Path) -> Option<&AssetRecord> {
        self.records.iter().find(|record| record.path == path)
    }

    pub const fn len(&self) -> usize {
        self.records.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Delete the asset file and its entry together.
    ///
    /// If the file cannot be deleted the entry is kept. The thumbnail is
    /// removed best-effort.
    pub fn remove(&mut self, path: &Path) -> Result<AssetRecord, AssetError> {
        let index = self
            .records
            .iter()
            .position(|record| record.path == path)
            .ok_or_else(|| AssetError::Unknown(path.to_path_buf()))?;

        match fs::remove_file(path) {
            Ok(()) => {}
            // Already gone: nothing left to keep the entry for.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AssetError::Remove {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
            }
        }

        let record = self.records.remove(index);
        if let Some(thumb) = &record.thumbnail {
            if let Err(e) = fs::remove_file(thumb) {
                warn!(thumbnail = %thumb.display(), error = %e, "Failed to delete thumbnail");
            }
        }
        Ok(record)
    }

    /// Copy an asset to `dest`, returning the bytes written.
    pub fn export(&self, path: &Path, dest: &Path) -> Result<u64, AssetError> {
        if !path.is_file() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        fs::copy(path, dest).map_err(|e| AssetError::Export {
            dest: dest.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn register_requires_existing_file() {
        let dir = tempdir().unwrap();
        let mut registry = AssetRegistry::new();
        let err = registry
            .register(dir.path().join("missing.obj"), None)
            .unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn list_is_newest_last_and_drops_missing_thumbnail() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.obj");
        let second = dir.path().join("b.obj");
        fs::write(&first, "v 0 0 0").unwrap();
        fs::write(&second, "v 0 0 0").unwrap();

        let mut registry = AssetRegistry::new();
        registry.register(&first, None).unwrap();
        let record = registry
            .register(&second, Some(dir.path().join("nope.png")))
            .unwrap();

        assert_eq!(record.thumbnail, None);
        let paths: Vec<&Path> = registry.list().iter().map(|r| r.path.as_path()).collect();
        assert_eq!(paths, vec![first.as_path(), second.as_path()]);
    }

    #[test]
    fn remove_deletes_file_and_entry() {
        let dir = tempdir().unwrap();
        let mesh = dir.path().join("cat.obj");
        let thumb = dir.path().join("cat.png");
        fs::write(&mesh, "v 0 0 0").unwrap();
        fs::write(&thumb, "png").unwrap();

        let mut registry = AssetRegistry::new();
        registry.register(&mesh, Some(thumb.clone())).unwrap();
        registry.remove(&mesh).unwrap();

        assert!(registry.get(&mesh).is_none());
        assert!(!mesh.exists());
        assert!(!thumb.exists());
    }

    #[test]
    fn remove_keeps_entry_when_deletion_fails() {
        let dir = tempdir().unwrap();
        // A non-empty directory registered under a file path cannot be
        // removed with remove_file.
        let mesh = dir.path().join("mesh.obj");
        fs::write(&mesh, "v 0 0 0").unwrap();
        let mut registry = AssetRegistry::new();
        registry.register(&mesh, None).unwrap();

        fs::remove_file(&mesh).unwrap();
        fs::create_dir(&mesh).unwrap();
        fs::write(mesh.join("inner"), "x").unwrap();

        let err = registry.remove(&mesh).unwrap_err();
        assert!(matches!(err, AssetError::Remove { .. }));
        assert!(registry.get(&mesh).is_some());
    }

    #[test]
    fn remove_unknown_path_is_an_error() {
        let mut registry = AssetRegistry::new();
        assert!(matches!(
            registry.remove(Path::new("/nowhere.obj")),
            Err(AssetError::Unknown(_))
        ));
    }

    #[test]
    fn manifest_round_trip_skips_vanished_files() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("assets.json");
        let kept = dir.path().join("kept.obj");
        let gone = dir.path().join("gone.obj");
        fs::write(&kept, "v 0 0 0").unwrap();
        fs::write(&gone, "v 0 0 0").unwrap();

        let mut registry = AssetRegistry::load(&manifest).unwrap();
        registry.register(&kept, None).unwrap();
        registry.register(&gone, None).unwrap();
        registry.save().unwrap();
        fs::remove_file(&gone).unwrap();

        let reloaded = AssetRegistry::load(&manifest).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.list()[0].path, kept);
    }

    #[test]
    fn export_copies_file() {
        let dir = tempdir().unwrap();
        let mesh = dir.path().join("cat.obj");
        fs::write(&mesh, "v 1 2 3").unwrap();
        let mut registry = AssetRegistry::new();
        registry.register(&mesh, None).unwrap();

        let dest = dir.path().join("export.obj");
        let bytes = registry.export(&mesh, &dest).unwrap();
        assert_eq!(bytes, 7);
        assert_eq!(fs::read_to_string(dest).unwrap(), "v 1 2 3");
    }
}
