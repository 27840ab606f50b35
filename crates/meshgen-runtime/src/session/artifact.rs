//! Locating the mesh a successful run produced.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Extensions recognized as mesh output; each one can be loaded for display.
pub const MESH_EXTENSIONS: &[&str] = &["obj", "glb"];

/// Prefix of the line announcing where the mesh was written.
pub const ANNOUNCE_PREFIX: &str = "Mesh saved to";

/// Deepest level below the output directory that is searched.
const MAX_SCAN_DEPTH: usize = 4;

/// The path from the last `Mesh saved to <path>` line that names an
/// existing file. Relative paths are taken relative to `working_dir`.
pub fn announced_artifact(lines: &[String], working_dir: &Path) -> Option<PathBuf> {
    lines.iter().rev().find_map(|line| {
        let raw = line.split_once(ANNOUNCE_PREFIX)?.1.trim();
        let raw = raw.trim_start_matches(':').trim();
        if raw.is_empty() {
            return None;
        }
        let path = working_dir.join(raw);
        path.is_file().then_some(path)
    })
}

/// First file below `output_dir`, in name order, whose name contains `stem`
/// and whose extension is a mesh extension.
pub fn scan_output_dir(output_dir: &Path, stem: &str) -> Option<PathBuf> {
    WalkDir::new(output_dir)
        .max_depth(MAX_SCAN_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| is_mesh_named(entry.path(), stem))
        .map(walkdir::DirEntry::into_path)
}

/// Resolve the artifact: the announced path wins over a directory scan.
pub fn resolve_artifact(
    lines: &[String],
    working_dir: &Path,
    output_dir: &Path,
    stem: &str,
) -> Option<PathBuf> {
    if let Some(path) = announced_artifact(lines, working_dir) {
        debug!(path = %path.display(), "Using announced mesh path");
        return Some(path);
    }
    scan_output_dir(output_dir, stem)
}

fn is_mesh_named(path: &Path, stem: &str) -> bool {
    let has_mesh_ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MESH_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    has_mesh_ext
        && path
            .file_name()
            .is_some_and(|name| name.to_string_lossy().contains(stem))
}
