//! Resolve every location the application touches from `Settings`.

use std::fmt;
use std::path::{Path, PathBuf};

use super::PathError;
use super::platform::normalize_user_path;
use crate::settings::Settings;

/// File name of the persisted asset list inside the assets directory.
pub const ASSET_MANIFEST_FILE: &str = "assets.json";

/// File name of the optional `.env` file inside the data root.
pub const ENV_FILE: &str = ".env";

/// Where the rendered log of the most recent generation is kept.
pub const LAST_LOG_FILE: &str = "logs/last_generation.log";

/// All resolved paths captured in a single struct.
///
/// Used by the runtime to build the inference command and by the CLI
/// `paths` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Root directory for application data
    pub data_root: PathBuf,
    /// InstantMesh checkout
    pub checkout_dir: PathBuf,
    /// Script launched by the interpreter
    pub entry_script: PathBuf,
    /// Model config handed to the entry script
    pub model_config: PathBuf,
    /// Where the inference program writes meshes
    pub output_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub thumbnails_dir: PathBuf,
    pub asset_manifest: PathBuf,
    /// Where weight files are expected (`<checkout>/ckpts`)
    pub weights_dir: PathBuf,
    pub env_file: PathBuf,
    pub last_log: PathBuf,
}

impl ResolvedPaths {
    /// Resolve against `data_root`, letting any path set in `settings` win.
    ///
    /// Relative settings are taken relative to the working directory, except
    /// the model config which is relative to the checkout.
    pub fn resolve(settings: &Settings, data_root: &Path) -> Result<Self, PathError> {
        let pick = |value: Option<&String>, fallback: PathBuf| -> Result<PathBuf, PathError> {
            value.map_or(Ok(fallback), |raw| normalize_user_path(raw))
        };

        let checkout_dir = pick(
            settings.instantmesh_dir.as_ref(),
            data_root.join("InstantMesh"),
        )?;
        let entry_script = pick(settings.entry_script.as_ref(), checkout_dir.join("run.py"))?;
        let model_config = checkout_dir.join(settings.effective_model_config());
        let output_dir = pick(settings.output_dir.as_ref(), data_root.join("outputs"))?;
        let assets_dir = pick(settings.assets_dir.as_ref(), data_root.join("assets"))?;
        let thumbnails_dir = pick(
            settings.thumbnails_dir.as_ref(),
            assets_dir.join("thumbnails"),
        )?;

        Ok(Self {
            data_root: data_root.to_path_buf(),
            weights_dir: checkout_dir.join("ckpts"),
            asset_manifest: assets_dir.join(ASSET_MANIFEST_FILE),
            env_file: data_root.join(ENV_FILE),
            last_log: data_root.join(LAST_LOG_FILE),
            checkout_dir,
            entry_script,
            model_config,
            output_dir,
            assets_dir,
            thumbnails_dir,
        })
    }

    /// Directories whose files are removed by a cache cleanup.
    pub fn cache_dirs(&self) -> [&Path; 2] {
        [self.output_dir.as_path(), self.thumbnails_dir.as_path()]
    }
}

impl fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data_root = {}", self.data_root.display())?;
        writeln!(f, "checkout_dir = {}", self.checkout_dir.display())?;
        writeln!(f, "entry_script = {}", self.entry_script.display())?;
        writeln!(f, "model_config = {}", self.model_config.display())?;
        writeln!(f, "weights_dir = {}", self.weights_dir.display())?;
        writeln!(f, "output_dir = {}", self.output_dir.display())?;
        writeln!(f, "assets_dir = {}", self.assets_dir.display())?;
        writeln!(f, "thumbnails_dir = {}", self.thumbnails_dir.display())?;
        writeln!(f, "asset_manifest = {}", self.asset_manifest.display())?;
        writeln!(f, "env_file = {}", self.env_file.display())?;
        write!(f, "last_log = {}", self.last_log.display())
    }
}
