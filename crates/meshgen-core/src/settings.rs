//! Settings domain types and validation.
//!
//! Settings come from `MESHGEN_*` environment variables (a `.env` file in the
//! data root is loaded by the binary before resolution). Every field is
//! optional; unset fields fall back to the defaults below.

use serde::{Deserialize, Serialize};

/// Prefix of every environment variable read by [`Settings::from_env`].
pub const ENV_PREFIX: &str = "MESHGEN_";

/// Interpreter used to launch the entry script.
pub const DEFAULT_PYTHON: &str = "python3";

/// Model config passed to the inference program, relative to the checkout.
pub const DEFAULT_MODEL_CONFIG: &str = "configs/instant-mesh-large.yaml";

/// Hugging Face repository holding the weights.
pub const DEFAULT_WEIGHTS_REPO: &str = "TencentARC/InstantMesh";

/// Weight file whose presence marks the environment as ready.
pub const DEFAULT_WEIGHTS_FILE: &str = "instant_mesh_large.ckpt";

/// Seconds between SIGTERM and SIGKILL when cancelling.
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 3;

/// Application settings structure.
///
/// All fields are optional to support partial configuration and graceful defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// InstantMesh checkout directory.
    pub instantmesh_dir: Option<String>,

    /// Python interpreter.
    pub python: Option<String>,

    /// Entry script wrapping the inference program.
    pub entry_script: Option<String>,

    /// Model config path, relative to the checkout.
    pub model_config: Option<String>,

    /// Directory the inference program writes meshes to.
    pub output_dir: Option<String>,

    /// Directory holding thumbnails and the asset manifest.
    pub assets_dir: Option<String>,

    /// Directory for viewport snapshots. Defaults to `<assets_dir>/thumbnails`.
    pub thumbnails_dir: Option<String>,

    /// Hugging Face repository to fetch weights from.
    pub weights_repo: Option<String>,

    /// Weight files to fetch; the first one is the readiness marker.
    pub weights_files: Option<Vec<String>>,

    /// Grace period before a cancelled process is killed.
    pub shutdown_grace_secs: Option<u64>,
}

impl Settings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            python: Some(DEFAULT_PYTHON.to_string()),
            model_config: Some(DEFAULT_MODEL_CONFIG.to_string()),
            weights_repo: Some(DEFAULT_WEIGHTS_REPO.to_string()),
            weights_files: Some(vec![DEFAULT_WEIGHTS_FILE.to_string()]),
            shutdown_grace_secs: Some(DEFAULT_SHUTDOWN_GRACE_SECS),
            ..Self::default()
        }
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a full variable name
    /// (e.g. `MESHGEN_PYTHON`) to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SettingsError> {
        let get = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let shutdown_grace_secs = get("SHUTDOWN_GRACE_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .map_err(|_| SettingsError::InvalidNumber {
                        key: "SHUTDOWN_GRACE_SECS",
                        value: raw,
                    })
            })
            .transpose()?;

        let weights_files = get("WEIGHTS_FILES").map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect::<Vec<_>>()
        });

        let settings = Self {
            instantmesh_dir: get("INSTANTMESH_DIR"),
            python: get("PYTHON"),
            entry_script: get("ENTRY_SCRIPT"),
            model_config: get("MODEL_CONFIG"),
            output_dir: get("OUTPUT_DIR"),
            assets_dir: get("ASSETS_DIR"),
            thumbnails_dir: get("THUMBNAILS_DIR"),
            weights_repo: get("WEIGHTS_REPO"),
            weights_files,
            shutdown_grace_secs,
        };
        validate_settings(&settings)?;
        Ok(settings)
    }

    pub fn effective_python(&self) -> &str {
        self.python.as_deref().unwrap_or(DEFAULT_PYTHON)
    }

    pub fn effective_model_config(&self) -> &str {
        self.model_config.as_deref().unwrap_or(DEFAULT_MODEL_CONFIG)
    }

    pub fn effective_weights_repo(&self) -> &str {
        self.weights_repo.as_deref().unwrap_or(DEFAULT_WEIGHTS_REPO)
    }

    /// Weight files to fetch, never empty.
    pub fn effective_weights_files(&self) -> Vec<String> {
        match &self.weights_files {
            Some(files) if !files.is_empty() => files.clone(),
            _ => vec![DEFAULT_WEIGHTS_FILE.to_string()],
        }
    }

    pub fn effective_shutdown_grace_secs(&self) -> u64 {
        self.shutdown_grace_secs
            .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS)
    }
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("{ENV_PREFIX}{key} must be a whole number, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("Shutdown grace period must be between 1 and 120 seconds, got {0}")]
    InvalidGracePeriod(u64),

    #[error("Weight file name must not contain a path separator: {0}")]
    InvalidWeightFile(String),

    #[error("Python interpreter cannot be empty")]
    EmptyPython,
}

/// Validate settings values.
pub fn validate_settings(settings: &Settings) -> Result<(), SettingsError> {
    if let Some(grace) = settings.shutdown_grace_secs {
        if !(1..=120).contains(&grace) {
            return Err(SettingsError::InvalidGracePeriod(grace));
        }
    }

    if let Some(files) = &settings.weights_files {
        if let Some(bad) = files.iter().find(|f| f.contains(['/', '\\'])) {
            return Err(SettingsError::InvalidWeightFile(bad.clone()));
        }
    }

    if settings
        .python
        .as_ref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(SettingsError::EmptyPython);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::with_defaults();
        assert_eq!(settings.effective_python(), "python3");
        assert_eq!(settings.effective_weights_files(), vec!["instant_mesh_large.ckpt"]);
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn reads_prefixed_variables() {
        let settings = Settings::from_lookup(lookup(&[
            ("MESHGEN_PYTHON", "/usr/bin/python3.11"),
            ("MESHGEN_WEIGHTS_FILES", "a.ckpt, b.bin ,"),
            ("MESHGEN_SHUTDOWN_GRACE_SECS", "2"),
            ("PYTHON", "ignored"),
        ]))
        .unwrap();
        assert_eq!(settings.effective_python(), "/usr/bin/python3.11");
        assert_eq!(settings.effective_weights_files(), vec!["a.ckpt", "b.bin"]);
        assert_eq!(settings.effective_shutdown_grace_secs(), 2);
        assert_eq!(settings.output_dir, None);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let settings = Settings::from_lookup(lookup(&[("MESHGEN_OUTPUT_DIR", "   ")])).unwrap();
        assert_eq!(settings.output_dir, None);
    }

    #[test]
    fn rejects_bad_numbers_and_ranges() {
        let err = Settings::from_lookup(lookup(&[("MESHGEN_SHUTDOWN_GRACE_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidNumber { .. }));

        let err = Settings::from_lookup(lookup(&[("MESHGEN_SHUTDOWN_GRACE_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidGracePeriod(0)));

        let err = Settings::from_lookup(lookup(&[("MESHGEN_WEIGHTS_FILES", "ckpts/x.ckpt")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidWeightFile(_)));
    }
}
