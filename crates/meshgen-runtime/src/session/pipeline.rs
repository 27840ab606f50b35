//! How a generation invokes the inference program.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use meshgen_core::ports::CommandSpec;
use meshgen_core::{ResolvedPaths, Settings};

use super::milestones::{Milestone, default_milestones};

/// Module search path variable augmented with the checkout.
pub const PYTHONPATH: &str = "PYTHONPATH";

/// Everything needed to build the command line for one input image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Interpreter (or any program) that runs the entry script.
    pub interpreter: OsString,
    pub entry_script: PathBuf,
    pub model_config: PathBuf,
    /// Working directory of the child and extra module search path.
    pub checkout_dir: PathBuf,
    pub output_dir: PathBuf,
    pub milestones: Vec<Milestone>,
}

impl PipelineConfig {
    pub fn from_settings(settings: &Settings, paths: &ResolvedPaths) -> Self {
        Self {
            interpreter: settings.effective_python().into(),
            entry_script: paths.entry_script.clone(),
            model_config: paths.model_config.clone(),
            checkout_dir: paths.checkout_dir.clone(),
            output_dir: paths.output_dir.clone(),
            milestones: default_milestones(),
        }
    }

    /// `<interpreter> <entry-script> <config> <image> --save_video --output_path <dir>`
    pub fn command(&self, image: &Path) -> CommandSpec {
        CommandSpec::new(self.interpreter.clone())
            .arg(&self.entry_script)
            .arg(&self.model_config)
            .arg(image)
            .arg("--save_video")
            .arg("--output_path")
            .arg(&self.output_dir)
            .env(PYTHONPATH, self.python_path(env::var_os(PYTHONPATH)))
            .current_dir(&self.checkout_dir)
    }

    /// `existing` followed by the checkout directory.
    fn python_path(&self, existing: Option<OsString>) -> OsString {
        let mut entries: Vec<PathBuf> = existing
            .as_deref()
            .map(|raw| env::split_paths(raw).collect())
            .unwrap_or_default();
        entries.push(self.checkout_dir.clone());
        env::join_paths(&entries).unwrap_or_else(|_| self.checkout_dir.clone().into_os_string())
    }
}
