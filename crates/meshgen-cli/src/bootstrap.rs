//! CLI bootstrap - the composition root.
//!
//! The only place where concrete adapters are wired together:
//! - Process runner and loader (via meshgen-runtime)
//! - Generation session with the shared log sink
//! - Terminal viewport (via presentation)
//!
//! Handlers receive the composed `CliContext`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use meshgen_core::ports::ViewportPort;
use meshgen_core::{AssetRegistry, LogSink, ResolvedPaths, Settings, data_root};
use meshgen_runtime::{
    GenerationSession, HfWeightFetcher, InstantMeshLoader, PipelineConfig, TokioProcessRunner,
};
use tracing::debug;

use crate::error::CliError;
use crate::presentation::TerminalViewport;

/// Environment variable holding a Hugging Face token for weight downloads.
pub const HF_TOKEN_ENV: &str = "HF_TOKEN";

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: Settings,
    pub paths: ResolvedPaths,
    /// Token for gated Hugging Face repositories.
    pub hf_token: Option<String>,
}

impl CliConfig {
    /// Resolve settings and paths from the environment.
    pub fn from_env() -> Result<Self> {
        let settings = Settings::from_env().map_err(|e| CliError::Config(e.to_string()))?;
        let root = data_root().map_err(|e| CliError::Config(e.to_string()))?;
        let paths =
            ResolvedPaths::resolve(&settings, &root).map_err(|e| CliError::Config(e.to_string()))?;
        Ok(Self {
            settings,
            paths,
            hf_token: std::env::var(HF_TOKEN_ENV).ok().filter(|t| !t.is_empty()),
        })
    }
}

/// Fully composed application context for CLI commands.
pub struct CliContext {
    pub settings: Settings,
    pub paths: ResolvedPaths,
    /// User-facing log shared with the session.
    pub log: Arc<LogSink>,
    pub loader: Arc<InstantMeshLoader>,
    pub session: GenerationSession,
    pub viewport: Arc<dyn ViewportPort>,
}

impl CliContext {
    /// Open the persisted asset registry.
    pub fn assets(&self) -> Result<AssetRegistry, CliError> {
        Ok(AssetRegistry::load(&self.paths.asset_manifest)?)
    }
}

/// Bootstrap the CLI application.
pub fn bootstrap(config: CliConfig) -> CliContext {
    let CliConfig {
        settings,
        paths,
        hf_token,
    } = config;

    let fetcher = HfWeightFetcher::new(None, hf_token);
    let loader = Arc::new(InstantMeshLoader::new(&settings, &paths, Arc::new(fetcher)));
    let runner = TokioProcessRunner::new()
        .with_grace(Duration::from_secs(settings.effective_shutdown_grace_secs()));
    let log = Arc::new(LogSink::new());
    let pipeline = PipelineConfig::from_settings(&settings, &paths);
    let session = GenerationSession::new(Arc::new(runner), loader.clone(), pipeline)
        .with_log_sink(Arc::clone(&log));

    debug!(data_root = %paths.data_root.display(), "CLI context ready");

    CliContext {
        settings,
        paths,
        log,
        loader,
        session,
        viewport: Arc::new(TerminalViewport::new()),
    }
}
