//! InstantMesh model loader.
//!
//! Checks that the checkout and entry script exist and that the weight files
//! are in `<checkout>/ckpts`, fetching missing ones from the Hugging Face Hub.
//! Readiness is remembered per loader instance until `unload`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use meshgen_core::ports::{LoaderError, ModelLoaderPort};
use meshgen_core::{ResolvedPaths, Settings};
use tracing::{debug, info};

/// Source of weight files.
#[async_trait]
pub trait WeightFetcher: Send + Sync {
    /// Fetch `file` from `repo`, returning a local path to its contents.
    async fn fetch(&self, repo: &str, file: &str) -> Result<PathBuf, LoaderError>;
}

/// Downloads through the `hf-hub` cache.
#[derive(Debug, Clone, Default)]
pub struct HfWeightFetcher {
    cache_dir: Option<PathBuf>,
    token: Option<String>,
}

impl HfWeightFetcher {
    pub const fn new(cache_dir: Option<PathBuf>, token: Option<String>) -> Self {
        Self { cache_dir, token }
    }
}

#[async_trait]
impl WeightFetcher for HfWeightFetcher {
    async fn fetch(&self, repo: &str, file: &str) -> Result<PathBuf, LoaderError> {
        let download_err = |reason: String| LoaderError::Download {
            repo: repo.to_string(),
            reason,
        };

        let mut builder = hf_hub::api::sync::ApiBuilder::new().with_progress(false);
        if let Some(token) = &self.token {
            builder = builder.with_token(Some(token.clone()));
        }
        if let Some(cache_dir) = &self.cache_dir {
            builder = builder.with_cache_dir(cache_dir.clone());
        }
        let api = builder
            .build()
            .map_err(|e| download_err(format!("failed to create HF API client: {e}")))?;

        let repo_id = repo.to_string();
        let file_name = file.to_string();
        tokio::task::spawn_blocking(move || {
            api.repo(hf_hub::Repo::with_revision(
                repo_id,
                hf_hub::RepoType::Model,
                "main".to_string(),
            ))
            .get(&file_name)
        })
        .await
        .map_err(|e| download_err(e.to_string()))?
        .map_err(|e| download_err(e.to_string()))
    }
}

/// Prepares an InstantMesh checkout for inference.
pub struct InstantMeshLoader {
    checkout_dir: PathBuf,
    entry_script: PathBuf,
    weights_dir: PathBuf,
    repo: String,
    files: Vec<String>,
    fetcher: Arc<dyn WeightFetcher>,
    ready: AtomicBool,
}

impl InstantMeshLoader {
    pub fn new(settings: &Settings, paths: &ResolvedPaths, fetcher: Arc<dyn WeightFetcher>) -> Self {
        Self {
            checkout_dir: paths.checkout_dir.clone(),
            entry_script: paths.entry_script.clone(),
            weights_dir: paths.weights_dir.clone(),
            repo: settings.effective_weights_repo().to_string(),
            files: settings.effective_weights_files(),
            fetcher,
            ready: AtomicBool::new(false),
        }
    }

    /// Fail with the first missing piece of the installation.
    pub fn check_install(&self) -> Result<(), LoaderError> {
        if !self.checkout_dir.is_dir() {
            return Err(LoaderError::MissingCheckout(self.checkout_dir.clone()));
        }
        if !self.entry_script.is_file() {
            return Err(LoaderError::MissingEntryPoint(self.entry_script.clone()));
        }
        Ok(())
    }

    /// Weight files not yet present in the weights directory.
    pub fn missing_weights(&self) -> Vec<&str> {
        self.files
            .iter()
            .map(String::as_str)
            .filter(|file| !self.weights_dir.join(file).is_file())
            .collect()
    }

    pub fn weights_dir(&self) -> &Path {
        &self.weights_dir
    }

    async fn place_weight(&self, file: &str) -> Result<(), LoaderError> {
        info!(repo = %self.repo, file, "Downloading weights from Hugging Face");
        let fetched = self.fetcher.fetch(&self.repo, file).await?;
        let dest = self.weights_dir.join(file);
        tokio::fs::create_dir_all(&self.weights_dir)
            .await
            .map_err(|e| LoaderError::Io(format!("{}: {e}", self.weights_dir.display())))?;
        tokio::fs::copy(&fetched, &dest)
            .await
            .map_err(|e| LoaderError::Io(format!("{} -> {}: {e}", fetched.display(), dest.display())))?;
        debug!(dest = %dest.display(), "Weight file placed");
        Ok(())
    }
}

#[async_trait]
impl ModelLoaderPort for InstantMeshLoader {
    async fn ensure_ready(&self, low_resource: bool) -> Result<(), LoaderError> {
        if self.ready.load(Ordering::SeqCst) {
            return Ok(());
        }
        debug!(low_resource, checkout = %self.checkout_dir.display(), "Checking InstantMesh install");
        self.check_install()?;

        for file in self.missing_weights() {
            self.place_weight(file).await?;
        }

        self.ready.store(true, Ordering::SeqCst);
        info!("Model environment ready");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn unload(&self) {
        if self.ready.swap(false, Ordering::SeqCst) {
            info!("Model unloaded");
        }
    }
}
