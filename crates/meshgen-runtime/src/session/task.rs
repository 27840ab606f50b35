//! The background task behind one generation.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use meshgen_core::ports::{ModelLoaderPort, ProcessExit, ProcessRunner};
use meshgen_core::{GenerationError, GenerationEvent, GenerationRequest, LogSink};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::artifact::resolve_artifact;
use super::milestones::{DONE, INITIALIZING, LOADING_WEIGHTS, MilestoneTracker};
use super::pipeline::PipelineConfig;
use super::{GenerationId, SlotHandle};

pub(super) struct GenerationTask {
    pub(super) id: GenerationId,
    pub(super) request: GenerationRequest,
    pub(super) runner: Arc<dyn ProcessRunner>,
    pub(super) loader: Arc<dyn ModelLoaderPort>,
    pub(super) pipeline: Arc<PipelineConfig>,
    pub(super) log: Option<Arc<LogSink>>,
    pub(super) slot: SlotHandle,
    pub(super) cancel: CancellationToken,
    pub(super) events: UnboundedSender<GenerationEvent>,
}

impl GenerationTask {
    pub(super) async fn run(self) {
        let outcome = self.execute().await;
        // A fired token means the user asked to stop, whatever happened after.
        let outcome = if self.cancel.is_cancelled() {
            Err(GenerationError::Cancelled)
        } else {
            outcome
        };

        let terminal = match &outcome {
            Ok(artifact) => {
                info!(id = %self.id, artifact = %artifact.display(), "Generation complete");
                self.log_with(|log| log.success("Generation Complete."));
                GenerationEvent::completed(artifact.clone())
            }
            Err(GenerationError::Cancelled) => {
                info!(id = %self.id, "Generation cancelled");
                self.log_with(|log| log.warning("Generation cancelled."));
                GenerationEvent::failed(&GenerationError::Cancelled)
            }
            Err(e) => {
                warn!(id = %self.id, error = %e, "Generation failed");
                self.log_with(|log| log.error(format!("Error: {e}")));
                GenerationEvent::failed(e)
            }
        };

        self.slot.release(self.id);
        self.emit(terminal);
    }

    async fn execute(&self) -> Result<PathBuf, GenerationError> {
        self.emit(GenerationEvent::progress(INITIALIZING.0, INITIALIZING.1));

        if !self.request.model.has_pipeline() {
            return Err(GenerationError::UnsupportedModel(
                self.request.model.display_name().to_string(),
            ));
        }
        let image = self
            .request
            .primary_image()
            .ok_or_else(|| GenerationError::InvalidInput("no image supplied".to_string()))?
            .to_path_buf();
        if !image.is_file() {
            return Err(GenerationError::InvalidInput(format!(
                "{} does not exist",
                image.display()
            )));
        }

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Err(GenerationError::Cancelled),
            ready = self.loader.ensure_ready(self.request.low_resource) => ready?,
        }
        self.emit(GenerationEvent::progress(LOADING_WEIGHTS.0, LOADING_WEIGHTS.1));

        let output_dir = &self.pipeline.output_dir;
        tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
            GenerationError::Io(format!("cannot create {}: {e}", output_dir.display()))
        })?;

        let tracker = Mutex::new(MilestoneTracker::new(
            &self.pipeline.milestones,
            LOADING_WEIGHTS.0,
        ));
        let on_line = |line: &str| {
            self.emit(GenerationEvent::log(line));
            self.log_with(|log| log.info(line));
            let reached = tracker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .observe(line);
            if let Some(milestone) = reached {
                self.emit(GenerationEvent::progress(
                    milestone.percent,
                    milestone.message.clone(),
                ));
            }
        };

        let result = self
            .runner
            .run(self.pipeline.command(&image), &on_line, self.cancel.clone())
            .await?;
        match result.exit {
            ProcessExit::Cancelled => return Err(GenerationError::Cancelled),
            ProcessExit::Code(0) => {}
            ProcessExit::Code(code) => return Err(GenerationError::ExitCode(code)),
        }

        let stem = image
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let artifact = resolve_artifact(
            &result.lines,
            &self.pipeline.checkout_dir,
            output_dir,
            &stem,
        )
        .ok_or_else(|| GenerationError::OutputNotLocated {
            dir: output_dir.clone(),
            stem,
        })?;
        debug!(id = %self.id, artifact = %artifact.display(), "Located mesh");

        if self.cancel.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }
        self.emit(GenerationEvent::progress(DONE.0, DONE.1));
        Ok(artifact)
    }

    fn emit(&self, event: GenerationEvent) {
        // The handle may have been dropped; the generation still runs to the end.
        let _ = self.events.send(event);
    }

    fn log_with(&self, f: impl FnOnce(&LogSink)) {
        if let Some(log) = &self.log {
            f(log);
        }
    }
}
