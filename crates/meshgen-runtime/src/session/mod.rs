//! Single-slot generation session.
//!
//! A `GenerationSession` owns the "is a generation running" slot. `start`
//! claims it and spawns one background task per generation; the task reports
//! through an event channel and hands the slot back before its terminal event.
//!
//! ```text
//! Idle --start--> Running --cancel--> Stopping
//!   ^                |                   |
//!   +----finish------+-------finish------+
//! ```

mod artifact;
mod milestones;
mod pipeline;
mod task;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use meshgen_core::ports::{ModelLoaderPort, ProcessRunner};
use meshgen_core::{GenerationEvent, GenerationRequest, LogSink};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use artifact::{ANNOUNCE_PREFIX, MESH_EXTENSIONS, resolve_artifact, scan_output_dir};
pub use milestones::{Milestone, MilestoneTracker, default_milestones};
pub use pipeline::{PYTHONPATH, PipelineConfig};

use task::GenerationTask;

/// Identifies one generation started on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GenerationId(u64);

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where the slot is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    #[default]
    Idle,
    Running,
    Stopping,
}

/// Errors from session control calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("A generation is already running")]
    Busy,

    #[error("Generation {0} is not running")]
    NotRunning(GenerationId),
}

#[derive(Debug)]
struct Active {
    id: GenerationId,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
struct Slot {
    phase: SessionPhase,
    active: Option<Active>,
}

/// Shared slot, locked for every check-and-set.
#[derive(Debug, Clone, Default)]
pub(crate) struct SlotHandle(Arc<Mutex<Slot>>);

impl SlotHandle {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the slot to `Idle` if `id` still holds it.
    pub(crate) fn release(&self, id: GenerationId) {
        let mut slot = self.lock();
        if slot.active.as_ref().is_some_and(|active| active.id == id) {
            slot.active = None;
            slot.phase = SessionPhase::Idle;
        }
    }
}

/// Receiving end of one generation.
#[derive(Debug)]
pub struct GenerationHandle {
    id: GenerationId,
    events: mpsc::UnboundedReceiver<GenerationEvent>,
}

impl GenerationHandle {
    pub const fn id(&self) -> GenerationId {
        self.id
    }

    /// Next event, or `None` after the terminal event was received.
    pub async fn next_event(&mut self) -> Option<GenerationEvent> {
        self.events.recv().await
    }

    /// Consume events until the terminal one, returning all of them.
    pub async fn collect(mut self) -> Vec<GenerationEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event().await {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                break;
            }
        }
        events
    }
}

/// Runs at most one generation at a time.
pub struct GenerationSession {
    runner: Arc<dyn ProcessRunner>,
    loader: Arc<dyn ModelLoaderPort>,
    pipeline: Arc<PipelineConfig>,
    log: Option<Arc<LogSink>>,
    slot: SlotHandle,
    next_id: AtomicU64,
}

impl GenerationSession {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        loader: Arc<dyn ModelLoaderPort>,
        pipeline: PipelineConfig,
    ) -> Self {
        Self {
            runner,
            loader,
            pipeline: Arc::new(pipeline),
            log: None,
            slot: SlotHandle::default(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Mirror output lines and state changes into `log`.
    #[must_use]
    pub fn with_log_sink(mut self, log: Arc<LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn pipeline(&self) -> &PipelineConfig {
        &self.pipeline
    }

    /// Claim the slot and start generating in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, request: GenerationRequest) -> Result<GenerationHandle, SessionError> {
        let (id, cancel) = {
            let mut slot = self.slot.lock();
            if slot.phase != SessionPhase::Idle {
                return Err(SessionError::Busy);
            }
            let id = GenerationId(self.next_id.fetch_add(1, Ordering::Relaxed));
            let cancel = CancellationToken::new();
            slot.phase = SessionPhase::Running;
            slot.active = Some(Active {
                id,
                cancel: cancel.clone(),
            });
            (id, cancel)
        };

        info!(%id, model = request.model.display_name(), "Generation started");
        if let Some(log) = &self.log {
            log.info("Starting generation...");
        }

        let (tx, events) = mpsc::unbounded_channel();
        let task = GenerationTask {
            id,
            request,
            runner: Arc::clone(&self.runner),
            loader: Arc::clone(&self.loader),
            pipeline: Arc::clone(&self.pipeline),
            log: self.log.clone(),
            slot: self.slot.clone(),
            cancel,
            events: tx,
        };
        tokio::spawn(task.run());

        Ok(GenerationHandle { id, events })
    }

    /// Request that generation `id` stop.
    ///
    /// The child process is terminated; the handle still receives a terminal
    /// `Failed` event once the slot is back to `Idle`. Cancelling twice is
    /// harmless.
    pub fn cancel(&self, id: GenerationId) -> Result<(), SessionError> {
        let mut slot = self.slot.lock();
        let Some(active) = slot.active.as_ref().filter(|active| active.id == id) else {
            return Err(SessionError::NotRunning(id));
        };
        active.cancel.cancel();
        if slot.phase == SessionPhase::Running {
            slot.phase = SessionPhase::Stopping;
            warn!(%id, "Stopping generation");
            if let Some(log) = &self.log {
                log.warning("Stopping generation...");
            }
        }
        Ok(())
    }

    /// Cancel whatever is running. Returns the cancelled id, if any.
    pub fn cancel_active(&self) -> Option<GenerationId> {
        let id = self.slot.lock().active.as_ref().map(|active| active.id)?;
        self.cancel(id).ok().map(|()| id)
    }

    pub fn phase(&self) -> SessionPhase {
        self.slot.lock().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() != SessionPhase::Idle
    }
}

impl fmt::Debug for GenerationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationSession")
            .field("phase", &self.phase())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
