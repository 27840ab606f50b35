//! Generate command handler.
//!
//! Runs one generation, streams its events to the terminal, then shows the
//! mesh and registers it as an asset.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use meshgen_core::ports::ViewportPort;
use meshgen_core::{
    AssetRecord, AssetRegistry, GenerationEvent, GenerationRequest, ImageInput, LogEntry, LogSink,
    ModelId, Severity, ensure_dir, load_mesh,
};
use meshgen_runtime::GenerationSession;
use tokio::sync::broadcast::Receiver;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, warn};

use crate::bootstrap::CliContext;
use crate::commands::GenerateArgs;
use crate::error::CliError;
use crate::presentation::GenerationProgress;
use crate::utils::input::parse_view;

/// Execute the generate command.
///
/// Ctrl-C cancels the running generation; the command still waits for the
/// session to report the cancellation before returning.
pub async fn execute(ctx: &CliContext, args: &GenerateArgs) -> Result<()> {
    let request = build_request(args)?;
    let progress = GenerationProgress::new();
    let mut status = ctx.log.subscribe();

    let outcome = {
        let generation = run_generation(&ctx.session, request, &progress, interrupted());
        tokio::pin!(generation);
        loop {
            tokio::select! {
                outcome = &mut generation => break outcome,
                entry = status.recv() => match entry {
                    Ok(entry) => {
                        echo_status(&progress, &entry);
                    }
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "Status echo lagged"),
                    Err(RecvError::Closed) => break (&mut generation).await,
                },
            }
        }
    };
    drain_status(&progress, &mut status);
    save_last_log(&ctx.log, &ctx.paths.last_log);
    let artifact = outcome?;

    let mut registry = ctx.assets()?;
    let record = register_artifact(
        &mut registry,
        ctx.viewport.as_ref(),
        &ctx.log,
        &artifact,
        &ctx.paths.thumbnails_dir,
    )?;
    drain_status(&progress, &mut status);

    println!();
    println!("✅ Mesh saved: {}", record.path.display());
    match &record.thumbnail {
        Some(thumb) => println!("   Thumbnail: {}", thumb.display()),
        None => println!("   No thumbnail captured"),
    }
    Ok(())
}

/// Turn command-line arguments into a validated request.
pub fn build_request(args: &GenerateArgs) -> Result<GenerationRequest, CliError> {
    let image = if let Some(path) = &args.image {
        Some(ImageInput::Single(path.clone()))
    } else if args.views.is_empty() {
        None
    } else {
        let views = args
            .views
            .iter()
            .map(|raw| parse_view(raw))
            .collect::<Result<Vec<_>, _>>()?;
        Some(ImageInput::multi_view(views)?)
    };

    let model = ModelId::from_str(&args.model)?;
    Ok(GenerationRequest::new(
        args.prompt.clone(),
        image,
        model,
        args.low_vram,
    )?)
}

/// Start a generation and follow it to its terminal event.
///
/// When `interrupt` resolves the generation is cancelled and the loop keeps
/// draining events until the session reports the outcome.
pub async fn run_generation<F>(
    session: &GenerationSession,
    request: GenerationRequest,
    progress: &GenerationProgress,
    interrupt: F,
) -> Result<PathBuf, CliError>
where
    F: Future<Output = ()>,
{
    let mut handle = session.start(request)?;
    let id = handle.id();
    debug!(%id, "Generation started");

    tokio::pin!(interrupt);
    let mut interrupted = false;

    loop {
        let event = tokio::select! {
            event = handle.next_event() => event,
            () = &mut interrupt, if !interrupted => {
                interrupted = true;
                progress.note("Stopping generation...");
                if let Err(e) = session.cancel(id) {
                    debug!(%id, error = %e, "Cancel arrived after the generation ended");
                }
                continue;
            }
        };

        let Some(event) = event else {
            return Err(CliError::Core(format!(
                "Generation {id} ended without a result"
            )));
        };
        progress.handle(&event);

        match event {
            GenerationEvent::Completed { artifact } => return Ok(artifact),
            GenerationEvent::Failed { reason } => return Err(CliError::Generation(reason)),
            GenerationEvent::Progress { .. } | GenerationEvent::Log { .. } => {}
        }
    }
}

/// Show the mesh, try for a thumbnail and record the asset.
///
/// Viewport problems are reported to the log and never block registration.
pub fn register_artifact(
    registry: &mut AssetRegistry,
    viewport: &dyn ViewportPort,
    log: &LogSink,
    artifact: &Path,
    thumbnails_dir: &Path,
) -> Result<AssetRecord, CliError> {
    let thumbnail = show_and_capture(viewport, log, artifact, thumbnails_dir);
    let record = registry.register(artifact, thumbnail)?;
    registry.save()?;
    Ok(record)
}

fn show_and_capture(
    viewport: &dyn ViewportPort,
    log: &LogSink,
    artifact: &Path,
    thumbnails_dir: &Path,
) -> Option<PathBuf> {
    let mesh = match load_mesh(artifact) {
        Ok(mesh) => mesh,
        Err(e) => {
            log.warning(format!("Mesh not shown: {e}"));
            return None;
        }
    };
    if let Err(e) = viewport.update_mesh(&mesh) {
        log.warning(format!("Viewport rejected mesh: {e}"));
        return None;
    }

    let stem = artifact.file_stem()?.to_string_lossy().into_owned();
    if let Err(e) = ensure_dir(thumbnails_dir) {
        warn!(error = %e, "Thumbnail directory unavailable");
        return None;
    }
    let thumbnail = thumbnails_dir.join(format!("{stem}.png"));
    match viewport.capture_snapshot(&thumbnail) {
        Ok(()) => Some(thumbnail),
        Err(e) => {
            debug!(error = %e, "No thumbnail captured");
            None
        }
    }
}

/// Print a log entry above the bar unless it is plain program output.
///
/// Output lines already arrive as `Log` events; only state changes are echoed.
pub fn echo_status(progress: &GenerationProgress, entry: &LogEntry) -> bool {
    if entry.severity == Severity::Info {
        return false;
    }
    progress.note(entry.to_string());
    true
}

/// Echo whatever is already queued on `status`, returning how many entries
/// were printed.
pub fn drain_status(progress: &GenerationProgress, status: &mut Receiver<LogEntry>) -> usize {
    let mut echoed = 0;
    loop {
        match status.try_recv() {
            Ok(entry) => echoed += usize::from(echo_status(progress, &entry)),
            Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => return echoed,
        }
    }
}

/// Persist the rendered log for `meshgen logs`. Failures are only traced.
pub fn save_last_log(log: &LogSink, path: &Path) {
    let mut body = log.render().join("\n");
    body.push('\n');
    let written = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(path, body));
    if let Err(e) = written {
        warn!(path = %path.display(), error = %e, "Failed to save generation log");
    }
}

async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
