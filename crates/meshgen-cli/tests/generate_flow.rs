//! Drives the generate handler against a real session with a shell script
//! standing in for InstantMesh.
#![cfg(unix)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meshgen_cli::CliError;
use meshgen_cli::handlers::generate::{register_artifact, run_generation};
use meshgen_cli::presentation::{GenerationProgress, TerminalViewport};
use meshgen_core::ports::{LoaderError, ModelLoaderPort};
use meshgen_core::{AssetRegistry, FailureKind, GenerationRequest, LogSink, Severity};
use meshgen_runtime::{
    GenerationSession, PipelineConfig, SessionPhase, TokioProcessRunner, default_milestones,
};
use tempfile::TempDir;

const SCRIPT: &str = r#"
name=$(basename "$2")
name=${name%.*}
case "$name" in
  chair)
    echo "Imagining 6 views"
    printf 'v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n' > "$5/chair.obj"
    echo "Mesh saved to $5/chair.obj"
    ;;
  slow)
    echo "started"
    sleep 30
    ;;
esac
"#;

struct ReadyLoader;

#[async_trait]
impl ModelLoaderPort for ReadyLoader {
    async fn ensure_ready(&self, _low_resource: bool) -> Result<(), LoaderError> {
        Ok(())
    }

    fn is_ready(&self) -> bool {
        true
    }

    fn unload(&self) {}
}

fn session(dir: &TempDir, log: &Arc<LogSink>) -> GenerationSession {
    let checkout = dir.path().join("checkout");
    fs::create_dir_all(&checkout).unwrap();
    let script = checkout.join("run.sh");
    fs::write(&script, SCRIPT).unwrap();

    let pipeline = PipelineConfig {
        interpreter: "sh".into(),
        entry_script: script,
        model_config: checkout.join("config.yaml"),
        checkout_dir: checkout,
        output_dir: dir.path().join("outputs"),
        milestones: default_milestones(),
    };
    let runner = TokioProcessRunner::new().with_grace(Duration::from_millis(200));
    GenerationSession::new(Arc::new(runner), Arc::new(ReadyLoader), pipeline)
        .with_log_sink(Arc::clone(log))
}

fn image(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(format!("{name}.png"));
    fs::write(&path, "png").unwrap();
    path
}

#[tokio::test]
async fn completed_generation_is_shown_and_registered() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(LogSink::new());
    let session = session(&dir, &log);
    let request = GenerationRequest::from_image(image(&dir, "chair")).unwrap();

    let artifact = tokio::time::timeout(
        Duration::from_secs(20),
        run_generation(
            &session,
            request,
            &GenerationProgress::hidden(),
            std::future::pending(),
        ),
    )
    .await
    .expect("generation did not finish")
    .unwrap();
    assert!(artifact.ends_with("chair.obj"));

    let manifest = dir.path().join("assets").join("assets.json");
    let mut registry = AssetRegistry::load(&manifest).unwrap();
    let viewport = TerminalViewport::new();
    let record = register_artifact(
        &mut registry,
        &viewport,
        &log,
        &artifact,
        &dir.path().join("assets").join("thumbnails"),
    )
    .unwrap();

    assert_eq!(viewport.current(), Some((3, 1)));
    assert_eq!(record.thumbnail, None);
    assert_eq!(AssetRegistry::load(&manifest).unwrap().len(), 1);
    assert!(
        log.entries()
            .iter()
            .any(|e| e.severity == Severity::Success && e.message == "Generation Complete.")
    );
}

#[tokio::test]
async fn interrupt_cancels_and_waits_for_idle() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(LogSink::new());
    let session = session(&dir, &log);
    let request = GenerationRequest::from_image(image(&dir, "slow")).unwrap();

    let interrupt = tokio::time::sleep(Duration::from_millis(300));
    let err = tokio::time::timeout(
        Duration::from_secs(20),
        run_generation(&session, request, &GenerationProgress::hidden(), interrupt),
    )
    .await
    .expect("cancel did not finish")
    .unwrap_err();

    let CliError::Generation(failure) = &err else {
        panic!("expected a generation failure, got {err:?}");
    };
    assert_eq!(failure.kind, FailureKind::Cancelled);
    assert_eq!(err.exit_code(), 130);
    assert_eq!(session.phase(), SessionPhase::Idle);
}
