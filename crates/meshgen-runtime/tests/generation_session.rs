//! End-to-end tests for `GenerationSession` with a shell script standing in
//! for the inference program.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use meshgen_core::ports::{LoaderError, ModelLoaderPort};
use meshgen_core::{
    FailureKind, GenerationEvent, GenerationRequest, ImageInput, LogSink, ModelId,
};
use meshgen_runtime::{
    GenerationSession, PipelineConfig, SessionError, SessionPhase, TokioProcessRunner,
    default_milestones,
};
use tempfile::TempDir;

/// Script arguments: $1 config, $2 image, $3 --save_video, $4 --output_path, $5 dir.
const SCRIPT: &str = r#"
name=$(basename "$2")
name=${name%.*}
case "$name" in
  cat)
    echo "loading weights"
    echo "step 1/10"
    ;;
  crash)
    echo "loading weights"
    kill -9 $$
    ;;
  slow)
    echo "started"
    sleep 30
    ;;
  milestones)
    echo "Imagining 6 views"
    echo "Mesh saved to $5/milestones_out.obj"
    : > "$5/milestones_out.obj"
    ;;
  empty)
    echo "nothing written"
    ;;
esac
"#;

enum LoaderBehavior {
    Ready,
    Fail,
    Hang,
}

struct FakeLoader(LoaderBehavior);

#[async_trait]
impl ModelLoaderPort for FakeLoader {
    async fn ensure_ready(&self, _low_resource: bool) -> Result<(), LoaderError> {
        match self.0 {
            LoaderBehavior::Ready => Ok(()),
            LoaderBehavior::Fail => Err(LoaderError::MissingCheckout(PathBuf::from("/nowhere"))),
            LoaderBehavior::Hang => std::future::pending().await,
        }
    }

    fn is_ready(&self) -> bool {
        matches!(self.0, LoaderBehavior::Ready)
    }

    fn unload(&self) {}
}

struct Fixture {
    dir: TempDir,
    session: GenerationSession,
    log: Arc<LogSink>,
}

impl Fixture {
    fn new(loader: LoaderBehavior) -> Self {
        let dir = tempfile::tempdir().unwrap();
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
        let log = Arc::new(LogSink::new());
        let runner = TokioProcessRunner::new().with_grace(Duration::from_millis(200));
        let session = GenerationSession::new(Arc::new(runner), Arc::new(FakeLoader(loader)), pipeline)
            .with_log_sink(Arc::clone(&log));

        Self { dir, session, log }
    }

    fn image(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(format!("{name}.png"));
        fs::write(&path, "png").unwrap();
        path
    }

    fn output_dir(&self) -> &Path {
        &self.session.pipeline().output_dir
    }
}

async fn run_to_end(fixture: &Fixture, request: GenerationRequest) -> Vec<GenerationEvent> {
    let handle = fixture.session.start(request).unwrap();
    tokio::time::timeout(Duration::from_secs(20), handle.collect())
        .await
        .expect("generation did not finish")
}

fn logs(events: &[GenerationEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            GenerationEvent::Log { line } => Some(line.as_str()),
            _ => None,
        })
        .collect()
}

fn progress(events: &[GenerationEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|event| match event {
            GenerationEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn successful_run_logs_lines_then_completes() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let image = fixture.image("cat");
    fs::create_dir_all(fixture.output_dir()).unwrap();
    let expected = fixture.output_dir().join("cat_mesh.obj");
    fs::write(&expected, "v 0 0 0").unwrap();

    let events = run_to_end(&fixture, GenerationRequest::from_image(&image).unwrap()).await;

    assert_eq!(logs(&events), vec!["loading weights", "step 1/10"]);
    assert_eq!(
        events.last(),
        Some(&GenerationEvent::Completed { artifact: expected })
    );
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(progress(&events), vec![10, 30, 100]);
    assert_eq!(fixture.session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn killed_process_fails_with_exit_code() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let image = fixture.image("crash");

    let events = run_to_end(&fixture, GenerationRequest::from_image(&image).unwrap()).await;

    assert!(!events.iter().any(|e| matches!(e, GenerationEvent::Completed { .. })));
    let Some(GenerationEvent::Failed { reason }) = events.last() else {
        panic!("expected a failure, got {events:?}");
    };
    assert_eq!(reason.kind, FailureKind::Process);
    assert_eq!(reason.exit_code, Some(137));
    assert!(reason.message.contains("137"));
    assert_eq!(fixture.session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn milestones_are_interleaved_with_their_lines() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let image = fixture.image("milestones");

    let events = run_to_end(&fixture, GenerationRequest::from_image(&image).unwrap()).await;

    assert_eq!(progress(&events), vec![10, 30, 60, 90, 100]);
    let imagining = events
        .iter()
        .position(|e| matches!(e, GenerationEvent::Log { line } if line.starts_with("Imagining")))
        .unwrap();
    assert_eq!(events[imagining + 1], GenerationEvent::progress(60, "Generating geometry"));
    assert_eq!(
        events.last(),
        Some(&GenerationEvent::completed(
            fixture.output_dir().join("milestones_out.obj")
        ))
    );
}

#[tokio::test]
async fn second_start_is_rejected_while_running() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let slow = fixture.image("slow");
    let cat = fixture.image("cat");

    let mut first = fixture.session.start(GenerationRequest::from_image(&slow).unwrap()).unwrap();
    let second = fixture.session.start(GenerationRequest::from_image(&cat).unwrap());
    assert!(matches!(second, Err(SessionError::Busy)));
    assert!(fixture.session.is_running());

    // Wait for the child to be running, then stop it.
    while let Some(event) = first.next_event().await {
        if matches!(&event, GenerationEvent::Log { line } if line == "started") {
            break;
        }
    }
    fixture.session.cancel(first.id()).unwrap();
    assert_eq!(fixture.session.phase(), SessionPhase::Stopping);

    let rest = tokio::time::timeout(Duration::from_secs(10), first.collect())
        .await
        .expect("cancelled generation did not finish");
    let Some(GenerationEvent::Failed { reason }) = rest.last() else {
        panic!("expected cancellation, got {rest:?}");
    };
    assert!(reason.is_cancelled());
    assert_eq!(fixture.session.phase(), SessionPhase::Idle);

    // The slot is free again.
    let handle = fixture.session.start(GenerationRequest::from_image(&cat).unwrap());
    assert!(handle.is_ok());
}

#[tokio::test]
async fn cancel_interrupts_a_hanging_loader() {
    let fixture = Fixture::new(LoaderBehavior::Hang);
    let image = fixture.image("cat");

    let handle = fixture.session.start(GenerationRequest::from_image(&image).unwrap()).unwrap();
    assert_eq!(fixture.session.cancel_active(), Some(handle.id()));

    let events = tokio::time::timeout(Duration::from_secs(5), handle.collect())
        .await
        .unwrap();
    assert!(matches!(
        events.last(),
        Some(GenerationEvent::Failed { reason }) if reason.is_cancelled()
    ));
    assert!(!fixture.session.is_running());
}

#[tokio::test]
async fn cancel_of_unknown_generation_is_rejected() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let image = fixture.image("cat");
    let handle = fixture.session.start(GenerationRequest::from_image(&image).unwrap()).unwrap();
    let id = handle.id();
    let _ = handle.collect().await;

    assert_eq!(fixture.session.cancel(id), Err(SessionError::NotRunning(id)));
    assert_eq!(fixture.session.cancel_active(), None);
}

#[tokio::test]
async fn loader_failure_is_a_setup_error() {
    let fixture = Fixture::new(LoaderBehavior::Fail);
    let image = fixture.image("cat");

    let events = run_to_end(&fixture, GenerationRequest::from_image(&image).unwrap()).await;

    let Some(GenerationEvent::Failed { reason }) = events.last() else {
        panic!("expected a failure, got {events:?}");
    };
    assert_eq!(reason.kind, FailureKind::Setup);
    assert!(reason.message.contains("InstantMesh repository not found"));
    assert_eq!(progress(&events), vec![10]);
}

#[tokio::test]
async fn missing_output_is_a_resolution_error() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let image = fixture.image("empty");

    let events = run_to_end(&fixture, GenerationRequest::from_image(&image).unwrap()).await;

    let Some(GenerationEvent::Failed { reason }) = events.last() else {
        panic!("expected a failure, got {events:?}");
    };
    assert_eq!(reason.kind, FailureKind::Resolution);
    assert_eq!(fixture.session.phase(), SessionPhase::Idle);
}

#[tokio::test]
async fn missing_input_image_is_a_setup_error() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let request = GenerationRequest::from_image(fixture.dir.path().join("absent.png")).unwrap();

    let events = run_to_end(&fixture, request).await;

    let Some(GenerationEvent::Failed { reason }) = events.last() else {
        panic!("expected a failure, got {events:?}");
    };
    assert_eq!(reason.kind, FailureKind::Setup);
    assert!(reason.message.starts_with("Valid input image required"));
}

#[tokio::test]
async fn models_without_a_pipeline_are_rejected() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let image = fixture.image("cat");
    let request = GenerationRequest::new(
        "",
        Some(ImageInput::Single(image)),
        ModelId::Hunyuan3dV2,
        false,
    )
    .unwrap();

    let events = run_to_end(&fixture, request).await;

    let Some(GenerationEvent::Failed { reason }) = events.last() else {
        panic!("expected a failure, got {events:?}");
    };
    assert_eq!(reason.kind, FailureKind::Setup);
}

#[tokio::test]
async fn log_sink_mirrors_output_in_order() {
    let fixture = Fixture::new(LoaderBehavior::Ready);
    let image = fixture.image("cat");
    fs::create_dir_all(fixture.output_dir()).unwrap();
    fs::write(fixture.output_dir().join("cat.obj"), "").unwrap();

    run_to_end(&fixture, GenerationRequest::from_image(&image).unwrap()).await;

    let messages: Vec<String> = fixture.log.entries().into_iter().map(|e| e.message).collect();
    assert_eq!(
        messages,
        vec![
            "Starting generation...",
            "loading weights",
            "step 1/10",
            "Generation Complete.",
        ]
    );
}
