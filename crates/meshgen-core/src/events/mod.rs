//! Events emitted by a generation session.
//!
//! The session produces an ordered stream of these for each generation:
//! any number of `Progress` and `Log` events interleaved in emission order,
//! followed by exactly one terminal `Completed` or `Failed`.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "progress", "percent": 30, "message": "Loading model weights" }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::{LoaderError, ProcessError};

/// Why a generation failed, grouped by who has to act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Missing checkout, entry script, input file or weights.
    Setup,
    /// The program could not be started or exited nonzero.
    Process,
    /// The program succeeded but its output could not be found.
    Resolution,
    /// The user stopped the generation.
    Cancelled,
}

/// Every way a generation can end without an artifact.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Valid input image required: {0}")]
    InvalidInput(String),

    #[error("No pipeline available for model {0}")]
    UnsupportedModel(String),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Spawn(#[from] ProcessError),

    #[error("InstantMesh exited with code {0}. Check logs.")]
    ExitCode(i32),

    #[error("Mesh generation finished but output file not found in {dir} (expected a name containing '{stem}')")]
    OutputNotLocated { dir: PathBuf, stem: String },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(String),
}

impl GenerationError {
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidInput(_) | Self::UnsupportedModel(_) | Self::Loader(_) | Self::Io(_) => {
                FailureKind::Setup
            }
            Self::Spawn(_) | Self::ExitCode(_) => FailureKind::Process,
            Self::OutputNotLocated { .. } => FailureKind::Resolution,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }

    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitCode(code) => Some(*code),
            _ => None,
        }
    }
}

/// Serializable summary of a [`GenerationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl GenerationFailure {
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, FailureKind::Cancelled)
    }
}

impl From<&GenerationError> for GenerationFailure {
    fn from(err: &GenerationError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            exit_code: err.exit_code(),
        }
    }
}

impl From<GenerationError> for GenerationFailure {
    fn from(err: GenerationError) -> Self {
        Self::from(&err)
    }
}

/// One event from a running generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GenerationEvent {
    /// A coarse milestone. Percentages are placeholders, not work estimates.
    Progress { percent: u8, message: String },

    /// One line of output from the external program.
    Log { line: String },

    /// The mesh was produced and located.
    Completed { artifact: PathBuf },

    /// The generation ended without a mesh.
    Failed { reason: GenerationFailure },
}

impl GenerationEvent {
    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        Self::Progress {
            percent,
            message: message.into(),
        }
    }

    pub fn log(line: impl Into<String>) -> Self {
        Self::Log { line: line.into() }
    }

    pub fn completed(artifact: impl Into<PathBuf>) -> Self {
        Self::Completed {
            artifact: artifact.into(),
        }
    }

    pub fn failed(error: &GenerationError) -> Self {
        Self::Failed {
            reason: error.into(),
        }
    }

    /// Whether this is the last event of a generation.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Get the event name for wire protocols.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "generation:progress",
            Self::Log { .. } => "generation:log",
            Self::Completed { .. } => "generation:completed",
            Self::Failed { .. } => "generation:failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = GenerationEvent::progress(30, "Loading model weights");
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"progress\""));
        assert!(json.contains("\"percent\":30"));
    }

    #[test]
    fn failure_carries_exit_code() {
        let event = GenerationEvent::failed(&GenerationError::ExitCode(137));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"process\""));
        assert!(json.contains("\"exitCode\":137"));
        assert!(json.contains("137"));
        assert!(event.is_terminal());
    }

    #[test]
    fn failure_kinds_follow_taxonomy() {
        let setup = GenerationError::Loader(LoaderError::MissingCheckout("/x".into()));
        assert_eq!(setup.kind(), FailureKind::Setup);
        let spawn = GenerationError::Spawn(ProcessError::NotFound("python".into()));
        assert_eq!(spawn.kind(), FailureKind::Process);
        let resolution = GenerationError::OutputNotLocated {
            dir: "/out".into(),
            stem: "cat".into(),
        };
        assert_eq!(resolution.kind(), FailureKind::Resolution);
        assert!(GenerationFailure::from(GenerationError::Cancelled).is_cancelled());
    }

    #[test]
    fn event_names_are_stable() {
        let cases = [
            (GenerationEvent::progress(10, "x"), "generation:progress"),
            (GenerationEvent::log("x"), "generation:log"),
            (GenerationEvent::completed("/a.obj"), "generation:completed"),
            (
                GenerationEvent::failed(&GenerationError::Cancelled),
                "generation:failed",
            ),
        ];
        for (event, expected) in cases {
            assert_eq!(event.event_name(), expected);
        }
    }
}
