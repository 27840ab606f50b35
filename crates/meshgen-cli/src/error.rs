//! CLI-specific error types and mappings.
//!
//! Maps core and runtime errors to exit codes and user-facing messages.

use meshgen_core::{AssetError, CoreError, GenerationFailure, MeshError, RequestError, ViewportError};
use meshgen_runtime::SessionError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Core domain error.
    #[error("{0}")]
    Core(String),

    /// Argument parsing error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The model environment is not usable.
    #[error("Setup error: {0}")]
    Setup(String),

    /// Process execution error.
    #[error("Process error: {0}")]
    Process(String),

    /// A generation ended without a mesh.
    #[error("{}", .0.message)]
    Generation(GenerationFailure),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Invalid arguments
    /// - 64-78: see sysexits.h
    /// - 130: Interrupted (Ctrl-C)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2,
            Self::Io(_) => 74,     // EX_IOERR
            Self::Config(_) => 78, // EX_CONFIG
            Self::Setup(_) => 69,  // EX_UNAVAILABLE
            Self::Process(_) => 71, // EX_OSERR
            Self::Generation(failure) if failure.is_cancelled() => 130,
            Self::Generation(_) => 1,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Process(e) => Self::Process(e.to_string()),
            CoreError::Loader(e) => Self::Setup(e.to_string()),
            CoreError::Asset(e) => Self::from(e),
            CoreError::Settings(e) => Self::Config(e.to_string()),
            CoreError::Path(e) => Self::Config(e.to_string()),
            CoreError::Validation(msg) => Self::Arguments(msg),
            CoreError::Internal(msg) => Self::Core(msg),
        }
    }
}

impl From<AssetError> for CliError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::NotFound(_) | AssetError::Unknown(_) => Self::Arguments(err.to_string()),
            _ => Self::Io(err.to_string()),
        }
    }
}

impl From<MeshError> for CliError {
    fn from(err: MeshError) -> Self {
        match err {
            MeshError::Read { .. } => Self::Io(err.to_string()),
            MeshError::UnsupportedFormat(_) => Self::Arguments(err.to_string()),
            MeshError::Gltf(_) | MeshError::Malformed { .. } => Self::Core(err.to_string()),
        }
    }
}

impl From<ViewportError> for CliError {
    fn from(err: ViewportError) -> Self {
        Self::Core(err.to_string())
    }
}

impl From<RequestError> for CliError {
    fn from(err: RequestError) -> Self {
        Self::Arguments(err.to_string())
    }
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        Self::Core(err.to_string())
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshgen_core::{GenerationError, SettingsError};
    use std::path::PathBuf;

    #[test]
    fn exit_codes_follow_sysexits() {
        assert_eq!(CliError::Arguments("x".into()).exit_code(), 2);
        assert_eq!(
            CliError::from(CoreError::Settings(SettingsError::EmptyPython)).exit_code(),
            78
        );
        assert_eq!(
            CliError::from(AssetError::Remove {
                path: PathBuf::from("a.obj"),
                reason: "busy".into()
            })
            .exit_code(),
            74
        );
    }

    #[test]
    fn cancelled_generation_exits_130() {
        let cancelled = CliError::Generation(GenerationFailure::from(GenerationError::Cancelled));
        assert_eq!(cancelled.exit_code(), 130);

        let failed = CliError::Generation(GenerationFailure::from(GenerationError::ExitCode(137)));
        assert_eq!(failed.exit_code(), 1);
        assert!(failed.to_string().contains("137"));
    }

    #[test]
    fn mesh_errors_map_by_cause() {
        assert_eq!(CliError::from(MeshError::UnsupportedFormat("ply".into())).exit_code(), 2);
        let unreadable = MeshError::Read {
            path: "cat.obj".into(),
            reason: "denied".into(),
        };
        assert_eq!(CliError::from(unreadable).exit_code(), 74);
        assert_eq!(CliError::from(ViewportError::Empty).exit_code(), 1);
    }
}
