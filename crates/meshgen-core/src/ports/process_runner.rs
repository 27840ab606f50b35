//! Process runner trait definition.
//!
//! This port defines the interface for running the external inference
//! program to completion while streaming its output.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::ProcessError;

/// A fully constructed command line.
///
/// The child inherits the parent environment; `env` entries are added on top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute (looked up on `PATH` when not a path).
    pub program: OsString,
    /// Arguments in order.
    pub args: Vec<OsString>,
    /// Extra environment variables.
    pub env: Vec<(OsString, OsString)>,
    /// Working directory, inherited when `None`.
    pub current_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Human-readable command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(OsStr::to_string_lossy)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the external process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "lowercase")]
pub enum ProcessExit {
    /// The process exited on its own with this code.
    ///
    /// On Unix a process killed by signal `N` reports `128 + N`.
    Code(i32),
    /// The process was terminated because the run was cancelled.
    Cancelled,
}

/// Terminal result of one process run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResult {
    pub exit: ProcessExit,
    /// Every output line in arrival order.
    pub lines: Vec<String>,
}

impl ProcessResult {
    pub const fn exited(code: i32, lines: Vec<String>) -> Self {
        Self {
            exit: ProcessExit::Code(code),
            lines,
        }
    }

    pub const fn cancelled(lines: Vec<String>) -> Self {
        Self {
            exit: ProcessExit::Cancelled,
            lines,
        }
    }

    /// Exit code 0 is the only success.
    pub const fn is_success(&self) -> bool {
        matches!(self.exit, ProcessExit::Code(0))
    }

    pub const fn exit_code(&self) -> Option<i32> {
        match self.exit {
            ProcessExit::Code(code) => Some(code),
            ProcessExit::Cancelled => None,
        }
    }
}

/// Runs an external program to completion.
///
/// # Design Rules
///
/// - stdout and stderr are merged into one line stream
/// - lines reach `on_line` (without their terminator) in arrival order,
///   before `run` returns; the callback may borrow caller state
/// - cancelling `cancel` terminates the child; the call still returns
///   `Ok` with [`ProcessExit::Cancelled`]
/// - spawn failures are errors, nonzero exits are not
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        spec: CommandSpec,
        on_line: &(dyn for<'l> Fn(&'l str) + Send + Sync),
        cancel: CancellationToken,
    ) -> Result<ProcessResult, ProcessError>;
}
