//! Tokio-backed implementation of the `ProcessRunner` port.

use std::io::{self, PipeReader};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use meshgen_core::ports::{CommandSpec, ProcessError, ProcessResult, ProcessRunner};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::shutdown::terminate_child;
use super::stream::spawn_merged_reader;

/// Default time a cancelled process gets between SIGTERM and SIGKILL.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(3);

/// How long output is still collected after a cancelled process was reaped.
const DRAIN_AFTER_CANCEL: Duration = Duration::from_secs(1);

/// Runs commands as tokio child processes with merged, line-wise output.
#[derive(Debug, Clone)]
pub struct TokioProcessRunner {
    grace: Duration,
}

impl TokioProcessRunner {
    pub const fn new() -> Self {
        Self {
            grace: DEFAULT_GRACE,
        }
    }

    /// Use a different SIGTERM → SIGKILL grace period.
    #[must_use]
    pub const fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub const fn grace(&self) -> Duration {
        self.grace
    }

    /// Spawn the child with stdout and stderr sharing one pipe, so the
    /// returned reader yields output in the order the program wrote it.
    fn spawn(spec: &CommandSpec) -> Result<(Child, PipeReader), ProcessError> {
        let (reader, writer) = io::pipe().map_err(|e| spawn_error(spec, &e))?;
        let stderr_writer = writer.try_clone().map_err(|e| spawn_error(spec, &e))?;

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer)
            .kill_on_drop(true);
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| spawn_error(spec, &e))?;
        // `command` owns the parent's copies of the write end; dropping it
        // lets the reader see EOF once the child side closes.
        drop(command);
        Ok((child, reader))
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        spec: CommandSpec,
        on_line: &(dyn for<'l> Fn(&'l str) + Send + Sync),
        cancel: CancellationToken,
    ) -> Result<ProcessResult, ProcessError> {
        info!(command = %spec.display(), "Starting process");
        let (mut child, output) = Self::spawn(&spec)?;
        let pid = child.id();

        // The reader owns the only sender, so the channel closes at EOF.
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        if let Err(e) = spawn_merged_reader(output, tx) {
            self.stop(&mut child, pid).await?;
            return Err(ProcessError::SpawnFailed {
                program: spec.program.to_string_lossy().into_owned(),
                reason: format!("cannot read output: {e}"),
            });
        }

        let mut lines = Vec::new();
        let mut deliver = |line: String| {
            on_line(&line);
            lines.push(line);
        };

        // Drain output first; the exit status is only meaningful afterwards.
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    self.stop(&mut child, pid).await?;
                    let _ = tokio::time::timeout(DRAIN_AFTER_CANCEL, async {
                        while let Some(line) = rx.recv().await {
                            deliver(line);
                        }
                    })
                    .await;
                    return Ok(ProcessResult::cancelled(lines));
                }
                line = rx.recv() => match line {
                    Some(line) => deliver(line),
                    None => break,
                },
            }
        }

        let status = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                self.stop(&mut child, pid).await?;
                return Ok(ProcessResult::cancelled(lines));
            }
            status = child.wait() => status.map_err(|e| ProcessError::WaitFailed(e.to_string()))?,
        };

        let code = exit_code(status);
        debug!(?pid, code, lines = lines.len(), "Process exited");
        Ok(ProcessResult::exited(code, lines))
    }
}

impl TokioProcessRunner {
    async fn stop(&self, child: &mut Child, pid: Option<u32>) -> Result<(), ProcessError> {
        warn!(?pid, "Cancellation requested, terminating process");
        terminate_child(child, self.grace)
            .await
            .map(|status| debug!(?pid, ?status, "Cancelled process reaped"))
            .map_err(|e| ProcessError::WaitFailed(e.to_string()))
    }
}

fn spawn_error(spec: &CommandSpec, err: &io::Error) -> ProcessError {
    let program = spec.program.to_string_lossy().into_owned();
    if err.kind() == io::ErrorKind::NotFound {
        ProcessError::NotFound(program)
    } else {
        ProcessError::SpawnFailed {
            program,
            reason: err.to_string(),
        }
    }
}

/// Exit code, with death by signal `N` reported as `128 + N` on Unix.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
