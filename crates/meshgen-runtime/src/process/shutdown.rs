//! Termination of a running child with SIGTERM → SIGKILL escalation.
//!
//! Children are spawned as leaders of their own process group, so the
//! signals reach anything they started (an interpreter running a script
//! that forks workers, a shell running a pipeline).

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;
#[cfg(unix)]
use tokio::time::timeout;
#[cfg(unix)]
use tracing::debug;

/// Stop `child` and reap it.
///
/// # Strategy
/// 1. Send SIGTERM to the process group and wait up to `grace`
/// 2. If still running, send SIGKILL to the group
/// 3. Wait for reaping (required to avoid zombies)
///
/// Non-Unix platforms kill immediately.
pub async fn terminate_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        terminate_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    // No PID means the child was already reaped.
    let Some(pid) = child.id() else {
        return child.wait().await;
    };
    let group = Pid::from_raw(i32::try_from(pid).map_err(io::Error::other)?);

    match signal::killpg(group, Signal::SIGTERM) {
        Ok(()) => {}
        Err(Errno::ESRCH) => return child.wait().await,
        Err(e) => return Err(io::Error::other(e)),
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        // Leftover group members would keep the output pipes open.
        kill_group(group);
        return result;
    }

    debug!(pid, grace_ms = grace.as_millis(), "Grace period elapsed, sending SIGKILL");
    kill_group(group);
    match child.try_wait()? {
        Some(status) => Ok(status),
        None => {
            child.start_kill()?;
            child.wait().await
        }
    }
}

#[cfg(unix)]
fn kill_group(group: Pid) {
    match signal::killpg(group, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => debug!(error = %e, "SIGKILL to process group failed"),
    }
}
