//! Line readers for child output (non-UTF8-safe).
//!
//! The inference program and the native libraries it loads can emit
//! non-UTF8 bytes. `BufReader::lines()` would stop on the first invalid
//! sequence, so lines are read byte-wise and decoded lossily.

use std::io::{self, PipeReader};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// Read the pipe shared by a child's stdout and stderr.
#[cfg(unix)]
pub fn spawn_merged_reader(
    pipe: PipeReader,
    tx: UnboundedSender<String>,
) -> io::Result<JoinHandle<()>> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe::Receiver;

    let receiver = Receiver::from_owned_fd(OwnedFd::from(pipe))?;
    Ok(spawn_line_reader(receiver, "output", tx))
}

/// Read the pipe shared by a child's stdout and stderr.
///
/// Anonymous pipes cannot be registered with the reactor here, so the read
/// loop runs on the blocking pool.
#[cfg(not(unix))]
pub fn spawn_merged_reader(
    pipe: PipeReader,
    tx: UnboundedSender<String>,
) -> io::Result<JoinHandle<()>> {
    use std::io::BufRead;

    Ok(tokio::task::spawn_blocking(move || {
        let mut reader = io::BufReader::new(pipe);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(decode_line(&mut buf)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Output reader exiting due to read error");
                    break;
                }
            }
        }
    }))
}

/// Strip `\n` and a preceding `\r`, then decode lossily.
fn decode_line(buf: &mut Vec<u8>) -> String {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    String::from_utf8_lossy(buf).into_owned()
}

/// Forward every line of `stream` to `tx` until EOF.
///
/// A final line without a terminator is still delivered. Only `\n` and a
/// preceding `\r` are stripped.
pub fn spawn_line_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    stream_type: &'static str,
    tx: UnboundedSender<String>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(decode_line(&mut buf)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(%stream_type, error = %e, "Output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(%stream_type, "Output reader task exiting");
    })
}
