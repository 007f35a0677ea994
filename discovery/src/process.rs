//! Child process execution for discovery runs.
//!
//! The runner knows nothing about test frameworks: it spawns one
//! process, drains both output streams into bounded buffers, and hands
//! the raw text plus exit status back. A non-zero exit code is not an
//! error here; the framework's parser decides what it means.

use crate::args::Invocation;
use crate::error::{DiscoveryError, DiscoveryResult};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Captured output of one completed child process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

impl ProcessOutput {
    pub(crate) fn has_text(&self) -> bool {
        !self.stdout.trim().is_empty() || !self.stderr.trim().is_empty()
    }
}

/// Executes discovery invocations. The engine talks to processes only
/// through this trait so tests can substitute a scripted runner.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `invocation` in `cwd`, capturing at most `output_cap` bytes
    /// per stream. Cancellation terminates the child and fails with
    /// [`DiscoveryError::Cancelled`]; partial output is never returned
    /// as if it were a completed run.
    async fn run(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        output_cap: usize,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<ProcessOutput>;
}

/// Production runner backed by `tokio::process`.
#[derive(Debug, Default)]
pub struct TokioRunner;

impl TokioRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        output_cap: usize,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<ProcessOutput> {
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }

        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            cwd = %cwd.display(),
            "spawning discovery process"
        );

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DiscoveryError::spawn(&invocation.program, &e))?;

        // Piped handles are always present after a successful spawn.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();

        let drained = async {
            let (stdout, stderr) = tokio::join!(
                drain(stdout_pipe, output_cap),
                drain(stderr_pipe, output_cap)
            );
            let status = child.wait().await;
            (stdout, stderr, status)
        };

        let completed = tokio::select! {
            _ = cancel.cancelled() => None,
            result = drained => Some(result),
        };

        let Some((stdout, stderr, status)) = completed else {
            // Terminate and reap before surfacing the cancellation so
            // no orphaned process outlives the call.
            let _ = child.kill().await;
            let _ = child.wait().await;
            return Err(DiscoveryError::Cancelled);
        };

        let status = status.map_err(|e| DiscoveryError::spawn(&invocation.program, &e))?;
        let (stdout, stdout_truncated) = stdout;
        let (stderr, stderr_truncated) = stderr;
        if stdout_truncated || stderr_truncated {
            warn!(
                program = %invocation.program,
                cap = output_cap,
                "discovery output exceeded capture limit; parsing truncated prefix"
            );
        }
        Ok(ProcessOutput {
            stdout,
            stderr,
            exit_code: status.code(),
            stdout_truncated,
            stderr_truncated,
        })
    }
}

/// Read a stream to EOF, keeping at most `cap` bytes. The stream is
/// drained fully either way so the child never blocks on a full pipe.
async fn drain<R: AsyncRead + Unpin>(reader: Option<R>, cap: usize) -> (String, bool) {
    let Some(mut reader) = reader else {
        return (String::new(), false);
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let remaining = cap.saturating_sub(kept.len());
                if remaining >= n {
                    kept.extend_from_slice(&chunk[..n]);
                } else {
                    kept.extend_from_slice(&chunk[..remaining]);
                    truncated = true;
                }
            }
            Err(_) => break,
        }
    }
    (String::from_utf8_lossy(&kept).into_owned(), truncated)
}
