//! Worker process supervision
//!
//! Owns the child process and both ends of its stdio pipes. stderr is
//! inherited so the worker's diagnostics land on the parent's stderr without
//! ever touching the protocol stream.

use crate::config::WorkerConfig;
use crate::error::{WireError, WireResult};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

/// Lifecycle state of a supervised worker
///
/// Transitions only move forward: Unstarted -> Running -> Stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Created but not yet spawned
    Unstarted,
    /// Child process is live and its pipes are open
    Running,
    /// Terminated, gracefully or by force; final state
    Stopped,
}

/// A supervised worker subprocess
pub struct WorkerProcess {
    config: WorkerConfig,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<BufReader<ChildStdout>>,
    state: Liveness,
}

impl WorkerProcess {
    /// Create an unstarted handle for the configured worker
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            child: None,
            stdin: None,
            stdout: None,
            state: Liveness::Unstarted,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> Liveness {
        self.state
    }

    /// The configuration this worker was created with
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Spawn the worker process
    ///
    /// Fails with `SpawnFailed` if the executable cannot be started. A handle
    /// can only be started once; the state machine never moves backward.
    pub fn start(&mut self) -> WireResult<()> {
        if self.state != Liveness::Unstarted {
            return Err(WireError::spawn_failed(
                &self.config.command,
                "worker was already started",
            ));
        }

        let mut cmd = Command::new(&self.config.command);
        cmd.args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            // The runtime reaps the child if the handle is dropped without stop().
            .kill_on_drop(true);
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| WireError::spawn_failed(&self.config.command, e.to_string()))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            WireError::spawn_failed(&self.config.command, "stdin handle unavailable")
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            WireError::spawn_failed(&self.config.command, "stdout handle unavailable")
        })?;

        self.stdin = Some(stdin);
        self.stdout = Some(BufReader::new(stdout));
        self.child = Some(child);
        self.state = Liveness::Running;
        debug!(command = %self.config.command, "worker started");
        Ok(())
    }

    /// Hand the read end of the worker's output to a dedicated reader
    ///
    /// The protocol client's receiver task takes it once at session start.
    pub fn take_stdout(&mut self) -> Option<BufReader<ChildStdout>> {
        self.stdout.take()
    }

    /// Write one encoded line to the worker's input and flush it
    pub async fn write_line(&mut self, line: &str) -> WireResult<()> {
        if self.state != Liveness::Running {
            return Err(WireError::ProcessNotRunning);
        }
        let stdin = self.stdin.as_mut().ok_or(WireError::ProcessNotRunning)?;

        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Read one line from the worker's output
    ///
    /// Returns `Ok(None)` once the worker closes its output stream. Fails with
    /// `ProcessNotRunning` if the worker is not running or the read end has
    /// been handed off via [`take_stdout`](Self::take_stdout).
    pub async fn read_line(&mut self) -> WireResult<Option<String>> {
        if self.state != Liveness::Running {
            return Err(WireError::ProcessNotRunning);
        }
        let stdout = self.stdout.as_mut().ok_or(WireError::ProcessNotRunning)?;

        let mut line = String::new();
        let n = stdout.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Stop the worker: close its input, wait up to the grace period, then kill
    ///
    /// Idempotent. Calling it again, or after the worker already exited on its
    /// own, is a no-op that leaves no zombie behind.
    pub async fn stop(&mut self) -> WireResult<()> {
        if self.state == Liveness::Stopped {
            return Ok(());
        }
        self.state = Liveness::Stopped;

        // Dropping stdin delivers EOF; a well-behaved worker exits on it.
        self.stdin.take();
        self.stdout.take();

        if let Some(mut child) = self.child.take() {
            tokio::select! {
                result = child.wait() => match result {
                    Ok(status) => debug!(command = %self.config.command, %status, "worker exited"),
                    Err(e) => warn!(command = %self.config.command, error = %e, "failed to reap worker"),
                },
                _ = tokio::time::sleep(self.config.grace_period) => {
                    warn!(
                        command = %self.config.command,
                        grace = ?self.config.grace_period,
                        "worker did not exit within grace period, killing"
                    );
                    child.kill().await.ok();
                }
            }
        }

        Ok(())
    }
}
