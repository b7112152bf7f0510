// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Target process management.
//!
//! Spawns benchmark targets with their output discarded and reaps them,
//! optionally under a deadline.

use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::error::AttemptError;

/// Interval between exit checks while waiting under a deadline.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A launched benchmark target.
///
/// The child is killed and reaped on drop unless it was already waited for.
pub struct TargetProcess {
    /// Child process handle.
    child: Child,
    /// Display form of the command, for diagnostics.
    command: String,
    /// Exit status once reaped.
    status: Option<ExitStatus>,
}

impl TargetProcess {
    /// Spawn `program args...` inside `workdir` with all stdio discarded.
    pub fn spawn(program: &Path, args: &[String], workdir: &Path) -> Result<Self, AttemptError> {
        let command = std::iter::once(program.display().to_string())
            .chain(args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ");

        let child = Command::new(program)
            .args(args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| AttemptError::SpawnFailed {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(
            pid = child.id(),
            command = %command,
            workdir = %workdir.display(),
            "Spawned target process"
        );

        Ok(Self {
            child,
            command,
            status: None,
        })
    }

    /// Pid of the direct child.
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Command line the process was started with.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Block until the process exits.
    pub fn wait(&mut self) -> Result<ExitStatus, AttemptError> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        let status = self.child.wait().map_err(|e| AttemptError::Io {
            context: "waiting for target process",
            source: e,
        })?;
        self.status = Some(status);
        Ok(status)
    }

    /// Wait for exit for at most `timeout`. Returns `None` if still running.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<ExitStatus>, AttemptError> {
        if let Some(status) = self.status {
            return Ok(Some(status));
        }

        let start = Instant::now();
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    self.status = Some(status);
                    return Ok(Some(status));
                }
                Ok(None) if start.elapsed() >= timeout => return Ok(None),
                Ok(None) => std::thread::sleep(EXIT_POLL_INTERVAL),
                Err(e) => {
                    return Err(AttemptError::Io {
                        context: "polling target process",
                        source: e,
                    })
                }
            }
        }
    }

    /// Kill the process and reap it.
    pub fn kill(&mut self) -> Result<(), AttemptError> {
        if self.status.is_some() {
            return Ok(());
        }
        self.child.kill().map_err(|e| AttemptError::Io {
            context: "killing target process",
            source: e,
        })?;
        self.wait()?;
        Ok(())
    }
}

impl Drop for TargetProcess {
    fn drop(&mut self) {
        if self.status.is_none() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
