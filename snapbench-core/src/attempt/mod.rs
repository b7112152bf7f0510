// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! A single checkpoint/restore trial.
//!
//! One attempt runs the phases in order: launch and trigger ([`driver`]),
//! wait for the checkpoint to complete ([`detector`]), then restore from the
//! snapshot ([`restore`]). [`extract`] turns raw backend output into numbers.

pub mod detector;
pub mod driver;
pub mod extract;
pub mod restore;

use std::path::PathBuf;
use std::time::Duration;

use nix::sys::signal::Signal;
use serde::Serialize;

use crate::config::{resolve_in_workdir, HarnessSettings, MarkerFiles, PollPolicy, ProgramSpec};
use crate::criu::CriuTool;
use crate::error::{AttemptError, FailureKind, SnapError, SnapResult};
use crate::locator::ProcessLocator;
use crate::types::{Backend, DwellTime, ProgramName};

/// External snapshot backend: CRIU against the target pid.
#[derive(Debug, Clone)]
pub struct ExternalSnapshot {
    pub tool: CriuTool,
    /// Image directory, emptied before every attempt.
    pub snapshot_dir: PathBuf,
    /// `None` waits for `criu restore` without a bound.
    pub restore_timeout: Option<Duration>,
}

/// In-process backend: signal-triggered, reported through marker files.
#[derive(Debug, Clone)]
pub struct InProcessSnapshot {
    pub markers: MarkerFiles,
    pub signal: Signal,
    pub poll: PollPolicy,
    pub restore_timeout: Duration,
}

/// Backend-specific machinery shared by every attempt of a run.
#[derive(Debug, Clone)]
pub enum SnapshotBackend {
    External(ExternalSnapshot),
    InProcess(InProcessSnapshot),
}

impl SnapshotBackend {
    /// Build the backend from harness settings.
    ///
    /// # Errors
    /// The external backend fails with `ToolNotFound` when `criu` or `crit`
    /// is missing, before any target is launched.
    pub fn from_settings(kind: Backend, settings: &HarnessSettings) -> SnapResult<Self> {
        match kind {
            Backend::External => {
                let tool = CriuTool::locate(
                    settings.criu_path.as_deref(),
                    settings.crit_path.as_deref(),
                )?;
                Ok(Self::External(ExternalSnapshot {
                    tool,
                    snapshot_dir: settings.snapshot_dir.clone(),
                    restore_timeout: settings.external_restore_timeout,
                }))
            }
            Backend::InProcess => Ok(Self::InProcess(InProcessSnapshot {
                markers: settings.markers.clone(),
                signal: settings.signal,
                poll: settings.poll,
                restore_timeout: settings.restore_timeout,
            })),
        }
    }

    pub fn kind(&self) -> Backend {
        match self {
            Self::External(_) => Backend::External,
            Self::InProcess(_) => Backend::InProcess,
        }
    }
}

/// Everything needed to launch one program under one backend.
#[derive(Debug, Clone)]
pub struct AttemptPlan {
    pub program: ProgramName,
    pub backend: Backend,
    /// Absolute working directory of the target.
    pub workdir: PathBuf,
    /// Executable, resolved against `workdir` when given relative to it.
    pub executable: PathBuf,
    pub args: Vec<String>,
    /// Name to look the target up by in the process table.
    pub process_name: String,
}

impl AttemptPlan {
    /// Resolve the command a program runs under `backend`.
    pub fn new(spec: &ProgramSpec, backend: Backend) -> SnapResult<Self> {
        let not_configured = || SnapError::BackendNotConfigured {
            program: spec.name.clone(),
            backend,
        };

        let mut command = spec.command(backend).ok_or_else(not_configured)?;
        let process_name = spec.process_name(backend).ok_or_else(not_configured)?;

        let workdir = if spec.workdir.is_absolute() {
            spec.workdir.clone()
        } else {
            std::env::current_dir()
                .map_err(|e| SnapError::Io {
                    context: "reading current directory",
                    source: e,
                })?
                .join(&spec.workdir)
        };

        let argv0 = command.remove(0);

        Ok(Self {
            program: spec.name.clone(),
            backend,
            executable: resolve_in_workdir(&workdir, &argv0),
            workdir,
            args: command,
            process_name,
        })
    }
}

/// A successful trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attempt {
    pub dwell_ms: f64,
    pub checkpoint_ms: f64,
    pub restore_ms: f64,
    pub snapshot_size_bytes: u64,
}

impl Attempt {
    /// Checkpoint plus restore time.
    pub fn total_ms(&self) -> f64 {
        self.checkpoint_ms + self.restore_ms
    }
}

/// Outcome of one trial.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Success(Attempt),
    TransientFailure(FailureKind),
    FatalFailure(FailureKind),
}

impl AttemptOutcome {
    pub fn from_result(result: &Result<Attempt, AttemptError>) -> Self {
        match result {
            Ok(attempt) => Self::Success(*attempt),
            Err(e) if e.is_transient() => Self::TransientFailure(e.kind()),
            Err(e) => Self::FatalFailure(e.kind()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Run one full trial: launch, trigger, detect, restore.
pub fn run(
    plan: &AttemptPlan,
    backend: &SnapshotBackend,
    locator: &dyn ProcessLocator,
    dwell: DwellTime,
) -> Result<Attempt, AttemptError> {
    let triggered = driver::run_attempt(plan, backend, locator, dwell)?;
    let checkpoint = detector::await_checkpoint_stats(plan, backend)?;
    let restore_ms = restore::restore(plan, backend)?;

    tracing::debug!(
        program = %plan.program,
        backend = %plan.backend,
        pid = triggered.pid,
        exit_code = ?triggered.exit_code,
        checkpoint_ms = checkpoint.checkpoint_ms,
        restore_ms = restore_ms,
        snapshot_size = checkpoint.snapshot_size_bytes,
        "Attempt completed"
    );

    Ok(Attempt {
        dwell_ms: dwell.millis(),
        checkpoint_ms: checkpoint.checkpoint_ms,
        restore_ms,
        snapshot_size_bytes: checkpoint.snapshot_size_bytes,
    })
}
