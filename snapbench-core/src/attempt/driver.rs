// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Launch a target, let it run for the dwell time, then trigger a snapshot.

use std::io::ErrorKind;
use std::path::Path;

use nix::sys::signal::kill;
use nix::unistd::Pid;

use super::{AttemptPlan, ExternalSnapshot, InProcessSnapshot, SnapshotBackend};
use crate::config::MarkerFiles;
use crate::criu::reset_snapshot_dir;
use crate::error::AttemptError;
use crate::locator::ProcessLocator;
use crate::process::TargetProcess;
use crate::types::DwellTime;

/// Result of the launch-and-trigger phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triggered {
    /// Pid the snapshot was taken from.
    pub pid: u32,
    /// Exit code of the target after the snapshot, if it exited normally.
    pub exit_code: Option<i32>,
}

/// Launch the target and trigger a snapshot after `dwell`.
///
/// Returns once the target has exited.
pub fn run_attempt(
    plan: &AttemptPlan,
    backend: &SnapshotBackend,
    locator: &dyn ProcessLocator,
    dwell: DwellTime,
) -> Result<Triggered, AttemptError> {
    match backend {
        SnapshotBackend::External(external) => run_external(plan, external, locator, dwell),
        SnapshotBackend::InProcess(in_process) => run_in_process(plan, in_process, locator, dwell),
    }
}

fn run_external(
    plan: &AttemptPlan,
    external: &ExternalSnapshot,
    locator: &dyn ProcessLocator,
    dwell: DwellTime,
) -> Result<Triggered, AttemptError> {
    reset_snapshot_dir(&external.snapshot_dir)?;

    let mut target = TargetProcess::spawn(&plan.executable, &plan.args, &plan.workdir)?;
    std::thread::sleep(dwell.as_duration());

    let pid = locator.locate_unique(&plan.process_name)?;
    let dumped = external.tool.dump(pid, &external.snapshot_dir);
    if dumped.is_err() {
        target.kill()?;
    }

    // The dumped tree is killed, so the exit status carries no meaning here.
    let status = target.wait()?;
    tracing::debug!(
        program = %plan.program,
        pid = pid,
        child_pid = target.pid(),
        status = %status,
        "Target exited after dump"
    );
    dumped?;

    Ok(Triggered {
        pid,
        exit_code: status.code(),
    })
}

fn run_in_process(
    plan: &AttemptPlan,
    in_process: &InProcessSnapshot,
    locator: &dyn ProcessLocator,
    dwell: DwellTime,
) -> Result<Triggered, AttemptError> {
    clear_markers(&plan.workdir, &in_process.markers)?;

    let mut target = TargetProcess::spawn(&plan.executable, &plan.args, &plan.workdir)?;
    std::thread::sleep(dwell.as_duration());

    let pid = locator.locate_unique(&plan.process_name)?;
    let raw_pid = i32::try_from(pid).map_err(|_| AttemptError::SignalFailed {
        signal: in_process.signal.to_string(),
        pid,
        reason: "pid out of range".to_string(),
    })?;
    kill(Pid::from_raw(raw_pid), in_process.signal).map_err(|e| AttemptError::SignalFailed {
        signal: in_process.signal.to_string(),
        pid,
        reason: e.to_string(),
    })?;

    tracing::debug!(
        program = %plan.program,
        pid = pid,
        child_pid = target.pid(),
        signal = %in_process.signal,
        "Checkpoint signal delivered"
    );

    let status = target.wait()?;
    if !status.success() {
        return Err(AttemptError::TargetFailed {
            code: status.code(),
        });
    }

    Ok(Triggered {
        pid,
        exit_code: status.code(),
    })
}

/// Delete marker files left behind by an earlier attempt.
pub fn clear_markers(workdir: &Path, markers: &MarkerFiles) -> Result<(), AttemptError> {
    for name in markers.all() {
        match std::fs::remove_file(workdir.join(name)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(AttemptError::Io {
                    context: "removing stale marker file",
                    source: e,
                })
            }
        }
    }
    Ok(())
}
