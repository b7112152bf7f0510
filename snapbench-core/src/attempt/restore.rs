// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Restore from the snapshot taken earlier in the attempt.

use super::detector::poll_for_file;
use super::extract::read_marker_ms;
use super::{AttemptPlan, SnapshotBackend};
use crate::error::AttemptError;
use crate::process::TargetProcess;

/// Restore the snapshot and return the restore time in milliseconds.
pub fn restore(plan: &AttemptPlan, backend: &SnapshotBackend) -> Result<f64, AttemptError> {
    match backend {
        SnapshotBackend::External(external) => {
            external
                .tool
                .restore(&external.snapshot_dir, external.restore_timeout)?;
            let stats = external.tool.restore_stats(&external.snapshot_dir)?;
            Ok(stats.restore_ms())
        }
        SnapshotBackend::InProcess(in_process) => {
            let markers = &in_process.markers;
            let args = vec!["--restore".to_string(), markers.snapshot.clone()];

            let mut restored = TargetProcess::spawn(&plan.executable, &args, &plan.workdir)
                .map_err(|e| AttemptError::RestoreFailed {
                    reason: e.to_string(),
                })?;

            let status = match restored.wait_timeout(in_process.restore_timeout)? {
                Some(status) => status,
                None => {
                    restored.kill()?;
                    return Err(AttemptError::RestoreTimeout {
                        timeout_ms: in_process.restore_timeout.as_millis() as u64,
                    });
                }
            };
            if !status.success() {
                return Err(AttemptError::RestoreFailed {
                    reason: format!("{} exited with {}", restored.command(), status),
                });
            }

            let time_marker = plan.workdir.join(&markers.restore_time);
            poll_for_file(&time_marker, in_process.poll)?;
            read_marker_ms(&time_marker, markers.unit)
        }
    }
}
