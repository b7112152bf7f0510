// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Checkpoint completion detection.
//!
//! The external backend is done once its dump command has exited; its
//! statistics are already on disk. The in-process backend only reports
//! through the filesystem, so its marker files are polled with a bounded
//! number of attempts and a timeout is returned rather than waiting forever.

use std::path::Path;

use super::extract::{dir_size, read_marker_ms};
use super::{AttemptPlan, SnapshotBackend};
use crate::config::PollPolicy;
use crate::error::AttemptError;

/// Checkpoint metrics of one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointStats {
    pub checkpoint_ms: f64,
    pub snapshot_size_bytes: u64,
}

/// Wait for the checkpoint to be reported and read its metrics.
pub fn await_checkpoint_stats(
    plan: &AttemptPlan,
    backend: &SnapshotBackend,
) -> Result<CheckpointStats, AttemptError> {
    match backend {
        SnapshotBackend::External(external) => {
            let stats = external.tool.dump_stats(&external.snapshot_dir)?;
            let snapshot_size_bytes =
                dir_size(&external.snapshot_dir).map_err(|e| AttemptError::Io {
                    context: "measuring snapshot directory",
                    source: e,
                })?;
            Ok(CheckpointStats {
                checkpoint_ms: stats.checkpoint_ms(),
                snapshot_size_bytes,
            })
        }
        SnapshotBackend::InProcess(in_process) => {
            let markers = &in_process.markers;

            let time_marker = plan.workdir.join(&markers.checkpoint_time);
            poll_for_file(&time_marker, in_process.poll)?;
            let checkpoint_ms = read_marker_ms(&time_marker, markers.unit)?;

            // Size is best effort: a blob that never shows up counts as empty.
            let blob = plan.workdir.join(&markers.snapshot);
            let snapshot_size_bytes = match poll_for_file(&blob, in_process.poll) {
                Ok(()) => std::fs::metadata(&blob).map(|m| m.len()).unwrap_or(0),
                Err(e) => {
                    tracing::debug!(program = %plan.program, error = %e, "Snapshot blob missing");
                    0
                }
            };

            Ok(CheckpointStats {
                checkpoint_ms,
                snapshot_size_bytes,
            })
        }
    }
}

/// Wait until `path` exists, checking up to `policy.attempts` times.
pub fn poll_for_file(path: &Path, policy: PollPolicy) -> Result<(), AttemptError> {
    for _ in 0..policy.attempts {
        if path.exists() {
            return Ok(());
        }
        // Also sleeps after the last check, so a miss waits the full window.
        std::thread::sleep(policy.interval);
    }

    Err(AttemptError::MarkerTimeout {
        path: path.to_path_buf(),
        waited_ms: policy.window().as_millis() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    use crate::attempt::InProcessSnapshot;
    use crate::config::MarkerFiles;
    use crate::types::{Backend, ProgramName, TimeUnit};
    use nix::sys::signal::Signal;

    fn plan(workdir: &Path) -> AttemptPlan {
        AttemptPlan {
            program: ProgramName::new("nbody").unwrap(),
            backend: Backend::InProcess,
            workdir: workdir.to_path_buf(),
            executable: "./nbody.c.cr.aot".into(),
            args: Vec::new(),
            process_name: "nbody.c.cr.aot".to_string(),
        }
    }

    fn backend(unit: TimeUnit) -> SnapshotBackend {
        SnapshotBackend::InProcess(InProcessSnapshot {
            markers: MarkerFiles {
                unit,
                ..MarkerFiles::default()
            },
            signal: Signal::SIGUSR1,
            poll: PollPolicy {
                interval: Duration::from_millis(10),
                attempts: 5,
            },
            restore_timeout: Duration::from_secs(1),
        })
    }

    #[test]
    fn test_poll_times_out_within_window() {
        let dir = TempDir::new().unwrap();
        let policy = PollPolicy::default();

        let start = Instant::now();
        let err = poll_for_file(&dir.path().join("never.txt"), policy).unwrap_err();
        let elapsed = start.elapsed();

        assert!(matches!(err, AttemptError::MarkerTimeout { waited_ms: 1000, .. }));
        // The miss path sleeps through the whole window.
        assert!(elapsed >= policy.window());
        assert!(elapsed < Duration::from_secs(3));
    }

    #[test]
    fn test_poll_sees_late_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("late.txt");
        let writer_path = path.clone();
        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            std::fs::write(writer_path, b"1").unwrap();
        });

        poll_for_file(
            &path,
            PollPolicy {
                interval: Duration::from_millis(20),
                attempts: 50,
            },
        )
        .unwrap();
        writer.join().unwrap();
    }

    #[test]
    fn test_in_process_stats_from_markers() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("chkpt-time.txt"), b"1500\n").unwrap();
        std::fs::write(dir.path().join("checkpoint.pb"), vec![0u8; 256]).unwrap();

        let stats =
            await_checkpoint_stats(&plan(dir.path()), &backend(TimeUnit::Microseconds)).unwrap();
        assert!((stats.checkpoint_ms - 1.5).abs() < 1e-9);
        assert_eq!(stats.snapshot_size_bytes, 256);
    }

    #[test]
    fn test_missing_blob_counts_as_zero() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("chkpt-time.txt"), b"7.25").unwrap();

        let stats =
            await_checkpoint_stats(&plan(dir.path()), &backend(TimeUnit::Milliseconds)).unwrap();
        assert!((stats.checkpoint_ms - 7.25).abs() < 1e-9);
        assert_eq!(stats.snapshot_size_bytes, 0);
    }

    #[test]
    fn test_missing_time_marker_is_timeout() {
        let dir = TempDir::new().unwrap();
        let err = await_checkpoint_stats(&plan(dir.path()), &backend(TimeUnit::Milliseconds))
            .unwrap_err();
        assert!(err.is_transient());
    }
}
