// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CRIU command-line wrapper.
//!
//! Drives `criu dump` / `criu restore` against a pid and reads the timing
//! statistics CRIU leaves in the image directory through `crit decode`.

pub mod stats;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};

use crate::error::{AttemptError, SnapError, SnapResult};
use crate::process::TargetProcess;

pub use stats::{DumpStats, RestoreStats, DUMP_STATS_FILE, RESTORE_STATS_FILE};

const CRIU_CANDIDATES: [&str; 6] = [
    "/usr/sbin/criu",
    "/usr/bin/criu",
    "/sbin/criu",
    "/bin/criu",
    "/usr/local/sbin/criu",
    "/usr/local/bin/criu",
];

const CRIT_CANDIDATES: [&str; 4] = [
    "/usr/bin/crit",
    "/usr/sbin/crit",
    "/usr/local/bin/crit",
    "/usr/local/sbin/crit",
];

/// Resolved `criu` and `crit` binaries.
#[derive(Debug, Clone)]
pub struct CriuTool {
    criu: PathBuf,
    crit: PathBuf,
}

impl CriuTool {
    /// Locate both binaries, honoring explicit paths from the registry.
    ///
    /// # Errors
    /// Returns `SnapError::ToolNotFound` if either binary is missing.
    pub fn locate(criu_path: Option<&Path>, crit_path: Option<&Path>) -> SnapResult<Self> {
        let criu = find_tool("criu", &CRIU_CANDIDATES, criu_path)?;
        let crit = find_tool("crit", &CRIT_CANDIDATES, crit_path)?;

        tracing::info!(
            criu_path = %criu.display(),
            crit_path = %crit.display(),
            "CRIU tools located"
        );

        Ok(Self { criu, crit })
    }

    /// Use the given binaries without any presence check.
    pub fn with_paths(criu: impl Into<PathBuf>, crit: impl Into<PathBuf>) -> Self {
        Self {
            criu: criu.into(),
            crit: crit.into(),
        }
    }

    /// Dump `pid` into `dir`. The dumped tree is killed by CRIU afterwards.
    pub fn dump(&self, pid: u32, dir: &Path) -> Result<(), AttemptError> {
        tracing::debug!(pid = pid, path = %dir.display(), "Starting CRIU dump");

        let start = Instant::now();
        let output = Command::new(&self.criu)
            .arg("dump")
            .arg("--shell-job")
            .arg("-t")
            .arg(pid.to_string())
            .arg("--file-locks")
            .arg("-D")
            .arg(dir)
            .output()
            .map_err(|e| AttemptError::DumpFailed {
                reason: format!("Failed to execute CRIU: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AttemptError::DumpFailed {
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        tracing::debug!(
            pid = pid,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "CRIU dump completed"
        );
        Ok(())
    }

    /// Restore the tree stored in `dir` and wait for it to finish.
    ///
    /// Without a timeout the wait is unbounded.
    pub fn restore(&self, dir: &Path, timeout: Option<Duration>) -> Result<(), AttemptError> {
        let args = vec![
            "restore".to_string(),
            "--shell-job".to_string(),
            "-D".to_string(),
            dir.display().to_string(),
        ];

        let mut restore = TargetProcess::spawn(&self.criu, &args, Path::new(".")).map_err(
            |e| AttemptError::RestoreFailed {
                reason: e.to_string(),
            },
        )?;

        let status = match timeout {
            Some(limit) => match restore.wait_timeout(limit)? {
                Some(status) => status,
                None => {
                    restore.kill()?;
                    return Err(AttemptError::RestoreTimeout {
                        timeout_ms: limit.as_millis() as u64,
                    });
                }
            },
            None => restore.wait()?,
        };

        if !status.success() {
            return Err(AttemptError::RestoreFailed {
                reason: format!("criu restore exited with {}", status),
            });
        }
        Ok(())
    }

    /// Run `crit decode -i <file>` and return its JSON output.
    pub fn decode(&self, file: &Path) -> Result<String, AttemptError> {
        let decode_failed = |reason: String| AttemptError::DecodeFailed {
            path: file.to_path_buf(),
            reason,
        };

        let output = Command::new(&self.crit)
            .arg("decode")
            .arg("-i")
            .arg(file)
            .output()
            .map_err(|e| decode_failed(format!("Failed to execute crit: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(decode_failed(format!("{}: {}", output.status, stderr.trim())));
        }

        String::from_utf8(output.stdout).map_err(|e| decode_failed(e.to_string()))
    }

    /// Dump-phase statistics from an image directory.
    pub fn dump_stats(&self, dir: &Path) -> Result<DumpStats, AttemptError> {
        let file = dir.join(DUMP_STATS_FILE);
        let json = self.decode(&file)?;
        DumpStats::from_json(&json).map_err(|reason| AttemptError::DecodeFailed { path: file, reason })
    }

    /// Restore-phase statistics from an image directory.
    pub fn restore_stats(&self, dir: &Path) -> Result<RestoreStats, AttemptError> {
        let file = dir.join(RESTORE_STATS_FILE);
        let json = self.decode(&file)?;
        RestoreStats::from_json(&json)
            .map_err(|reason| AttemptError::DecodeFailed { path: file, reason })
    }
}

/// Replace `dir` with an empty directory.
pub fn reset_snapshot_dir(dir: &Path) -> Result<(), AttemptError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(|e| AttemptError::Io {
            context: "removing old snapshot directory",
            source: e,
        })?;
    }
    std::fs::create_dir_all(dir).map_err(|e| AttemptError::Io {
        context: "creating snapshot directory",
        source: e,
    })
}

fn find_tool(
    tool: &'static str,
    candidates: &[&str],
    configured: Option<&Path>,
) -> SnapResult<PathBuf> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        // A bare name is looked up on PATH below.
        if path.components().count() != 1 {
            return Err(SnapError::ToolNotFound { tool });
        }
        return which(&path.to_string_lossy()).ok_or(SnapError::ToolNotFound { tool });
    }

    for candidate in candidates {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(path);
        }
    }

    which(tool).ok_or(SnapError::ToolNotFound { tool })
}

fn which(name: &str) -> Option<PathBuf> {
    let output = Command::new("which").arg(name).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!path.is_empty()).then(|| PathBuf::from(path))
}
