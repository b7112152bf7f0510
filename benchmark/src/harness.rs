// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Wall-clock timing of whole program runs.
//!
//! Used to build the baseline feed: every program is run once to warm the
//! page cache, then timed for a fixed number of runs.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;

use snapbench_core::config::resolve_in_workdir;
use thiserror::Error;

/// Errors from timed command runs.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Empty command")]
    EmptyCommand,

    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}")]
    Failed { command: String, status: String },
}

/// A command run from a fixed working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimedCommand {
    pub workdir: PathBuf,
    pub executable: PathBuf,
    pub args: Vec<String>,
}

impl TimedCommand {
    /// `argv[0]` is resolved against `workdir` when it is a relative path.
    pub fn new(workdir: &Path, argv: &[String]) -> Result<Self, HarnessError> {
        let (program, args) = argv.split_first().ok_or(HarnessError::EmptyCommand)?;

        let workdir = if workdir.is_absolute() {
            workdir.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| HarnessError::Spawn {
                    command: program.clone(),
                    source: e,
                })?
                .join(workdir)
        };

        Ok(Self {
            executable: resolve_in_workdir(&workdir, program),
            workdir,
            args: args.to_vec(),
        })
    }

    /// Shell-style rendering, as recorded in the baseline feed.
    pub fn display(&self) -> String {
        let mut rendered = format!("cd {} ; {}", self.workdir.display(), self.executable.display());
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }

    /// Run to completion with output discarded. A non-zero exit is an error.
    pub fn run_once(&self) -> Result<(), HarnessError> {
        let status = Command::new(&self.executable)
            .args(&self.args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| HarnessError::Spawn {
                command: self.display(),
                source: e,
            })?;

        if !status.success() {
            return Err(HarnessError::Failed {
                command: self.display(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// A benchmark harness for measuring operation latency.
pub struct BenchmarkHarness {
    /// Number of warmup iterations before measurement
    warmup_iterations: u64,
    /// Number of measurement iterations
    measurement_iterations: u64,
}

impl BenchmarkHarness {
    /// Create a new benchmark harness with default settings.
    pub fn new() -> Self {
        Self {
            warmup_iterations: 1,
            measurement_iterations: 30,
        }
    }

    /// Set the number of warmup iterations.
    pub fn warmup(mut self, iterations: u64) -> Self {
        self.warmup_iterations = iterations;
        self
    }

    /// Set the number of measurement iterations.
    pub fn iterations(mut self, iterations: u64) -> Self {
        self.measurement_iterations = iterations;
        self
    }

    /// Run a fallible operation and collect latency samples in seconds.
    ///
    /// The first failure, warmup included, aborts the run.
    pub fn run<F, E>(&self, mut operation: F) -> Result<Vec<f64>, E>
    where
        F: FnMut() -> Result<(), E>,
    {
        // Warmup phase
        for _ in 0..self.warmup_iterations {
            operation()?;
        }

        // Measurement phase
        let mut samples = Vec::with_capacity(self.measurement_iterations as usize);
        for _ in 0..self.measurement_iterations {
            let start = Instant::now();
            operation()?;
            samples.push(start.elapsed().as_secs_f64());
        }

        Ok(samples)
    }

    /// Time a command's end-to-end runtime.
    pub fn time_command(&self, command: &TimedCommand) -> Result<Vec<f64>, HarnessError> {
        tracing::debug!(command = %command.display(), "Timing command");
        self.run(|| command.run_once())
    }
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_harness_basic() {
        let harness = BenchmarkHarness::new().warmup(2).iterations(20);

        let mut calls = 0;
        let samples = harness
            .run(|| {
                calls += 1;
                std::thread::sleep(Duration::from_micros(100));
                Ok::<(), ()>(())
            })
            .unwrap();

        assert_eq!(samples.len(), 20);
        assert_eq!(calls, 22);
        // Each sample should be at least 100μs
        for sample in &samples {
            assert!(*sample >= 100e-6, "Sample {} < 100μs", sample);
        }
    }

    #[test]
    fn test_failure_aborts_run() {
        let harness = BenchmarkHarness::new().iterations(5);
        let mut calls = 0;
        let result = harness.run(|| {
            calls += 1;
            if calls == 3 {
                Err("boom")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_time_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let command =
            TimedCommand::new(dir.path(), &["sleep".to_string(), "0.05".to_string()]).unwrap();
        assert_eq!(command.executable, PathBuf::from("sleep"));

        let samples = BenchmarkHarness::new()
            .iterations(3)
            .time_command(&command)
            .unwrap();
        assert_eq!(samples.len(), 3);
        assert!(samples.iter().all(|s| *s >= 0.05));
    }

    #[test]
    fn test_failing_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let command = TimedCommand::new(dir.path(), &["false".to_string()]).unwrap();
        let result = BenchmarkHarness::new().time_command(&command);
        assert!(matches!(result, Err(HarnessError::Failed { .. })));
    }

    #[test]
    fn test_relative_program_resolved() {
        let command = TimedCommand::new(
            Path::new("/opt/bench/nbody"),
            &["./nbody.c.aot".to_string(), "--".to_string(), "1000".to_string()],
        )
        .unwrap();
        assert_eq!(command.executable, PathBuf::from("/opt/bench/nbody/./nbody.c.aot"));
        assert_eq!(
            command.display(),
            "cd /opt/bench/nbody ; /opt/bench/nbody/./nbody.c.aot -- 1000"
        );
        assert!(TimedCommand::new(Path::new("."), &[]).is_err());
    }
}
