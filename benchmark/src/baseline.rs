// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Baseline timing feed.
//!
//! Execution times of each program, measured without any snapshot, keyed by
//! program name and runtime label. The measurement run derives each
//! program's dwell time from it.
//!
//! ```json
//! {"results": [{"name": "nbody", "runtime": "baseline",
//!               "command": "cd . ; ./nbody.c.aot -- 1000000",
//!               "times": [1.98, 2.01], "mean": 1.995, "median": 1.995,
//!               "ratios": [0.992, 1.008]}]}
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snapbench_core::DwellTime;

use crate::metrics::SystemInfo;
use crate::reporter::ReporterError;
use crate::stats;

/// Runtime label of the non-instrumented reference run.
pub const BASELINE_RUNTIME: &str = "baseline";

/// Timings of one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// Program name.
    pub name: String,
    /// `baseline`, or the label of the backend whose command was timed.
    pub runtime: String,
    pub command: String,
    /// Wall-clock seconds per run.
    pub times: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratios: Option<Vec<f64>>,
}

impl BaselineEntry {
    /// Build an entry from raw run times in seconds.
    pub fn from_times(
        name: impl Into<String>,
        runtime: impl Into<String>,
        command: impl Into<String>,
        times: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            runtime: runtime.into(),
            command: command.into(),
            mean: stats::mean(&times).unwrap_or(0.0),
            median: stats::median(&times).unwrap_or(0.0),
            times,
            ratios: None,
        }
    }
}

/// The whole feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineFeed {
    pub results: Vec<BaselineEntry>,
    /// Host the timings were taken on. Absent in feeds written by other tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_info: Option<SystemInfo>,
}

impl BaselineFeed {
    pub fn new(results: Vec<BaselineEntry>) -> Self {
        Self {
            results,
            system_info: None,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(file)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ReporterError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// First entry for `program` under `runtime`.
    pub fn entry(&self, program: &str, runtime: &str) -> Option<&BaselineEntry> {
        self.results
            .iter()
            .find(|entry| entry.name == program && entry.runtime == runtime)
    }

    /// Dwell time for `program` measured under `runtime`: half its median runtime.
    ///
    /// Falls back to the program's `baseline` entry.
    pub fn dwell_for(&self, program: &str, runtime: &str) -> Option<DwellTime> {
        let entry = self
            .entry(program, runtime)
            .or_else(|| self.entry(program, BASELINE_RUNTIME))?;
        DwellTime::half_of_runtime_secs(entry.median).ok()
    }

    /// Program names in first-appearance order.
    pub fn programs(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for entry in &self.results {
            if !names.contains(&entry.name.as_str()) {
                names.push(&entry.name);
            }
        }
        names
    }
}
