// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Summary statistics and report types.
//!
//! A [`SummaryRecord`] is built once per (program, backend) from its raw
//! samples and never changes afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snapbench_core::SampleSet;
use sysinfo::System;

use crate::reporter::SampleRow;
use crate::stats::{self, IqrBounds, OutlierFilter};

/// Descriptive statistics of one series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl SeriesStats {
    /// Returns `None` for an empty series.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            count: values.len(),
            mean: stats::mean(values)?,
            median: stats::median(values)?,
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    }
}

/// Format a millisecond value in human-readable form (auto-selects μs/ms/s).
pub fn format_millis(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.1}μs", ms * 1_000.0)
    } else if ms < 1_000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1_000.0)
    }
}

/// Format a byte count in human-readable form.
pub fn format_bytes(bytes: f64) -> String {
    if bytes < 1_024.0 {
        format!("{:.0} B", bytes)
    } else if bytes < 1_024.0 * 1_024.0 {
        format!("{:.1} KiB", bytes / 1_024.0)
    } else if bytes < 1_024.0 * 1_024.0 * 1_024.0 {
        format!("{:.1} MiB", bytes / (1_024.0 * 1_024.0))
    } else {
        format!("{:.2} GiB", bytes / (1_024.0 * 1_024.0 * 1_024.0))
    }
}

/// Outlier-filtered summary of one program under one backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub program: String,
    pub backend: String,
    /// Samples before filtering.
    pub samples: usize,
    /// Samples dropped as outliers.
    pub removed: usize,
    /// Fences on checkpoint + restore, when filtering applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bounds: Option<IqrBounds>,
    /// Filtered checkpoint times (ms), paired with `restore_ms`.
    pub checkpoint_ms: Vec<f64>,
    /// Filtered restore times (ms).
    pub restore_ms: Vec<f64>,
    pub checkpoint: Option<SeriesStats>,
    pub restore: Option<SeriesStats>,
    pub total: Option<SeriesStats>,
    /// Mean snapshot size of the retained samples, bytes.
    pub snapshot_size_mean: f64,
}

impl SummaryRecord {
    /// Summarize the rows of one program.
    pub fn from_rows(program: &str, backend: &str, rows: &[&SampleRow]) -> Self {
        let checkpoint: Vec<f64> = rows.iter().map(|row| row.checkpoint_time).collect();
        let restore: Vec<f64> = rows.iter().map(|row| row.restore_time).collect();
        let sizes: Vec<f64> = rows.iter().map(|row| row.snapshot_size as f64).collect();

        let filter = OutlierFilter::by_total(&checkpoint, &restore);
        let checkpoint_ms = filter.apply(&checkpoint);
        let restore_ms = filter.apply(&restore);
        let totals: Vec<f64> = checkpoint_ms
            .iter()
            .zip(&restore_ms)
            .map(|(c, r)| c + r)
            .collect();

        if filter.removed() > 0 {
            tracing::info!(
                program = program,
                backend = backend,
                removed = filter.removed(),
                "Samples removed as outliers by total time"
            );
        }

        Self {
            program: program.to_string(),
            backend: backend.to_string(),
            samples: rows.len(),
            removed: filter.removed(),
            total_bounds: filter.bounds,
            checkpoint: SeriesStats::from_values(&checkpoint_ms),
            restore: SeriesStats::from_values(&restore_ms),
            total: SeriesStats::from_values(&totals),
            snapshot_size_mean: stats::mean(&filter.apply(&sizes)).unwrap_or(0.0),
            checkpoint_ms,
            restore_ms,
        }
    }

    /// Summarize a freshly collected sample set.
    pub fn from_sample_set(samples: &SampleSet) -> Self {
        let rows = SampleRow::from_sample_set(samples);
        let rows: Vec<&SampleRow> = rows.iter().collect();
        Self::from_rows(samples.program.as_str(), samples.backend.label(), &rows)
    }

    /// Summarize every program in `rows`, in first-appearance order.
    pub fn group(backend: &str, rows: &[SampleRow]) -> Vec<Self> {
        let mut programs: Vec<&str> = Vec::new();
        for row in rows {
            if !programs.contains(&row.program.as_str()) {
                programs.push(&row.program);
            }
        }

        programs
            .into_iter()
            .map(|program| {
                let selected: Vec<&SampleRow> =
                    rows.iter().filter(|row| row.program == program).collect();
                Self::from_rows(program, backend, &selected)
            })
            .collect()
    }
}

/// System information captured at benchmark time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// CPU model name
    pub cpu_model: String,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Total system memory in bytes
    pub memory_bytes: u64,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let unknown = || "Unknown".to_string();
        Self {
            os: System::name().unwrap_or_else(unknown),
            os_version: System::os_version().unwrap_or_else(unknown),
            kernel_version: System::kernel_version(),
            cpu_model: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(unknown),
            cpu_cores: sys.cpus().len(),
            memory_bytes: sys.total_memory(),
            hostname: System::host_name().unwrap_or_else(unknown),
        }
    }
}

/// Summaries of one backend's samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub benchmark_suite: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub backend: String,
    pub records: Vec<SummaryRecord>,
}

impl SummaryReport {
    pub fn new(backend: impl Into<String>, records: Vec<SummaryRecord>) -> Self {
        Self {
            benchmark_suite: "snapbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            backend: backend.into(),
            records,
        }
    }
}

/// All backends' summaries for one program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramComparison {
    pub program: String,
    /// One summary per backend that has samples for this program.
    pub summaries: Vec<SummaryRecord>,
}

/// Side-by-side comparison of several backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub benchmark_suite: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub backends: Vec<String>,
    pub programs: Vec<ProgramComparison>,
}

impl ComparisonReport {
    /// Compare backends given as `(label, rows)` pairs.
    ///
    /// Programs follow the first backend's order; programs that only appear
    /// in later backends are appended in the order they are met.
    pub fn build(inputs: &[(String, Vec<SampleRow>)]) -> Self {
        let per_backend: Vec<(String, Vec<SummaryRecord>)> = inputs
            .iter()
            .map(|(label, rows)| (label.clone(), SummaryRecord::group(label, rows)))
            .collect();

        let mut order: Vec<String> = Vec::new();
        for (_, records) in &per_backend {
            for record in records {
                if !order.contains(&record.program) {
                    order.push(record.program.clone());
                }
            }
        }

        let programs = order
            .into_iter()
            .map(|program| ProgramComparison {
                summaries: per_backend
                    .iter()
                    .filter_map(|(_, records)| records.iter().find(|r| r.program == program))
                    .cloned()
                    .collect(),
                program,
            })
            .collect();

        Self {
            benchmark_suite: "snapbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            backends: inputs.iter().map(|(label, _)| label.clone()).collect(),
            programs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(program: &str, checkpoint_time: f64, restore_time: f64) -> SampleRow {
        SampleRow {
            program: program.to_string(),
            checkpoint_time,
            restore_time,
            snapshot_size: 1000,
        }
    }

    #[test]
    fn test_series_stats() {
        let stats = SeriesStats::from_values(&[3.0, 1.0, 2.0, 10.0]).unwrap();
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 4.0).abs() < 1e-9);
        assert!((stats.median - 2.5).abs() < 1e-9);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 10.0);
        assert!(SeriesStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_millis(0.5), "500.0μs");
        assert_eq!(format_millis(12.5), "12.50ms");
        assert_eq!(format_millis(1500.0), "1.50s");
        assert_eq!(format_bytes(512.0), "512 B");
        assert_eq!(format_bytes(2048.0), "2.0 KiB");
    }

    #[test]
    fn test_summary_drops_outlier_pair() {
        let rows: Vec<SampleRow> = [12.0, 13.0, 14.0, 15.0, 85.0]
            .iter()
            .map(|&c| row("P", c, 5.0))
            .collect();
        let records = SummaryRecord::group("external", &rows);
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.samples, 5);
        assert_eq!(record.removed, 1);
        assert_eq!(record.checkpoint_ms, vec![12.0, 13.0, 14.0, 15.0]);
        assert_eq!(record.restore_ms.len(), record.checkpoint_ms.len());
        assert!((record.checkpoint.unwrap().mean - 13.5).abs() < 1e-9);
        assert_eq!(record.total.unwrap().max, 20.0);
    }

    #[test]
    fn test_summary_from_sample_set() {
        use snapbench_core::{Attempt, Backend, ProgramName};

        let mut samples = SampleSet::new(ProgramName::new("bfs").unwrap(), Backend::InProcess);
        for (checkpoint_ms, restore_ms) in [(17.0, 0.0), (18.0, 0.0), (46.0, 0.0)] {
            samples.push(Attempt {
                dwell_ms: 10.0,
                checkpoint_ms,
                restore_ms,
                snapshot_size_bytes: 64,
            });
        }
        let record = SummaryRecord::from_sample_set(&samples);
        assert_eq!(record.backend, "in-process");
        assert_eq!(record.removed, 0);
        assert_eq!(record.checkpoint_ms, vec![17.0, 18.0, 46.0]);
        assert!((record.snapshot_size_mean - 64.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_keeps_first_appearance_order() {
        let rows = vec![row("b", 1.0, 1.0), row("a", 1.0, 1.0), row("b", 2.0, 1.0)];
        let records = SummaryRecord::group("in-process", &rows);
        let names: Vec<_> = records.iter().map(|r| r.program.as_str()).collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(records[0].samples, 2);
    }

    #[test]
    fn test_comparison_program_order() {
        let inputs = vec![
            (
                "in-process".to_string(),
                vec![row("nbody", 1.0, 1.0), row("bfs", 1.0, 1.0)],
            ),
            (
                "external".to_string(),
                vec![row("tc", 5.0, 5.0), row("nbody", 9.0, 3.0)],
            ),
        ];
        let report = ComparisonReport::build(&inputs);

        let names: Vec<_> = report.programs.iter().map(|p| p.program.as_str()).collect();
        assert_eq!(names, ["nbody", "bfs", "tc"]);
        assert_eq!(report.programs[0].summaries.len(), 2);
        assert_eq!(report.programs[0].summaries[1].backend, "external");
        assert_eq!(report.programs[1].summaries.len(), 1);
        assert_eq!(report.backends, ["in-process", "external"]);
    }

    #[test]
    fn test_system_info_collect() {
        let info = SystemInfo::collect();
        assert!(!info.os.is_empty());
        assert!(info.cpu_cores > 0);
        assert!(info.memory_bytes > 0);
    }
}
