// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `snapbench summarize` command - Outlier-filtered statistics of one CSV.

use std::path::Path;

use anyhow::Context;
use snapbench_benchmark::metrics::{format_bytes, format_millis};
use snapbench_benchmark::{read_samples, JsonReporter, SeriesStats, SummaryRecord, SummaryReport};

pub fn execute(input: &Path, backend: Option<String>, output_dir: &Path) -> anyhow::Result<()> {
    let rows =
        read_samples(input).with_context(|| format!("reading samples {}", input.display()))?;
    anyhow::ensure!(!rows.is_empty(), "{} contains no samples", input.display());

    let backend = backend.unwrap_or_else(|| label_from_path(input));
    let report = SummaryReport::new(&backend, SummaryRecord::group(&backend, &rows));

    print_table(&report.records);

    let path = JsonReporter::new(output_dir)?.save("summary", &report)?;
    println!();
    println!("Report written to {}", path.display());
    Ok(())
}

/// `chkpt-restore-external.csv` → `chkpt-restore-external`.
pub(crate) fn label_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn mean_of(stats: Option<SeriesStats>) -> String {
    stats
        .map(|stats| format_millis(stats.mean))
        .unwrap_or_else(|| "-".to_string())
}

pub(crate) fn print_table(records: &[SummaryRecord]) {
    println!(
        "{:<20} {:<12} {:>8} {:>8} {:>12} {:>12} {:>12} {:>12}",
        "PROGRAM", "BACKEND", "SAMPLES", "REMOVED", "CHECKPOINT", "RESTORE", "TOTAL", "SIZE"
    );
    for record in records {
        println!(
            "{:<20} {:<12} {:>8} {:>8} {:>12} {:>12} {:>12} {:>12}",
            record.program,
            record.backend,
            record.samples,
            record.removed,
            mean_of(record.checkpoint),
            mean_of(record.restore),
            mean_of(record.total),
            format_bytes(record.snapshot_size_mean),
        );
    }
}
