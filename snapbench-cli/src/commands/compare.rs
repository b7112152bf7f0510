// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `snapbench compare` command - Backends side by side.

use std::path::{Path, PathBuf};

use anyhow::Context;
use snapbench_benchmark::metrics::format_millis;
use snapbench_benchmark::{read_samples, ComparisonReport, JsonReporter};

use super::summarize::label_from_path;

pub fn execute(inputs: &[String], output_dir: &Path) -> anyhow::Result<()> {
    let mut tables = Vec::with_capacity(inputs.len());
    for input in inputs {
        let (label, path) = parse_input(input);
        let rows =
            read_samples(&path).with_context(|| format!("reading samples {}", path.display()))?;
        tracing::debug!(backend = %label, rows = rows.len(), "Loaded samples");
        tables.push((label, rows));
    }

    let report = ComparisonReport::build(&tables);

    println!(
        "{:<20} {:<12} {:>12} {:>12} {:>12} {:>12}",
        "PROGRAM", "BACKEND", "CHECKPOINT", "RESTORE", "MIN TOTAL", "MAX TOTAL"
    );
    for program in &report.programs {
        for summary in &program.summaries {
            let cell = |value: Option<f64>| value.map(format_millis).unwrap_or_else(|| "-".into());
            println!(
                "{:<20} {:<12} {:>12} {:>12} {:>12} {:>12}",
                program.program,
                summary.backend,
                cell(summary.checkpoint.map(|s| s.mean)),
                cell(summary.restore.map(|s| s.mean)),
                cell(summary.total.map(|s| s.min)),
                cell(summary.total.map(|s| s.max)),
            );
        }
    }

    let path = JsonReporter::new(output_dir)?.save("comparison", &report)?;
    println!();
    println!("Report written to {}", path.display());
    Ok(())
}

/// `label=path` or a bare path labelled by its file stem.
fn parse_input(input: &str) -> (String, PathBuf) {
    match input.split_once('=') {
        Some((label, path)) if !label.is_empty() => (label.to_string(), PathBuf::from(path)),
        _ => {
            let path = PathBuf::from(input);
            (label_from_path(&path), path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(
            parse_input("external=out/criu.csv"),
            ("external".to_string(), PathBuf::from("out/criu.csv"))
        );
        assert_eq!(
            parse_input("out/chkpt-restore-in-process.csv"),
            (
                "chkpt-restore-in-process".to_string(),
                PathBuf::from("out/chkpt-restore-in-process.csv")
            )
        );
    }

    #[test]
    fn test_comparison_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let header = "program,checkpoint_time,restore_time,snapshot_size\n";
        let external = dir.path().join("external.csv");
        let in_process = dir.path().join("in-process.csv");
        std::fs::write(&external, format!("{header}nbody,10,4,4096\nbfs,20,8,8192\n")).unwrap();
        std::fs::write(&in_process, format!("{header}tc,1,1,10\nnbody,2,1,100\n")).unwrap();

        let inputs = vec![
            format!("external={}", external.display()),
            format!("in-process={}", in_process.display()),
        ];
        let output_dir = dir.path().join("results");
        execute(&inputs, &output_dir).unwrap();

        let reports = JsonReporter::new(&output_dir).unwrap().list_reports().unwrap();
        let report: ComparisonReport =
            snapbench_benchmark::reporter::load_json(&reports[0]).unwrap();
        let names: Vec<_> = report.programs.iter().map(|p| p.program.as_str()).collect();
        assert_eq!(names, ["nbody", "bfs", "tc"]);
        assert_eq!(report.programs[0].summaries.len(), 2);
    }
}
