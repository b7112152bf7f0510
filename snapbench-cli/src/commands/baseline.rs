// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `snapbench baseline` command - Time whole program runs.
//!
//! Every program's baseline command and each backend command are timed
//! end to end. The resulting feed drives dwell times for `measure`.

use std::path::Path;

use snapbench_benchmark::{
    normalize, BaselineEntry, BaselineFeed, BenchmarkHarness, Representative, SystemInfo,
    TimedCommand, BASELINE_RUNTIME,
};
use snapbench_core::{ConfigLoader, ProgramRegistry, ProgramSpec};

use super::select_programs;

pub fn execute(
    config_path: &str,
    output: &Path,
    runs: u64,
    warmup: u64,
    median: bool,
    programs: &[String],
) -> anyhow::Result<()> {
    anyhow::ensure!(runs > 0, "--runs must be at least 1");

    let config = ConfigLoader::load_file(config_path)?;
    let registry = select_programs(ProgramRegistry::from_config(&config)?, programs)?;
    let harness = BenchmarkHarness::new().warmup(warmup).iterations(runs);

    let mut feed = BaselineFeed::default();
    let mut failed = Vec::new();

    for spec in registry.iter() {
        for (runtime, argv) in timed_commands(spec) {
            let command = TimedCommand::new(&spec.workdir, &argv)?;
            tracing::info!(program = %spec.name, runtime = %runtime, runs = runs, "Timing command");

            match harness.time_command(&command) {
                Ok(times) => {
                    let entry =
                        BaselineEntry::from_times(spec.name.as_str(), runtime, command.display(), times);
                    println!(
                        "✓ {:<20} {:<12} mean {:.3}s  median {:.3}s",
                        entry.name, entry.runtime, entry.mean, entry.median
                    );
                    feed.results.push(entry);
                }
                Err(e) => {
                    tracing::warn!(program = %spec.name, runtime = %runtime, error = %e, "Timing failed");
                    eprintln!("✗ {} ({}): {}", spec.name, runtime, e);
                    failed.push(format!("{}/{}", spec.name, runtime));
                }
            }
        }
    }

    let representative = if median {
        Representative::Median
    } else {
        Representative::Mean
    };
    normalize(&mut feed, representative);
    feed.system_info = Some(SystemInfo::collect());
    feed.save(output)?;

    println!();
    println!("Baseline feed written to {}", output.display());

    if !failed.is_empty() {
        anyhow::bail!("{} command(s) failed: {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

/// The baseline command first, then one command per configured backend.
fn timed_commands(spec: &ProgramSpec) -> Vec<(&'static str, Vec<String>)> {
    let mut commands = Vec::new();
    if let Some(argv) = spec.baseline_command() {
        commands.push((BASELINE_RUNTIME, argv));
    }
    for backend in spec.backends() {
        if let Some(argv) = spec.command(backend) {
            commands.push((backend.label(), argv));
        }
    }
    commands
}
