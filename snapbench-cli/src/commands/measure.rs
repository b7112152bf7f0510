// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `snapbench measure` command - Collect checkpoint/restore samples.
//!
//! Programs are measured one after another in registry order. A program that
//! runs out of retries is reported and skipped; its rows are never written.

use std::path::{Path, PathBuf};

use anyhow::Context;
use snapbench_benchmark::metrics::format_millis;
use snapbench_benchmark::{BaselineFeed, CsvWriter, SampleRow, SummaryRecord};
use snapbench_core::{
    measure_program, Backend, ConfigLoader, DwellTime, HarnessSettings, ProgramRegistry,
    ProgramSpec, SnapError, SnapshotBackend, SysinfoLocator,
};

use super::select_programs;

pub fn execute(
    config_path: &str,
    backend: Backend,
    baseline: Option<&Path>,
    output: Option<PathBuf>,
    runs: Option<u32>,
    programs: &[String],
) -> anyhow::Result<()> {
    let config = ConfigLoader::load_file(config_path)?;
    let registry = select_programs(ProgramRegistry::from_config(&config)?, programs)?;

    let mut settings = config.harness.clone();
    if let Some(runs) = runs {
        anyhow::ensure!(runs > 0, "--runs must be at least 1");
        settings.runs = runs;
    }

    let feed = baseline
        .map(|path| {
            BaselineFeed::load(path)
                .with_context(|| format!("loading baseline feed {}", path.display()))
        })
        .transpose()?;

    // Resolves criu/crit up front for the external backend.
    let snapshot_backend = SnapshotBackend::from_settings(backend, &settings)?;
    let locator = SysinfoLocator::new();

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("chkpt-restore-{}.csv", backend.label())));
    let mut writer = CsvWriter::create(&output)?;

    tracing::info!(
        backend = %backend,
        programs = registry.len(),
        runs = settings.runs,
        output = %output.display(),
        "Starting measurement"
    );

    for spec in registry.iter().filter(|spec| spec.command(backend).is_none()) {
        tracing::warn!(program = %spec.name, backend = %backend, "No command for backend, skipping");
    }

    let mut exhausted = Vec::new();
    for spec in registry.supporting(backend) {
        let dwell = resolve_dwell(spec, backend, feed.as_ref(), &settings);
        match measure_program(spec, &snapshot_backend, &settings, &locator, dwell) {
            Ok(samples) => {
                writer.write_rows(&SampleRow::from_sample_set(&samples))?;
                let summary = SummaryRecord::from_sample_set(&samples);
                println!(
                    "✓ {} ({} samples, {} failed attempts) checkpoint {} restore {}",
                    spec.name,
                    samples.len(),
                    samples.failed_attempts,
                    summary.checkpoint.map(|s| format_millis(s.mean)).unwrap_or_default(),
                    summary.restore.map(|s| format_millis(s.mean)).unwrap_or_default(),
                );
            }
            Err(e @ SnapError::RetriesExhausted { .. }) => {
                tracing::error!(program = %spec.name, backend = %backend, error = %e, "Program skipped");
                eprintln!("✗ {}", e);
                exhausted.push(spec.name.to_string());
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!();
    println!("Samples written to {}", output.display());

    if !exhausted.is_empty() {
        anyhow::bail!(
            "{} program(s) ran out of retries: {}",
            exhausted.len(),
            exhausted.join(", ")
        );
    }
    Ok(())
}

/// Dwell time for one program.
///
/// A per-program override wins, then the feed entry for this backend, then
/// the feed's baseline entry, then the configured default.
pub(crate) fn resolve_dwell(
    spec: &ProgramSpec,
    backend: Backend,
    feed: Option<&BaselineFeed>,
    settings: &HarnessSettings,
) -> DwellTime {
    if let Some(dwell) = spec.dwell {
        return dwell;
    }
    match feed.and_then(|feed| feed.dwell_for(spec.name.as_str(), backend.label())) {
        Some(dwell) => dwell,
        None => {
            if feed.is_some() {
                tracing::warn!(
                    program = %spec.name,
                    dwell = %settings.default_dwell,
                    "No baseline timing for program, using default dwell"
                );
            }
            settings.default_dwell
        }
    }
}
