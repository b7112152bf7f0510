// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `snapbench validate` command - Validate configuration file.

use snapbench_core::ConfigLoader;

pub fn execute(file: &str) -> anyhow::Result<()> {
    tracing::info!(file = %file, "Validating configuration");

    match ConfigLoader::load_file(file) {
        Ok(config) => {
            let harness = &config.harness;
            println!("✓ Configuration is valid");
            println!();
            println!("Harness Settings:");
            println!("  Runs:                {}", harness.runs);
            println!("  Max Failed Attempts: {}", harness.max_failed_attempts);
            println!("  Default Dwell:       {}", harness.default_dwell);
            println!("  Signal:              {}", harness.signal.as_str());
            println!(
                "  Marker Polling:      {} x {}ms",
                harness.poll.attempts,
                harness.poll.interval.as_millis()
            );
            println!(
                "  Restore Timeout:     {}ms",
                harness.restore_timeout.as_millis()
            );
            println!(
                "  Snapshot Directory:  {}",
                harness.snapshot_dir.display()
            );
            println!();
            println!("Programs ({}):", config.programs.len());
            for spec in &config.programs {
                let backends: Vec<&str> = spec.backends().map(|backend| backend.label()).collect();
                println!(
                    "  - {} (workdir: {}, backends: {}, baseline: {})",
                    spec.name,
                    spec.workdir.display(),
                    backends.join(", "),
                    if spec.baseline.is_some() { "yes" } else { "no" }
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed:");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}
