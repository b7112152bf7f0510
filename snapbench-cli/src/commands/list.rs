// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `snapbench list` command - List programs from configuration.

use snapbench_core::{Backend, ConfigLoader, ProgramRegistry};

pub fn execute(config_path: &str) -> anyhow::Result<()> {
    let config = ConfigLoader::load_file(config_path)?;
    let registry = ProgramRegistry::from_config(&config)?;

    println!("╔══════════════════════════════════════════════════════════════════════════════╗");
    println!("║                             REGISTERED PROGRAMS                              ║");
    println!("╠═══════════════════╦═══════════════════════════╦═════════════╦════════════════╣");
    println!("║ Name              ║ Workdir                   ║ Backends    ║ Dwell          ║");
    println!("╠═══════════════════╬═══════════════════════════╬═════════════╬════════════════╣");

    for spec in registry.iter() {
        let backends: Vec<&str> = Backend::ALL
            .iter()
            .filter(|backend| spec.command(**backend).is_some())
            .map(|backend| match backend {
                Backend::External => "ext",
                Backend::InProcess => "in-proc",
            })
            .collect();
        let dwell = spec
            .dwell
            .map(|dwell| dwell.to_string())
            .unwrap_or_else(|| "from baseline".to_string());

        println!(
            "║ {:<17} ║ {:<25} ║ {:<11} ║ {:<14} ║",
            spec.name.as_str(),
            spec.workdir.display().to_string(),
            backends.join(","),
            dwell
        );
    }

    println!("╚═══════════════════╩═══════════════════════════╩═════════════╩════════════════╝");
    println!();
    println!("Total: {} program(s)", registry.len());

    Ok(())
}
