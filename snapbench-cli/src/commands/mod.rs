// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! CLI command modules.

pub mod analyze;
pub mod baseline;
pub mod compare;
pub mod list;
pub mod measure;
pub mod summarize;
pub mod validate;

use snapbench_core::{ProgramName, ProgramRegistry};

/// Narrow the registry to `names`, or keep all programs when none are given.
pub(crate) fn select_programs(
    registry: ProgramRegistry,
    names: &[String],
) -> anyhow::Result<ProgramRegistry> {
    if names.is_empty() {
        return Ok(registry);
    }
    let names = names
        .iter()
        .map(|name| ProgramName::new(name.as_str()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(registry.select(&names)?)
}
