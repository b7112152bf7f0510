// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Read-only catalog of benchmark programs.
//!
//! Programs keep the order they were declared in, which is also the order
//! they are measured in.

use std::collections::HashMap;

use crate::config::{Config, ProgramSpec};
use crate::error::{HardValidationError, SnapError, SnapResult};
use crate::types::{Backend, ProgramName};

/// Registry of benchmark programs.
#[derive(Debug, Clone)]
pub struct ProgramRegistry {
    programs: Vec<ProgramSpec>,
    index: HashMap<ProgramName, usize>,
}

impl ProgramRegistry {
    /// Build a registry from already-validated program specs.
    pub fn new(programs: Vec<ProgramSpec>) -> SnapResult<Self> {
        let mut index = HashMap::with_capacity(programs.len());
        for (position, program) in programs.iter().enumerate() {
            if index.insert(program.name.clone(), position).is_some() {
                return Err(HardValidationError::DuplicateProgramName {
                    name: program.name.to_string(),
                }
                .into());
            }
        }
        Ok(Self { programs, index })
    }

    /// Build a registry from a loaded configuration.
    pub fn from_config(config: &Config) -> SnapResult<Self> {
        Self::new(config.programs.clone())
    }

    /// Get a program by name.
    pub fn get(&self, name: &ProgramName) -> SnapResult<&ProgramSpec> {
        self.index
            .get(name)
            .map(|&position| &self.programs[position])
            .ok_or_else(|| SnapError::ProgramNotFound(name.clone()))
    }

    /// All programs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &ProgramSpec> {
        self.programs.iter()
    }

    /// Programs that have a command for the given backend.
    pub fn supporting(&self, backend: Backend) -> impl Iterator<Item = &ProgramSpec> {
        self.programs
            .iter()
            .filter(move |program| program.command_variants.contains_key(&backend))
    }

    /// Restrict the registry to the named programs, keeping declaration order.
    pub fn select(&self, names: &[ProgramName]) -> SnapResult<Self> {
        for name in names {
            self.get(name)?;
        }
        let programs = self
            .programs
            .iter()
            .filter(|program| names.contains(&program.name))
            .cloned()
            .collect();
        Self::new(programs)
    }

    /// Get the number of registered programs.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}
