// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers for validated inputs.
//!
//! All types validate their invariants at creation time.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HardValidationError;

/// Maximum length of a program name.
const MAX_PROGRAM_NAME_LEN: usize = 64;

/// Validated benchmark program name.
/// Must be non-empty, alphanumeric with `-`, `_` or `.`, max 64 chars.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProgramName(String);

impl ProgramName {
    /// Create a new ProgramName with validation.
    pub fn new(name: impl Into<String>) -> Result<Self, HardValidationError> {
        let name = name.into();

        if name.is_empty() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "name",
                value: name,
                reason: "Program name cannot be empty".to_string(),
            });
        }

        if name.len() > MAX_PROGRAM_NAME_LEN {
            return Err(HardValidationError::InvalidFieldValue {
                field: "name",
                value: name.clone(),
                reason: format!(
                    "Program name too long: {} chars (max {})",
                    name.len(),
                    MAX_PROGRAM_NAME_LEN
                ),
            });
        }

        // Names end up in CSV rows, so no separators or whitespace.
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
        {
            return Err(HardValidationError::InvalidFieldValue {
                field: "name",
                value: name,
                reason: "Program name must contain only alphanumeric characters, '-', '_' and '.'"
                    .to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ProgramName {
    type Error = HardValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProgramName> for String {
    fn from(name: ProgramName) -> Self {
        name.0
    }
}

/// Snapshot mechanism under measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// Whole-process snapshot taken by an external dump/restore CLI against a pid.
    External,
    /// Application-level snapshot triggered by a signal, reported through marker files.
    InProcess,
}

impl Backend {
    /// All backends, in reporting order.
    pub const ALL: [Backend; 2] = [Backend::External, Backend::InProcess];

    /// Stable label used in the registry, the baseline feed and output files.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::InProcess => "in-process",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Backend {
    type Err = HardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "external" | "criu" => Ok(Self::External),
            "in-process" | "inprocess" | "wanco-cr" => Ok(Self::InProcess),
            other => Err(HardValidationError::InvalidFieldValue {
                field: "backend",
                value: other.to_string(),
                reason: "Expected 'external' or 'in-process'".to_string(),
            }),
        }
    }
}

/// Unit of the numbers an instrumented target writes into its marker files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimeUnit {
    #[serde(rename = "us")]
    Microseconds,
    #[default]
    #[serde(rename = "ms")]
    Milliseconds,
    #[serde(rename = "s")]
    Seconds,
}

impl TimeUnit {
    /// Convert a value in this unit to milliseconds.
    pub fn to_millis(&self, value: f64) -> f64 {
        match self {
            Self::Microseconds => value / 1_000.0,
            Self::Milliseconds => value,
            Self::Seconds => value * 1_000.0,
        }
    }
}

/// Time to wait after launch before triggering the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DwellTime(f64);

impl DwellTime {
    /// Create a dwell time from milliseconds. Negative, non-finite, or values
    /// too large for a `Duration` are rejected.
    pub fn from_millis(ms: f64) -> Result<Self, HardValidationError> {
        if !ms.is_finite() || ms < 0.0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "dwell_ms",
                value: ms.to_string(),
                reason: "Dwell time must be a finite, non-negative number".to_string(),
            });
        }
        if Duration::try_from_secs_f64(ms / 1_000.0).is_err() {
            return Err(HardValidationError::InvalidFieldValue {
                field: "dwell_ms",
                value: ms.to_string(),
                reason: "Dwell time is too large".to_string(),
            });
        }
        Ok(Self(ms))
    }

    /// Half of a measured runtime, so the snapshot lands mid-execution.
    pub fn half_of_runtime_secs(runtime_secs: f64) -> Result<Self, HardValidationError> {
        Self::from_millis(runtime_secs * 1_000.0 / 2.0)
    }

    /// Dwell in milliseconds.
    pub fn millis(&self) -> f64 {
        self.0
    }

    /// Saturates at `Duration::MAX` for values that bypassed `from_millis`.
    pub fn as_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.0 / 1_000.0).unwrap_or(Duration::MAX)
    }
}

impl fmt::Display for DwellTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}ms", self.0)
    }
}
