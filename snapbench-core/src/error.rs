// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Custom error types for snapbench.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`
//! in the library - every failure the harness can observe has its own variant.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Backend, ProgramName};

/// Top-level error type for the measurement harness.
#[derive(Debug, Error)]
pub enum SnapError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Registry
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    #[error("Program not found in registry: {0}")]
    ProgramNotFound(ProgramName),

    #[error("Program {program} has no command for backend {backend}")]
    BackendNotConfigured {
        program: ProgramName,
        backend: Backend,
    },

    // =========================================================================
    // Measurement Errors
    // =========================================================================
    #[error("Attempt failed: {0}")]
    Attempt(#[from] AttemptError),

    #[error(
        "Giving up on {program} ({backend}) after {failures} failed attempts, last error: {last_error}"
    )]
    RetriesExhausted {
        program: ProgramName,
        backend: Backend,
        failures: u32,
        last_error: String,
    },

    #[error("Required tool not found: {tool}")]
    ToolNotFound { tool: &'static str },

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors stop the harness before any measurement starts.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Missing required field: {field} in {context}")]
    MissingRequiredField {
        field: &'static str,
        context: String,
    },

    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Duplicate program name: {name}")]
    DuplicateProgramName { name: String },

    #[error("Unknown signal name: {name}")]
    UnknownSignal { name: String },

    #[error("Schema validation failed: {message}")]
    SchemaValidation { message: String },
}

/// Coarse classification of a failed attempt, used for logging and counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Target could not be resolved by name (missing or ambiguous).
    ProcessResolution,
    /// Snapshot/decode tool exited non-zero or produced unusable output.
    ToolInvocation,
    /// A marker file never appeared inside the polling window.
    MarkerTimeout,
    /// Restore exited non-zero or exceeded its bound.
    RestoreFailure,
    /// The target itself misbehaved (bad exit, unparsable marker).
    Target,
    /// Spawning, signalling or filesystem trouble.
    Environment,
}

impl FailureKind {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProcessResolution => "process_resolution",
            Self::ToolInvocation => "tool_invocation",
            Self::MarkerTimeout => "marker_timeout",
            Self::RestoreFailure => "restore_failure",
            Self::Target => "target",
            Self::Environment => "environment",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Failure of a single checkpoint/restore attempt.
///
/// None of these abort a measurement run; the sampler logs them and starts
/// a fresh attempt until its retry cap is reached.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("Process '{name}' not found after launch")]
    ProcessNotFound { name: String },

    #[error("Process name '{name}' is ambiguous: pids {pids:?}")]
    AmbiguousProcess { name: String, pids: Vec<u32> },

    #[error("Failed to spawn {command}: {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("Failed to deliver {signal} to pid {pid}: {reason}")]
    SignalFailed {
        signal: String,
        pid: u32,
        reason: String,
    },

    #[error("Target exited with status {code:?}")]
    TargetFailed { code: Option<i32> },

    #[error("CRIU dump failed: {reason}")]
    DumpFailed { reason: String },

    #[error("Stats decode failed for {path}: {reason}")]
    DecodeFailed { path: PathBuf, reason: String },

    #[error("Marker file {path} did not appear within {waited_ms}ms")]
    MarkerTimeout { path: PathBuf, waited_ms: u64 },

    #[error("Marker file {path} is malformed: {reason}")]
    MarkerMalformed { path: PathBuf, reason: String },

    #[error("Restore failed: {reason}")]
    RestoreFailed { reason: String },

    #[error("Restore did not finish within {timeout_ms}ms")]
    RestoreTimeout { timeout_ms: u64 },

    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl AttemptError {
    /// Classify the failure.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ProcessNotFound { .. } | Self::AmbiguousProcess { .. } => {
                FailureKind::ProcessResolution
            }
            Self::DumpFailed { .. } | Self::DecodeFailed { .. } => FailureKind::ToolInvocation,
            Self::MarkerTimeout { .. } => FailureKind::MarkerTimeout,
            Self::RestoreFailed { .. } | Self::RestoreTimeout { .. } => {
                FailureKind::RestoreFailure
            }
            Self::TargetFailed { .. } | Self::MarkerMalformed { .. } => FailureKind::Target,
            Self::SpawnFailed { .. } | Self::SignalFailed { .. } | Self::Io { .. } => {
                FailureKind::Environment
            }
        }
    }

    /// Transient failures are scheduling races rather than backend defects.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ProcessNotFound { .. } | Self::MarkerTimeout { .. }
        )
    }
}

/// Result type alias using SnapError.
pub type SnapResult<T> = Result<T, SnapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::MissingRequiredField {
            field: "workdir",
            context: "program 'nbody'".to_string(),
        };
        assert!(err.to_string().contains("workdir"));
        assert!(err.to_string().contains("nbody"));
    }

    #[test]
    fn test_error_chain() {
        let validation_err = HardValidationError::UnknownSignal {
            name: "SIGFOO".to_string(),
        };
        let snap_err: SnapError = validation_err.into();
        assert!(matches!(snap_err, SnapError::HardValidation(_)));
    }

    #[test]
    fn test_attempt_error_classification() {
        let not_found = AttemptError::ProcessNotFound {
            name: "nbody.c.aot".to_string(),
        };
        assert!(not_found.is_transient());
        assert_eq!(not_found.kind(), FailureKind::ProcessResolution);

        let timeout = AttemptError::MarkerTimeout {
            path: PathBuf::from("chkpt-time.txt"),
            waited_ms: 1000,
        };
        assert!(timeout.is_transient());
        assert_eq!(timeout.kind(), FailureKind::MarkerTimeout);

        let dump = AttemptError::DumpFailed {
            reason: "exit status 1".to_string(),
        };
        assert!(!dump.is_transient());
        assert_eq!(dump.kind(), FailureKind::ToolInvocation);

        let ambiguous = AttemptError::AmbiguousProcess {
            name: "bfs.aot".to_string(),
            pids: vec![10, 11],
        };
        assert!(!ambiguous.is_transient());
        assert_eq!(ambiguous.kind(), FailureKind::ProcessResolution);
    }
}
