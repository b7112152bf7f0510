// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Sample collection.
//!
//! Attempts for one program run strictly one after another until the target
//! count of successes is reached. Failed attempts are logged and retried,
//! up to a cap after which the program is reported as failed.

use serde::Serialize;

use crate::attempt::{self, Attempt, AttemptOutcome, AttemptPlan, SnapshotBackend};
use crate::config::{HarnessSettings, ProgramSpec};
use crate::error::{AttemptError, SnapError, SnapResult};
use crate::locator::ProcessLocator;
use crate::types::{Backend, DwellTime, ProgramName};

/// How many failed attempts a single program may accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_failed_attempts: u32,
}

impl RetryPolicy {
    pub fn from_settings(settings: &HarnessSettings) -> Self {
        Self {
            max_failed_attempts: settings.max_failed_attempts,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 100,
        }
    }
}

/// Successful attempts for one (program, backend) pair, in the order taken.
#[derive(Debug, Clone, Serialize)]
pub struct SampleSet {
    pub program: ProgramName,
    pub backend: Backend,
    attempts: Vec<Attempt>,
    /// Attempts discarded on the way to a complete set.
    pub failed_attempts: u32,
}

impl SampleSet {
    pub fn new(program: ProgramName, backend: Backend) -> Self {
        Self {
            program,
            backend,
            attempts: Vec::new(),
            failed_attempts: 0,
        }
    }

    pub fn push(&mut self, attempt: Attempt) {
        self.attempts.push(attempt);
    }

    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn checkpoint_ms(&self) -> Vec<f64> {
        self.attempts.iter().map(|a| a.checkpoint_ms).collect()
    }

    pub fn restore_ms(&self) -> Vec<f64> {
        self.attempts.iter().map(|a| a.restore_ms).collect()
    }
}

/// Run `attempt` until `target_n` successes are collected.
///
/// # Errors
/// Returns `SnapError::RetriesExhausted` once `policy.max_failed_attempts`
/// attempts have failed. No partial sample set is returned.
pub fn collect<F>(
    program: &ProgramName,
    backend: Backend,
    target_n: u32,
    policy: RetryPolicy,
    mut attempt: F,
) -> SnapResult<SampleSet>
where
    F: FnMut() -> Result<Attempt, AttemptError>,
{
    let mut samples = SampleSet::new(program.clone(), backend);

    while samples.len() < target_n as usize {
        let result = attempt();
        let outcome = AttemptOutcome::from_result(&result);
        match result {
            Ok(sample) => {
                samples.push(sample);
                tracing::info!(
                    program = %program,
                    backend = %backend,
                    sample = samples.len(),
                    target = target_n,
                    checkpoint_ms = sample.checkpoint_ms,
                    restore_ms = sample.restore_ms,
                    "Sample collected"
                );
            }
            Err(e) => {
                samples.failed_attempts += 1;
                tracing::warn!(
                    program = %program,
                    backend = %backend,
                    kind = %e.kind(),
                    transient = matches!(outcome, AttemptOutcome::TransientFailure(_)),
                    failures = samples.failed_attempts,
                    error = %e,
                    "Attempt failed, retrying"
                );

                if samples.failed_attempts >= policy.max_failed_attempts {
                    return Err(SnapError::RetriesExhausted {
                        program: program.clone(),
                        backend,
                        failures: samples.failed_attempts,
                        last_error: e.to_string(),
                    });
                }
            }
        }
    }

    Ok(samples)
}

/// Measure one program under one backend.
pub fn measure_program(
    spec: &ProgramSpec,
    backend: &SnapshotBackend,
    settings: &HarnessSettings,
    locator: &dyn ProcessLocator,
    dwell: DwellTime,
) -> SnapResult<SampleSet> {
    let plan = AttemptPlan::new(spec, backend.kind())?;

    tracing::info!(
        program = %spec.name,
        backend = %backend.kind(),
        dwell = %dwell,
        runs = settings.runs,
        "Measuring program"
    );

    let samples = collect(
        &spec.name,
        backend.kind(),
        settings.runs,
        RetryPolicy::from_settings(settings),
        || attempt::run(&plan, backend, locator, dwell),
    )?;

    tracing::info!(
        program = %spec.name,
        backend = %backend.kind(),
        samples = samples.len(),
        failed_attempts = samples.failed_attempts,
        "Program measured"
    );

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(checkpoint_ms: f64) -> Attempt {
        Attempt {
            dwell_ms: 1000.0,
            checkpoint_ms,
            restore_ms: 5.0,
            snapshot_size_bytes: 1024,
        }
    }

    fn name() -> ProgramName {
        ProgramName::new("P").unwrap()
    }

    #[test]
    fn test_collects_target_count() {
        let mut next = [12.0, 13.0, 40.0].into_iter();
        let samples = collect(&name(), Backend::External, 3, RetryPolicy::default(), || {
            Ok(sample(next.next().unwrap()))
        })
        .unwrap();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples.checkpoint_ms(), vec![12.0, 13.0, 40.0]);
        assert_eq!(samples.restore_ms(), vec![5.0, 5.0, 5.0]);
        assert_eq!(samples.failed_attempts, 0);
    }

    #[test]
    fn test_failures_are_retried() {
        let mut calls = 0;
        let samples = collect(&name(), Backend::InProcess, 2, RetryPolicy::default(), || {
            calls += 1;
            if calls % 2 == 1 {
                Err(AttemptError::MarkerTimeout {
                    path: "chkpt-time.txt".into(),
                    waited_ms: 1000,
                })
            } else {
                Ok(sample(1.0))
            }
        })
        .unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples.failed_attempts, 2);
        assert_eq!(calls, 4);
    }

    #[test]
    fn test_retry_cap_escalates() {
        let mut calls = 0;
        let result = collect(
            &name(),
            Backend::External,
            3,
            RetryPolicy {
                max_failed_attempts: 5,
            },
            || {
                calls += 1;
                Err(AttemptError::DumpFailed {
                    reason: "exit status 1".to_string(),
                })
            },
        );

        assert_eq!(calls, 5);
        match result {
            Err(SnapError::RetriesExhausted {
                failures,
                last_error,
                ..
            }) => {
                assert_eq!(failures, 5);
                assert!(last_error.contains("exit status 1"));
            }
            other => panic!("unexpected result: {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_successes_do_not_count_against_cap() {
        let mut calls = 0;
        let samples = collect(
            &name(),
            Backend::External,
            3,
            RetryPolicy {
                max_failed_attempts: 2,
            },
            || {
                calls += 1;
                if calls == 2 {
                    Err(AttemptError::ProcessNotFound {
                        name: "P".to_string(),
                    })
                } else {
                    Ok(sample(2.0))
                }
            },
        )
        .unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples.failed_attempts, 1);
    }
}
