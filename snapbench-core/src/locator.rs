// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Name-based process resolution.
//!
//! The harness does not control how a runtime wraps or forks the target, so
//! the process to snapshot or signal is found by name in the process table.

use std::collections::HashSet;

use sysinfo::{ProcessStatus, System};

use crate::error::AttemptError;

/// Kernel limit on `/proc/<pid>/comm` (TASK_COMM_LEN - 1).
const COMM_LEN: usize = 15;

/// Capability to find live processes by name.
pub trait ProcessLocator {
    /// Pids of every live process called `name`.
    fn find_by_name(&self, name: &str) -> Vec<u32>;

    /// Resolve exactly one pid for `name`.
    ///
    /// No match is a transient race; several matches are an error because
    /// picking one would snapshot an arbitrary process.
    fn locate_unique(&self, name: &str) -> Result<u32, AttemptError> {
        let mut pids = self.find_by_name(name);
        match pids.len() {
            0 => Err(AttemptError::ProcessNotFound {
                name: name.to_string(),
            }),
            1 => Ok(pids[0]),
            _ => {
                pids.sort_unstable();
                Err(AttemptError::AmbiguousProcess {
                    name: name.to_string(),
                    pids,
                })
            }
        }
    }
}

/// Process table lookup backed by `sysinfo`.
#[derive(Debug, Default)]
pub struct SysinfoLocator;

impl SysinfoLocator {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessLocator for SysinfoLocator {
    fn find_by_name(&self, name: &str) -> Vec<u32> {
        let mut system = System::new();
        system.refresh_processes();

        let own_pid = sysinfo::get_current_pid().ok();

        // Threads are listed next to their process; only thread-group leaders count.
        let mut threads = HashSet::new();
        for (pid, process) in system.processes() {
            if let Some(tasks) = process.tasks() {
                threads.extend(tasks.iter().filter(|task| *task != pid).copied());
            }
        }

        system
            .processes()
            .iter()
            .filter(|(pid, _)| Some(**pid) != own_pid && !threads.contains(*pid))
            .filter(|(_, process)| !matches!(process.status(), ProcessStatus::Zombie))
            .filter(|(_, process)| {
                let argv0 = process
                    .cmd()
                    .first()
                    .and_then(|arg| std::path::Path::new(arg).file_name())
                    .map(|arg| arg.to_string_lossy().into_owned());
                name_matches(process.name(), argv0.as_deref(), name)
            })
            .map(|(pid, _)| pid.as_u32())
            .collect()
    }
}

/// Match a process table entry against a wanted executable name.
///
/// `comm` is truncated by the kernel, so a full-length comm that is a prefix
/// of the wanted name only counts when argv[0] confirms it.
fn name_matches(comm: &str, argv0: Option<&str>, wanted: &str) -> bool {
    if comm == wanted {
        return true;
    }
    if comm.len() == COMM_LEN && wanted.len() > COMM_LEN && wanted.starts_with(comm) {
        return argv0.map_or(true, |argv0| argv0 == wanted);
    }
    false
}
