//! Snapbench Core Library
//!
//! Checkpoint/restore latency measurement harness. Drives benchmark programs
//! to a point mid-execution, snapshots them with either CRIU or the runtime's
//! own signal-triggered checkpointing, restores them, and collects timing and
//! size samples.

pub mod attempt;
pub mod config;
pub mod criu;
pub mod error;
pub mod locator;
pub mod process;
pub mod registry;
pub mod sampler;
pub mod types;

// Re-export commonly used types
pub use attempt::{Attempt, AttemptOutcome, AttemptPlan, SnapshotBackend};
pub use config::{Config, ConfigLoader, HarnessSettings, MarkerFiles, PollPolicy, ProgramSpec};
pub use error::{AttemptError, FailureKind, HardValidationError, SnapError, SnapResult};
pub use locator::{ProcessLocator, SysinfoLocator};
pub use registry::ProgramRegistry;
pub use sampler::{measure_program, RetryPolicy, SampleSet};
pub use types::{Backend, DwellTime, ProgramName, TimeUnit};
