// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! YAML program registry parser with strict schema validation.
//!
//! The registry is loaded once at startup. Any invalid field results in a
//! HardValidationError that prevents the harness from measuring anything.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use nix::sys::signal::Signal;
use serde::Deserialize;

use crate::error::{HardValidationError, SnapError, SnapResult};
use crate::types::{Backend, DwellTime, ProgramName, TimeUnit};

/// Maximum number of samples per program and backend.
const MAX_RUNS: u32 = 10_000;

/// Raw program entry as parsed from YAML (before validation).
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProgramConfig {
    name: String,
    #[serde(default = "default_workdir")]
    workdir: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    baseline: Option<Vec<String>>,
    #[serde(default)]
    backends: BTreeMap<Backend, Vec<String>>,
    #[serde(default)]
    dwell_ms: Option<f64>,
    #[serde(default)]
    process_name: Option<String>,
}

fn default_workdir() -> String {
    ".".to_string()
}

/// Raw marker file names for the in-process backend.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawMarkerConfig {
    #[serde(default = "default_snapshot_marker")]
    snapshot: String,
    #[serde(default = "default_checkpoint_marker")]
    checkpoint_time: String,
    #[serde(default = "default_restore_marker")]
    restore_time: String,
    #[serde(default)]
    unit: TimeUnit,
}

fn default_snapshot_marker() -> String {
    "checkpoint.pb".to_string()
}

fn default_checkpoint_marker() -> String {
    "chkpt-time.txt".to_string()
}

fn default_restore_marker() -> String {
    "restore-time.txt".to_string()
}

impl Default for RawMarkerConfig {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot_marker(),
            checkpoint_time: default_checkpoint_marker(),
            restore_time: default_restore_marker(),
            unit: TimeUnit::default(),
        }
    }
}

/// Raw harness configuration.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHarnessConfig {
    #[serde(default = "default_runs")]
    runs: u32,
    #[serde(default = "default_max_failed_attempts")]
    max_failed_attempts: u32,
    #[serde(default = "default_dwell_ms")]
    default_dwell_ms: f64,
    #[serde(default = "default_snapshot_dir")]
    snapshot_dir: String,
    #[serde(default)]
    criu_path: Option<String>,
    #[serde(default)]
    crit_path: Option<String>,
    #[serde(default = "default_signal")]
    signal: String,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default = "default_poll_attempts")]
    poll_attempts: u32,
    #[serde(default = "default_restore_timeout_ms")]
    restore_timeout_ms: u64,
    #[serde(default)]
    external_restore_timeout_ms: Option<u64>,
    #[serde(default)]
    markers: RawMarkerConfig,
}

fn default_runs() -> u32 {
    10
}

fn default_max_failed_attempts() -> u32 {
    100
}

fn default_dwell_ms() -> f64 {
    1.0
}

fn default_snapshot_dir() -> String {
    "checkpoint".to_string()
}

fn default_signal() -> String {
    "SIGUSR1".to_string()
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_poll_attempts() -> u32 {
    10
}

fn default_restore_timeout_ms() -> u64 {
    5_000
}

impl Default for RawHarnessConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            max_failed_attempts: default_max_failed_attempts(),
            default_dwell_ms: default_dwell_ms(),
            snapshot_dir: default_snapshot_dir(),
            criu_path: None,
            crit_path: None,
            signal: default_signal(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_attempts: default_poll_attempts(),
            restore_timeout_ms: default_restore_timeout_ms(),
            external_restore_timeout_ms: None,
            markers: RawMarkerConfig::default(),
        }
    }
}

/// Raw root configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    harness: RawHarnessConfig,
    programs: Vec<RawProgramConfig>,
}

/// Bounded polling discipline for marker files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub attempts: u32,
}

impl PollPolicy {
    /// Upper bound on how long a poll can wait.
    pub fn window(&self) -> Duration {
        self.interval * self.attempts
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(default_poll_interval_ms()),
            attempts: default_poll_attempts(),
        }
    }
}

/// Marker files written by an instrumented target into its working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerFiles {
    pub snapshot: String,
    pub checkpoint_time: String,
    pub restore_time: String,
    pub unit: TimeUnit,
}

impl Default for MarkerFiles {
    fn default() -> Self {
        Self {
            snapshot: default_snapshot_marker(),
            checkpoint_time: default_checkpoint_marker(),
            restore_time: default_restore_marker(),
            unit: TimeUnit::default(),
        }
    }
}

impl MarkerFiles {
    /// All marker names, for cleanup.
    pub fn all(&self) -> [&str; 3] {
        [&self.snapshot, &self.checkpoint_time, &self.restore_time]
    }
}

/// Validated harness settings.
#[derive(Debug, Clone)]
pub struct HarnessSettings {
    pub runs: u32,
    pub max_failed_attempts: u32,
    pub default_dwell: DwellTime,
    pub snapshot_dir: PathBuf,
    pub criu_path: Option<PathBuf>,
    pub crit_path: Option<PathBuf>,
    pub signal: Signal,
    pub poll: PollPolicy,
    pub restore_timeout: Duration,
    pub external_restore_timeout: Option<Duration>,
    pub markers: MarkerFiles,
}

/// Validated benchmark program.
#[derive(Debug, Clone)]
pub struct ProgramSpec {
    pub name: ProgramName,
    pub workdir: PathBuf,
    pub args: Vec<String>,
    pub baseline: Option<Vec<String>>,
    pub command_variants: BTreeMap<Backend, Vec<String>>,
    pub dwell: Option<DwellTime>,
    pub process_name: Option<String>,
}

impl ProgramSpec {
    /// Full argument vector for a backend: the variant followed by the shared args.
    pub fn command(&self, backend: Backend) -> Option<Vec<String>> {
        self.command_variants
            .get(&backend)
            .map(|variant| self.with_args(variant))
    }

    /// Full argument vector of the non-instrumented baseline, if configured.
    pub fn baseline_command(&self) -> Option<Vec<String>> {
        self.baseline.as_ref().map(|variant| self.with_args(variant))
    }

    fn with_args(&self, variant: &[String]) -> Vec<String> {
        variant.iter().chain(self.args.iter()).cloned().collect()
    }

    /// Backends this program can be measured under.
    pub fn backends(&self) -> impl Iterator<Item = Backend> + '_ {
        self.command_variants.keys().copied()
    }

    /// Name the target shows up under in the process table.
    pub fn process_name(&self, backend: Backend) -> Option<String> {
        if let Some(name) = &self.process_name {
            return Some(name.clone());
        }
        let program = self.command_variants.get(&backend)?.first()?;
        Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// Join `program` onto `workdir` when it is a relative path like `./bin/x`.
/// Bare names are left for `PATH` lookup.
pub fn resolve_in_workdir(workdir: &Path, program: &str) -> PathBuf {
    let path = Path::new(program);
    if path.is_relative() && path.components().count() > 1 {
        workdir.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Complete validated configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub harness: HarnessSettings,
    pub programs: Vec<ProgramSpec>,
}

/// Configuration loader with strict validation.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration from a YAML file.
    pub fn load_file(path: impl AsRef<Path>) -> SnapResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SnapError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| SnapError::Io {
            context: "reading config file",
            source: e,
        })?;

        Self::load_string(&content)
    }

    /// Load and validate configuration from a YAML string.
    pub fn load_string(content: &str) -> SnapResult<Config> {
        let raw: RawConfig = serde_yaml::from_str(content).map_err(|e| SnapError::ConfigParse {
            message: format!("YAML parse error: {}", e),
        })?;

        Self::validate(raw)
    }

    fn validate(raw: RawConfig) -> SnapResult<Config> {
        let harness = Self::validate_harness(raw.harness)?;

        let mut programs = Vec::with_capacity(raw.programs.len());
        let mut seen_names = HashSet::new();

        for (index, raw_program) in raw.programs.into_iter().enumerate() {
            let program = Self::validate_program(raw_program, index)?;

            if !seen_names.insert(program.name.clone()) {
                return Err(HardValidationError::DuplicateProgramName {
                    name: program.name.to_string(),
                }
                .into());
            }

            programs.push(program);
        }

        if programs.is_empty() {
            return Err(HardValidationError::SchemaValidation {
                message: "At least one program must be defined".to_string(),
            }
            .into());
        }

        Ok(Config { harness, programs })
    }

    fn validate_harness(raw: RawHarnessConfig) -> SnapResult<HarnessSettings> {
        if raw.runs == 0 || raw.runs > MAX_RUNS {
            return Err(HardValidationError::InvalidFieldValue {
                field: "runs",
                value: raw.runs.to_string(),
                reason: format!("Must be between 1 and {}", MAX_RUNS),
            }
            .into());
        }

        if raw.max_failed_attempts == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "max_failed_attempts",
                value: "0".to_string(),
                reason: "At least one failed attempt must be tolerated".to_string(),
            }
            .into());
        }

        if raw.poll_interval_ms == 0 || raw.poll_attempts == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "poll_interval_ms/poll_attempts",
                value: format!("{}/{}", raw.poll_interval_ms, raw.poll_attempts),
                reason: "Polling interval and attempt count must be greater than 0".to_string(),
            }
            .into());
        }

        if raw.restore_timeout_ms == 0 {
            return Err(HardValidationError::InvalidFieldValue {
                field: "restore_timeout_ms",
                value: "0".to_string(),
                reason: "Restore timeout must be greater than 0".to_string(),
            }
            .into());
        }

        if raw.external_restore_timeout_ms == Some(0) {
            return Err(HardValidationError::InvalidFieldValue {
                field: "external_restore_timeout_ms",
                value: "0".to_string(),
                reason: "Omit the field to wait without a bound".to_string(),
            }
            .into());
        }

        for (field, value) in [
            ("markers.snapshot", &raw.markers.snapshot),
            ("markers.checkpoint_time", &raw.markers.checkpoint_time),
            ("markers.restore_time", &raw.markers.restore_time),
        ] {
            if value.is_empty() || value.contains('/') {
                return Err(HardValidationError::InvalidFieldValue {
                    field,
                    value: value.clone(),
                    reason: "Marker must be a plain file name".to_string(),
                }
                .into());
            }
        }

        let default_dwell = DwellTime::from_millis(raw.default_dwell_ms)?;
        let signal = parse_signal(&raw.signal)?;

        Ok(HarnessSettings {
            runs: raw.runs,
            max_failed_attempts: raw.max_failed_attempts,
            default_dwell,
            snapshot_dir: PathBuf::from(raw.snapshot_dir),
            criu_path: raw.criu_path.map(PathBuf::from),
            crit_path: raw.crit_path.map(PathBuf::from),
            signal,
            poll: PollPolicy {
                interval: Duration::from_millis(raw.poll_interval_ms),
                attempts: raw.poll_attempts,
            },
            restore_timeout: Duration::from_millis(raw.restore_timeout_ms),
            external_restore_timeout: raw.external_restore_timeout_ms.map(Duration::from_millis),
            markers: MarkerFiles {
                snapshot: raw.markers.snapshot,
                checkpoint_time: raw.markers.checkpoint_time,
                restore_time: raw.markers.restore_time,
                unit: raw.markers.unit,
            },
        })
    }

    fn validate_program(raw: RawProgramConfig, index: usize) -> SnapResult<ProgramSpec> {
        let context = format!("program at index {}", index);

        let name = ProgramName::new(&raw.name)?;

        if raw.workdir.is_empty() {
            return Err(HardValidationError::MissingRequiredField {
                field: "workdir",
                context,
            }
            .into());
        }

        if raw.backends.is_empty() && raw.baseline.is_none() {
            return Err(HardValidationError::MissingRequiredField {
                field: "backends",
                context: format!("{} ({})", context, name),
            }
            .into());
        }

        for (backend, command) in &raw.backends {
            if command.is_empty() || command[0].is_empty() {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "backends",
                    value: backend.to_string(),
                    reason: format!("Empty command for {} in {}", backend, name),
                }
                .into());
            }
        }

        if let Some(baseline) = &raw.baseline {
            if baseline.is_empty() || baseline[0].is_empty() {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "baseline",
                    value: "[]".to_string(),
                    reason: format!("Empty baseline command in {}", name),
                }
                .into());
            }
        }

        let dwell = raw.dwell_ms.map(DwellTime::from_millis).transpose()?;

        if let Some(process_name) = &raw.process_name {
            if process_name.is_empty() {
                return Err(HardValidationError::InvalidFieldValue {
                    field: "process_name",
                    value: String::new(),
                    reason: "Process name override cannot be empty".to_string(),
                }
                .into());
            }
        }

        Ok(ProgramSpec {
            name,
            workdir: PathBuf::from(raw.workdir),
            args: raw.args,
            baseline: raw.baseline,
            command_variants: raw.backends,
            dwell,
            process_name: raw.process_name,
        })
    }
}

/// Parse `SIGUSR1`, `USR1` or a bare signal number.
pub fn parse_signal(name: &str) -> Result<Signal, HardValidationError> {
    let unknown = || HardValidationError::UnknownSignal {
        name: name.to_string(),
    };

    if let Ok(number) = name.parse::<i32>() {
        return Signal::try_from(number).map_err(|_| unknown());
    }

    let upper = name.to_ascii_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{}", upper)
    };
    Signal::from_str(&full).map_err(|_| unknown())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_CONFIG: &str = r#"
harness:
  runs: 5
  max_failed_attempts: 20
  snapshot_dir: /tmp/snapbench-checkpoint
  signal: SIGUSR1
  poll_interval_ms: 50
  poll_attempts: 4
  markers:
    unit: us

programs:
  - name: nbody
    workdir: /opt/bench
    args: ["1000000"]
    baseline: ["./wanco-artifacts/nbody.c.aot", "--"]
    backends:
      external: ["./wanco-artifacts/nbody.c.aot", "--"]
      in-process: ["./wanco-artifacts/nbody.c.cr.aot", "--"]
"#;

    #[test]
    fn test_valid_config() {
        let config = ConfigLoader::load_string(VALID_CONFIG).unwrap();
        assert_eq!(config.programs.len(), 1);
        assert_eq!(config.harness.runs, 5);
        assert_eq!(config.harness.poll.window(), Duration::from_millis(200));
        assert_eq!(config.harness.markers.unit, TimeUnit::Microseconds);
        assert_eq!(config.harness.signal, Signal::SIGUSR1);

        let program = &config.programs[0];
        assert_eq!(program.name.as_str(), "nbody");
        assert_eq!(
            program.command(Backend::InProcess).unwrap(),
            vec!["./wanco-artifacts/nbody.c.cr.aot", "--", "1000000"]
        );
        assert_eq!(
            program.process_name(Backend::InProcess).as_deref(),
            Some("nbody.c.cr.aot")
        );
        assert_eq!(
            resolve_in_workdir(&program.workdir, "./wanco-artifacts/nbody.c.aot"),
            PathBuf::from("/opt/bench/./wanco-artifacts/nbody.c.aot")
        );
        assert_eq!(resolve_in_workdir(&program.workdir, "sleep"), PathBuf::from("sleep"));
    }

    #[test]
    fn test_defaults_applied() {
        let yaml = r#"
programs:
  - name: nop
    backends:
      in-process: ["./nop.c.cr.aot"]
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(config.harness.runs, 10);
        assert_eq!(config.harness.max_failed_attempts, 100);
        assert_eq!(config.harness.poll, PollPolicy::default());
        assert_eq!(config.harness.restore_timeout, Duration::from_secs(5));
        assert!(config.harness.external_restore_timeout.is_none());
        assert_eq!(config.harness.markers, MarkerFiles::default());
        assert_eq!(config.programs[0].workdir, PathBuf::from("."));
        assert!(config.programs[0].command(Backend::External).is_none());
    }

    #[test]
    fn test_missing_programs() {
        let yaml = r#"
harness:
  runs: 3
programs: []
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_duplicate_names() {
        let yaml = r#"
programs:
  - name: bfs
    backends:
      external: ["./bfs.aot"]
  - name: bfs
    backends:
      external: ["./bfs.aot"]
"#;
        let result = ConfigLoader::load_string(yaml);
        assert!(matches!(
            result,
            Err(SnapError::HardValidation(
                HardValidationError::DuplicateProgramName { .. }
            ))
        ));
    }

    #[test]
    fn test_empty_backend_command() {
        let yaml = r#"
programs:
  - name: bfs
    backends:
      external: []
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_unknown_backend() {
        let yaml = r#"
programs:
  - name: bfs
    backends:
      docker: ["./bfs.aot"]
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_zero_runs_rejected() {
        let yaml = r#"
harness:
  runs: 0
programs:
  - name: bfs
    backends:
      external: ["./bfs.aot"]
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_bad_signal_rejected() {
        let yaml = r#"
harness:
  signal: SIGNOPE
programs:
  - name: bfs
    backends:
      in-process: ["./bfs.cr.aot"]
"#;
        assert!(ConfigLoader::load_string(yaml).is_err());
    }

    #[test]
    fn test_parse_signal_forms() {
        assert_eq!(parse_signal("SIGUSR1").unwrap(), Signal::SIGUSR1);
        assert_eq!(parse_signal("usr2").unwrap(), Signal::SIGUSR2);
        assert_eq!(parse_signal("10").unwrap(), Signal::SIGUSR1);
        assert!(parse_signal("9999").is_err());
    }

    #[test]
    fn test_process_name_override() {
        let yaml = r#"
programs:
  - name: llama2.c
    workdir: llama2-c
    process_name: run.c.aot
    backends:
      external: ["../wanco-artifacts/run.c.aot", "--"]
"#;
        let config = ConfigLoader::load_string(yaml).unwrap();
        assert_eq!(
            config.programs[0].process_name(Backend::External).as_deref(),
            Some("run.c.aot")
        );
    }
}
