//! Snapbench result processing
//!
//! Turns raw checkpoint/restore samples into the numbers people look at:
//!
//! - **Baseline feed**: wall-clock runtimes of each program, used for dwell times
//! - **Ratios**: runtimes normalized against the non-instrumented run
//! - **Summaries**: IQR-filtered checkpoint, restore and total statistics
//! - **Comparisons**: several backends side by side, per program
//!
//! # Data Output
//!
//! Samples are CSV tables; everything derived from them is JSON.

pub mod baseline;
pub mod harness;
pub mod metrics;
pub mod ratio;
pub mod reporter;
pub mod stats;

pub use baseline::{BaselineEntry, BaselineFeed, BASELINE_RUNTIME};
pub use harness::{BenchmarkHarness, HarnessError, TimedCommand};
pub use metrics::{
    ComparisonReport, ProgramComparison, SeriesStats, SummaryRecord, SummaryReport, SystemInfo,
};
pub use ratio::{analyze_ratios, normalize, RatioAnalysis, Representative};
pub use reporter::{read_samples, CsvWriter, JsonReporter, ReporterError, SampleRow};
pub use stats::{IqrBounds, OutlierFilter};
