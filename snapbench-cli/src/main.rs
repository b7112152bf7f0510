// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Snapbench CLI
//!
//! Command-line interface for the checkpoint/restore latency harness.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use snapbench_core::Backend;
use tracing_subscriber::EnvFilter;

mod commands;

/// Snapbench - checkpoint/restore latency harness
#[derive(Parser)]
#[command(name = "snapbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "snapbench.yaml", global = true)]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect checkpoint/restore samples for every program
    Measure {
        /// Snapshot backend: external or in-process
        #[arg(short, long)]
        backend: Backend,

        /// Baseline timing feed used to derive dwell times
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Output CSV (default: chkpt-restore-<backend>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the configured number of samples per program
        #[arg(short = 'n', long)]
        runs: Option<u32>,

        /// Only measure these programs
        #[arg(short, long = "program")]
        programs: Vec<String>,
    },

    /// Time whole program runs and write the baseline timing feed
    Baseline {
        /// Output feed
        #[arg(short, long, default_value = "overhead.json")]
        output: PathBuf,

        /// Timed runs per command
        #[arg(short = 'n', long, default_value_t = 30)]
        runs: u64,

        /// Untimed runs before measuring
        #[arg(long, default_value_t = 1)]
        warmup: u64,

        /// Normalize ratios against the baseline median instead of the mean
        #[arg(long)]
        median: bool,

        /// Only time these programs
        #[arg(short, long = "program")]
        programs: Vec<String>,
    },

    /// Summarize a samples CSV with outlier filtering
    Summarize {
        /// Samples CSV written by `measure`
        input: PathBuf,

        /// Backend label recorded in the report
        #[arg(short, long)]
        backend: Option<String>,

        /// Directory for the JSON report
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,
    },

    /// Compare backends side by side
    Compare {
        /// Inputs as `label=path.csv`, first one sets the program order
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Directory for the JSON report
        #[arg(short, long, default_value = "results")]
        output_dir: PathBuf,
    },

    /// Median ratios per runtime from a baseline feed
    Analyze {
        /// Baseline timing feed
        feed: PathBuf,

        /// Runtime labels to analyze (default: every non-baseline runtime)
        runtimes: Vec<String>,
    },

    /// List registered programs
    List,

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        file: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch to command handlers
    match cli.command {
        Commands::Measure {
            backend,
            baseline,
            output,
            runs,
            programs,
        } => commands::measure::execute(
            &cli.config,
            backend,
            baseline.as_deref(),
            output,
            runs,
            &programs,
        ),
        Commands::Baseline {
            output,
            runs,
            warmup,
            median,
            programs,
        } => commands::baseline::execute(&cli.config, &output, runs, warmup, median, &programs),
        Commands::Summarize {
            input,
            backend,
            output_dir,
        } => commands::summarize::execute(&input, backend, &output_dir),
        Commands::Compare { inputs, output_dir } => {
            commands::compare::execute(&inputs, &output_dir)
        }
        Commands::Analyze { feed, runtimes } => commands::analyze::execute(&feed, &runtimes),
        Commands::List => commands::list::execute(&cli.config),
        Commands::Validate { file } => commands::validate::execute(&file),
    }
}
