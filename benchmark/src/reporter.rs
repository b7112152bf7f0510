// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Sample tables and JSON reports.
//!
//! Samples are stored as CSV, one row per successful attempt:
//! `program,checkpoint_time,restore_time,snapshot_size` (ms, ms, bytes).

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snapbench_core::SampleSet;
use thiserror::Error;

/// Column header of a sample table.
pub const CSV_HEADER: &str = "program,checkpoint_time,restore_time,snapshot_size";

/// Errors that can occur while reading or writing results.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Malformed sample table {path}, line {line}: {reason}")]
    Csv {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// One row of a sample table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    pub program: String,
    pub checkpoint_time: f64,
    pub restore_time: f64,
    pub snapshot_size: u64,
}

impl SampleRow {
    /// Rows for every attempt of a completed sample set.
    pub fn from_sample_set(samples: &SampleSet) -> Vec<Self> {
        samples
            .attempts()
            .iter()
            .map(|attempt| Self {
                program: samples.program.to_string(),
                checkpoint_time: attempt.checkpoint_ms,
                restore_time: attempt.restore_ms,
                snapshot_size: attempt.snapshot_size_bytes,
            })
            .collect()
    }

    fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.program, self.checkpoint_time, self.restore_time, self.snapshot_size
        )
    }

    fn parse(line: &str) -> Result<Self, String> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let &[program, checkpoint, restore, size] = fields.as_slice() else {
            return Err(format!("expected 4 fields, found {}", fields.len()));
        };
        if program.is_empty() {
            return Err("empty program name".to_string());
        }

        let number = |name: &str, value: &str| {
            value
                .parse::<f64>()
                .map_err(|_| format!("invalid {}: {:?}", name, value))
        };
        // Sizes written by other tools may carry a fractional part.
        let snapshot_size = size
            .parse::<u64>()
            .or_else(|_| number("snapshot_size", size).map(|v| v as u64))?;

        Ok(Self {
            program: program.to_string(),
            checkpoint_time: number("checkpoint_time", checkpoint)?,
            restore_time: number("restore_time", restore)?,
            snapshot_size,
        })
    }
}

/// Appending writer for a sample table.
///
/// Rows are flushed per call, so a table only ever holds complete sample sets.
pub struct CsvWriter {
    writer: BufWriter<File>,
}

impl CsvWriter {
    /// Create (or truncate) the table at `path` and write the header.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", CSV_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn write_rows(&mut self, rows: &[SampleRow]) -> Result<(), ReporterError> {
        for row in rows {
            writeln!(self.writer, "{}", row.to_csv_line())?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Read a sample table. A header line, if present, is skipped.
pub fn read_samples(path: impl AsRef<Path>) -> Result<Vec<SampleRow>, ReporterError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || (index == 0 && trimmed.starts_with("program,")) {
            continue;
        }
        let row = SampleRow::parse(trimmed).map_err(|reason| ReporterError::Csv {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// JSON reporter for summaries and comparisons.
pub struct JsonReporter {
    /// Output directory for reports
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Save a report as `<kind>_<timestamp>.json`. Returns the created path.
    pub fn save<T: Serialize>(&self, kind: &str, report: &T) -> Result<PathBuf, ReporterError> {
        let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%SZ");
        let filepath = self.output_dir.join(format!("{}_{}.json", kind, timestamp));
        write_json(&filepath, report)?;
        Ok(filepath)
    }

    /// List all existing reports in the output directory.
    pub fn list_reports(&self) -> Result<Vec<PathBuf>, ReporterError> {
        let mut reports = Vec::new();
        for entry in fs::read_dir(&self.output_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                reports.push(path);
            }
        }
        reports.sort();
        Ok(reports)
    }
}

/// Write any serializable value as pretty JSON.
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), ReporterError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Load a JSON document.
pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ReporterError> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{SummaryRecord, SummaryReport};
    use snapbench_core::{Attempt, Backend, ProgramName};
    use tempfile::TempDir;

    fn rows() -> Vec<SampleRow> {
        vec![
            SampleRow {
                program: "nbody".to_string(),
                checkpoint_time: 3.5,
                restore_time: 4.5,
                snapshot_size: 1091,
            },
            SampleRow {
                program: "nbody".to_string(),
                checkpoint_time: 12.25,
                restore_time: 5.0,
                snapshot_size: 2048,
            },
        ]
    }

    #[test]
    fn test_csv_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("chkpt-restore-criu.csv");

        let mut writer = CsvWriter::create(&path).unwrap();
        writer.write_rows(&rows()).unwrap();
        drop(writer);

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(lines.next(), Some("nbody,3.5,4.5,1091"));

        assert_eq!(read_samples(&path).unwrap(), rows());
    }

    #[test]
    fn test_read_foreign_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wasm.csv");
        fs::write(
            &path,
            "program,checkpoint_time,restore_time,snapshot_size\nbfs,1.5,0.75,4096.0\n\n",
        )
        .unwrap();

        let rows = read_samples(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].snapshot_size, 4096);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.csv");
        fs::write(&path, "program,checkpoint_time,restore_time,snapshot_size\nbfs,1.5\n").unwrap();

        match read_samples(&path) {
            Err(ReporterError::Csv { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_rows_from_sample_set() {
        let mut samples = SampleSet::new(ProgramName::new("tc").unwrap(), Backend::External);
        samples.push(Attempt {
            dwell_ms: 500.0,
            checkpoint_ms: 3.5,
            restore_ms: 4.5,
            snapshot_size_bytes: 100,
        });
        let rows = SampleRow::from_sample_set(&samples);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].program, "tc");
        assert_eq!(rows[0].snapshot_size, 100);
    }

    #[test]
    fn test_reporter_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let reporter = JsonReporter::new(temp_dir.path()).unwrap();

        let report = SummaryReport::new("external", SummaryRecord::group("external", &rows()));
        let path = reporter.save("summary", &report).unwrap();
        assert!(path.exists());
        assert_eq!(reporter.list_reports().unwrap(), vec![path.clone()]);

        let loaded: SummaryReport = load_json(&path).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.records[0].program, "nbody");
    }
}
