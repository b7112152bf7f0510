// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Decoded CRIU statistics.
//!
//! `crit decode` renders the `stats-dump` / `stats-restore` images as JSON.
//! Timing fields are microseconds; 64-bit counters come out as strings.

use serde::{Deserialize, Deserializer};

/// Stats image written by `criu dump`.
pub const DUMP_STATS_FILE: &str = "stats-dump";
/// Stats image written by `criu restore`.
pub const RESTORE_STATS_FILE: &str = "stats-restore";

#[derive(Debug, Deserialize)]
struct StatsDocument<T> {
    entries: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct DumpEntry {
    dump: DumpStats,
}

#[derive(Debug, Deserialize)]
struct RestoreEntry {
    restore: RestoreStats,
}

/// Dump-phase timings, microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DumpStats {
    #[serde(deserialize_with = "de_counter")]
    pub freezing_time: u64,
    #[serde(deserialize_with = "de_counter")]
    pub memdump_time: u64,
    #[serde(deserialize_with = "de_counter")]
    pub memwrite_time: u64,
}

impl DumpStats {
    /// Parse the JSON output of `crit decode -i stats-dump`.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let document: StatsDocument<DumpEntry> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;
        document
            .entries
            .into_iter()
            .next()
            .map(|entry| entry.dump)
            .ok_or_else(|| "no entries in dump stats".to_string())
    }

    /// Freeze + memory dump + memory write, in milliseconds.
    pub fn checkpoint_ms(&self) -> f64 {
        // Summed as f64; the counters come from crit and may be arbitrarily large.
        (self.freezing_time as f64 + self.memdump_time as f64 + self.memwrite_time as f64)
            / 1_000.0
    }
}

/// Restore-phase timings, microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RestoreStats {
    #[serde(deserialize_with = "de_counter")]
    pub restore_time: u64,
}

impl RestoreStats {
    /// Parse the JSON output of `crit decode -i stats-restore`.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let document: StatsDocument<RestoreEntry> =
            serde_json::from_str(json).map_err(|e| e.to_string())?;
        document
            .entries
            .into_iter()
            .next()
            .map(|entry| entry.restore)
            .ok_or_else(|| "no entries in restore stats".to_string())
    }

    pub fn restore_ms(&self) -> f64 {
        self.restore_time as f64 / 1_000.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Counter {
    Number(u64),
    Text(String),
}

fn de_counter<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Counter::deserialize(deserializer)? {
        Counter::Number(value) => Ok(value),
        Counter::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_stats_string_counters() {
        let json = r#"{"entries":[{"dump":{"freezing_time":"1000","memdump_time":"2000","memwrite_time":"500"}}]}"#;
        let stats = DumpStats::from_json(json).unwrap();
        assert_eq!(stats.freezing_time, 1000);
        assert!((stats.checkpoint_ms() - 3.5).abs() < 1e-9);
    }

    #[test]
    fn test_dump_stats_numeric_counters_and_extra_fields() {
        let json = r#"{
            "magic": "STATS",
            "entries": [{"dump": {
                "freezing_time": 120, "frozen_time": 9000, "memdump_time": 3000,
                "memwrite_time": 880, "pages_scanned": "4096", "pages_written": "100"
            }}]
        }"#;
        let stats = DumpStats::from_json(json).unwrap();
        assert!((stats.checkpoint_ms() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_dump_stats_counters_at_u64_max() {
        let json = r#"{"entries":[{"dump":{"freezing_time":"18446744073709551615","memdump_time":"1","memwrite_time":"0"}}]}"#;
        let stats = DumpStats::from_json(json).unwrap();
        let ms = stats.checkpoint_ms();
        assert!(ms.is_finite());
        assert!((ms - u64::MAX as f64 / 1_000.0).abs() < 1.0);
    }

    #[test]
    fn test_dump_stats_missing_field() {
        let json = r#"{"entries":[{"dump":{"freezing_time":"1000"}}]}"#;
        assert!(DumpStats::from_json(json).is_err());
    }

    #[test]
    fn test_dump_stats_empty_entries() {
        assert!(DumpStats::from_json(r#"{"entries":[]}"#).is_err());
    }

    #[test]
    fn test_restore_stats() {
        let json = r#"{"entries":[{"restore":{"pages_compared":"0","forking_time":"12","restore_time":"4500"}}]}"#;
        let stats = RestoreStats::from_json(json).unwrap();
        assert!((stats.restore_ms() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_bad_counter_text() {
        let json = r#"{"entries":[{"restore":{"restore_time":"soon"}}]}"#;
        assert!(RestoreStats::from_json(json).is_err());
    }
}
