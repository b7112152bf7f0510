// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Raw backend output to canonical metrics (milliseconds, bytes).

use std::io;
use std::path::Path;

use crate::error::AttemptError;
use crate::types::TimeUnit;

/// Total size of the regular files below `dir`.
///
/// Symbolic links are skipped, so a linked file is never counted twice.
pub fn dir_size(dir: &Path) -> io::Result<u64> {
    let mut total = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = std::fs::symlink_metadata(entry.path())?;
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            continue;
        }
        if file_type.is_dir() {
            total += dir_size(&entry.path())?;
        } else {
            total += metadata.len();
        }
    }
    Ok(total)
}

/// Parse the single number a target writes into a timing marker.
pub fn parse_marker_value(text: &str, unit: TimeUnit) -> Result<f64, String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err("empty marker".to_string());
    }
    let value: f64 = trimmed
        .parse()
        .map_err(|_| format!("not a number: {:?}", trimmed))?;
    if !value.is_finite() || value < 0.0 {
        return Err(format!("invalid duration: {}", value));
    }
    Ok(unit.to_millis(value))
}

/// Read a timing marker file and convert it to milliseconds.
pub fn read_marker_ms(path: &Path, unit: TimeUnit) -> Result<f64, AttemptError> {
    let text = std::fs::read_to_string(path).map_err(|e| AttemptError::MarkerMalformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_marker_value(&text, unit).map_err(|reason| AttemptError::MarkerMalformed {
        path: path.to_path_buf(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dir_size_skips_symlinks() {
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("elsewhere.img");
        std::fs::write(&target, vec![0u8; 100]).unwrap();

        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("pages-1.img"), vec![0u8; 100]).unwrap();
        std::os::unix::fs::symlink(&target, dir.path().join("link.img")).unwrap();

        assert_eq!(dir_size(dir.path()).unwrap(), 100);
    }

    #[test]
    fn test_dir_size_recurses() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.img"), vec![0u8; 10]).unwrap();
        std::fs::write(dir.path().join("sub").join("b.img"), vec![0u8; 32]).unwrap();
        assert_eq!(dir_size(dir.path()).unwrap(), 42);
    }

    #[test]
    fn test_dir_size_empty() {
        let dir = TempDir::new().unwrap();
        assert_eq!(dir_size(dir.path()).unwrap(), 0);
    }

    #[test]
    fn test_parse_marker_value() {
        assert!((parse_marker_value("12.5\n", TimeUnit::Milliseconds).unwrap() - 12.5).abs() < 1e-9);
        assert!((parse_marker_value(" 1500 ", TimeUnit::Microseconds).unwrap() - 1.5).abs() < 1e-9);
        assert!(parse_marker_value("", TimeUnit::Milliseconds).is_err());
        assert!(parse_marker_value("fast", TimeUnit::Milliseconds).is_err());
        assert!(parse_marker_value("-3", TimeUnit::Milliseconds).is_err());
    }

    #[test]
    fn test_read_marker_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_marker_ms(&dir.path().join("chkpt-time.txt"), TimeUnit::Milliseconds)
            .unwrap_err();
        assert!(matches!(err, AttemptError::MarkerMalformed { .. }));
    }
}
