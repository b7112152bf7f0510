// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Percentiles and interquartile-range outlier filtering.
//!
//! Checkpoint and restore times of one sample are filtered together, keyed
//! on their sum, so the two series always stay paired.

use serde::{Deserialize, Serialize};

/// Sample sets at or below this size are never filtered.
pub const MIN_SAMPLES_FOR_FILTERING: usize = 3;

/// Tukey fence multiplier.
const IQR_FENCE: f64 = 1.5;

/// Percentile with linear interpolation between closest ranks.
///
/// `p` is in `0.0..=100.0`. Returns `None` for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Median with linear interpolation.
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Arithmetic mean. Returns `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Quartiles and Tukey fences of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IqrBounds {
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower: f64,
    pub upper: f64,
}

impl IqrBounds {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let q1 = percentile(values, 25.0)?;
        let q3 = percentile(values, 75.0)?;
        let iqr = q3 - q1;
        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1 - IQR_FENCE * iqr,
            upper: q3 + IQR_FENCE * iqr,
        })
    }

    /// Inclusive on both fences.
    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Which samples survive outlier filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierFilter {
    /// Indices of retained samples, in original order.
    pub kept: Vec<usize>,
    /// Number of samples the filter looked at.
    pub total: usize,
    /// Fences used, if filtering was applied.
    pub bounds: Option<IqrBounds>,
}

impl OutlierFilter {
    /// Filter paired samples on `checkpoint[i] + restore[i]`.
    ///
    /// Series of unequal length are kept as-is, as are sets of
    /// [`MIN_SAMPLES_FOR_FILTERING`] samples or fewer.
    pub fn by_total(checkpoint: &[f64], restore: &[f64]) -> Self {
        let total = checkpoint.len();
        let keep_all = || Self {
            kept: (0..total).collect(),
            total,
            bounds: None,
        };

        if checkpoint.len() != restore.len() || total <= MIN_SAMPLES_FOR_FILTERING {
            return keep_all();
        }

        let totals: Vec<f64> = checkpoint
            .iter()
            .zip(restore)
            .map(|(c, r)| c + r)
            .collect();

        let Some(bounds) = IqrBounds::from_values(&totals) else {
            return keep_all();
        };

        let kept = totals
            .iter()
            .enumerate()
            .filter(|(_, value)| bounds.contains(**value))
            .map(|(index, _)| index)
            .collect();

        Self {
            kept,
            total,
            bounds: Some(bounds),
        }
    }

    /// Pick the retained entries out of a series aligned with the input.
    pub fn apply<T: Copy>(&self, values: &[T]) -> Vec<T> {
        self.kept
            .iter()
            .filter_map(|&index| values.get(index).copied())
            .collect()
    }

    pub fn removed(&self) -> usize {
        self.total - self.kept.len()
    }
}
