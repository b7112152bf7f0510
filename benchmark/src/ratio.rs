// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Ratio normalization against a baseline run.

use serde::{Deserialize, Serialize};

use crate::baseline::{BaselineFeed, BASELINE_RUNTIME};
use crate::stats;

/// Which statistic of the baseline series a ratio is taken against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representative {
    #[default]
    Mean,
    Median,
}

impl Representative {
    pub fn of(&self, values: &[f64]) -> Option<f64> {
        match self {
            Self::Mean => stats::mean(values),
            Self::Median => stats::median(values),
        }
    }
}

/// Express every sample as a multiple of `reference`.
pub fn ratio_series(samples: &[f64], reference: f64) -> Vec<f64> {
    samples.iter().map(|sample| sample / reference).collect()
}

/// Fill in `ratios` for every entry of the feed.
///
/// Each program's reference is its `baseline` entry, or its first entry when
/// it has none. Entries whose reference is zero or missing get no ratios.
pub fn normalize(feed: &mut BaselineFeed, representative: Representative) {
    let references: Vec<(String, Option<f64>)> = feed
        .programs()
        .into_iter()
        .map(|program| {
            let reference = feed
                .entry(program, BASELINE_RUNTIME)
                .or_else(|| feed.results.iter().find(|entry| entry.name == program))
                .and_then(|entry| representative.of(&entry.times));
            (program.to_string(), reference)
        })
        .collect();

    for entry in &mut feed.results {
        let reference = references
            .iter()
            .find(|(program, _)| *program == entry.name)
            .and_then(|(_, reference)| *reference)
            .filter(|reference| *reference > 0.0);

        entry.ratios = reference.map(|reference| ratio_series(&entry.times, reference));
    }
}

/// Summary of ratios for one runtime across programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatioAnalysis {
    pub runtime: String,
    /// Median ratio per program, in feed order.
    pub medians: Vec<(String, f64)>,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
}

/// Median ratio of every program measured under `runtime`, and the
/// mean/max/min of those medians.
///
/// The median here is the upper middle element, not interpolated.
pub fn analyze_ratios(feed: &BaselineFeed, runtime: &str) -> Option<RatioAnalysis> {
    let medians: Vec<(String, f64)> = feed
        .results
        .iter()
        .filter(|entry| entry.runtime == runtime)
        .filter_map(|entry| {
            let mut ratios = entry.ratios.clone()?;
            if ratios.is_empty() {
                return None;
            }
            ratios.sort_by(|a, b| a.total_cmp(b));
            Some((entry.name.clone(), ratios[ratios.len() / 2]))
        })
        .collect();

    if medians.is_empty() {
        return None;
    }

    let values: Vec<f64> = medians.iter().map(|(_, median)| *median).collect();
    Some(RatioAnalysis {
        runtime: runtime.to_string(),
        mean: stats::mean(&values)?,
        max: values.iter().copied().fold(f64::MIN, f64::max),
        min: values.iter().copied().fold(f64::MAX, f64::min),
        medians,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::BaselineEntry;

    fn feed() -> BaselineFeed {
        BaselineFeed::new(vec![
            BaselineEntry::from_times("P", "baseline", "./p", vec![1.0, 2.0, 3.0]),
            BaselineEntry::from_times("P", "in-process", "./p.cr", vec![2.0, 4.0, 6.0]),
            BaselineEntry::from_times("Q", "baseline", "./q", vec![10.0, 10.0]),
            BaselineEntry::from_times("Q", "in-process", "./q.cr", vec![15.0, 11.0]),
        ])
    }

    #[test]
    fn test_baseline_ratios_center_on_one() {
        for representative in [Representative::Mean, Representative::Median] {
            let mut feed = feed();
            normalize(&mut feed, representative);
            let ratios = feed.results[0].ratios.as_ref().unwrap();
            assert!((stats::mean(ratios).unwrap() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_ratios_against_baseline_mean() {
        let mut feed = feed();
        normalize(&mut feed, Representative::Mean);
        assert_eq!(feed.results[1].ratios.as_deref(), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(feed.results[3].ratios.as_deref(), Some(&[1.5, 1.1][..]));
    }

    #[test]
    fn test_first_entry_is_reference_without_baseline() {
        let mut feed = BaselineFeed::new(vec![
            BaselineEntry::from_times("R", "external", "./r", vec![4.0]),
            BaselineEntry::from_times("R", "in-process", "./r.cr", vec![6.0]),
        ]);
        normalize(&mut feed, Representative::Mean);
        assert_eq!(feed.results[1].ratios.as_deref(), Some(&[1.5][..]));
    }

    #[test]
    fn test_analyze_ratios() {
        let mut feed = feed();
        normalize(&mut feed, Representative::Mean);
        let analysis = analyze_ratios(&feed, "in-process").unwrap();

        assert_eq!(analysis.medians.len(), 2);
        assert_eq!(analysis.medians[0], ("P".to_string(), 2.0));
        assert!((analysis.medians[1].1 - 1.5).abs() < 1e-9);
        assert!((analysis.mean - 1.75).abs() < 1e-9);
        assert!((analysis.max - 2.0).abs() < 1e-9);
        assert!((analysis.min - 1.5).abs() < 1e-9);

        assert!(analyze_ratios(&feed, "wamr").is_none());
    }
}
