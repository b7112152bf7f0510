// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `snapbench analyze` command - Median slowdown ratios per runtime.

use std::path::Path;

use anyhow::Context;
use snapbench_benchmark::{analyze_ratios, BaselineFeed, BASELINE_RUNTIME};

pub fn execute(feed_path: &Path, runtimes: &[String]) -> anyhow::Result<()> {
    let feed = BaselineFeed::load(feed_path)
        .with_context(|| format!("loading baseline feed {}", feed_path.display()))?;

    let runtimes = if runtimes.is_empty() {
        measured_runtimes(&feed)
    } else {
        runtimes.to_vec()
    };

    for runtime in &runtimes {
        let Some(analysis) = analyze_ratios(&feed, runtime) else {
            println!("{}: no ratios", runtime);
            println!();
            continue;
        };

        println!("{}", analysis.runtime);
        for (program, median) in &analysis.medians {
            println!("  {:<20} {:.3}", program, median);
        }
        println!(
            "  mean {:.3}  max {:.3}  min {:.3}",
            analysis.mean, analysis.max, analysis.min
        );
        println!();
    }
    Ok(())
}

/// Runtime labels other than the baseline, in feed order.
fn measured_runtimes(feed: &BaselineFeed) -> Vec<String> {
    let mut runtimes: Vec<String> = Vec::new();
    for entry in &feed.results {
        if entry.runtime != BASELINE_RUNTIME && !runtimes.contains(&entry.runtime) {
            runtimes.push(entry.runtime.clone());
        }
    }
    runtimes
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapbench_benchmark::BaselineEntry;

    #[test]
    fn test_measured_runtimes() {
        let feed = BaselineFeed::new(vec![
            BaselineEntry::from_times("a", "baseline", "./a", vec![1.0]),
            BaselineEntry::from_times("a", "in-process", "./a.cr", vec![1.0]),
            BaselineEntry::from_times("b", "external", "./b", vec![1.0]),
            BaselineEntry::from_times("b", "in-process", "./b.cr", vec![1.0]),
        ]);
        assert_eq!(measured_runtimes(&feed), ["in-process", "external"]);
    }

    #[test]
    fn test_missing_feed_is_an_error() {
        assert!(execute(Path::new("/nonexistent/overhead.json"), &[]).is_err());
    }
}
