pub mod association;
pub mod config;
pub mod error;
pub mod metric;
pub mod point;
pub mod proximity;
pub mod report;
pub mod trajectory;
pub mod trc;

mod lapjv;

use std::path::Path;

use tracing::info;

pub use association::{
    AssociationResult, Match, Matcher, OptimalMatcher, Strategy, ThresholdMatcher,
    ThresholdParams, MAX_DIVERGENCE,
};
pub use config::CompareOptions;
pub use error::CompareError;
pub use point::{Rgb, TrackPoint};
pub use proximity::{proximal_candidates, ProximalCandidates};
pub use report::{compare, Diagnostic, Report, Side, Statistics};
pub use trajectory::{align, Alignment, Trajectory, TrajectoryMeta, TrajectorySet};
pub use trc::{parse_trc, parse_trc_str};

/// Loads both files and associates their trajectories with the strategy
/// selected in `options`.
pub fn run_association(
    truth_path: impl AsRef<Path>,
    test_path: impl AsRef<Path>,
    options: &CompareOptions,
) -> Result<AssociationResult, CompareError> {
    let truth = parse_trc(truth_path)?;
    let test = parse_trc(test_path)?;
    associate(&truth, &test, options)
}

/// Loads, associates and compares; returns the full report.
pub fn run_report(
    truth_path: impl AsRef<Path>,
    test_path: impl AsRef<Path>,
    options: &CompareOptions,
) -> Result<(TrajectorySet, TrajectorySet, Report), CompareError> {
    let truth = parse_trc(truth_path)?;
    let test = parse_trc(test_path)?;
    let association = associate(&truth, &test, options)?;
    let report = compare(&truth, &test, &association, options);
    info!(
        diagnostics = report.diagnostics.len(),
        compared = report.overall.count,
        "comparison finished"
    );
    Ok((truth, test, report))
}

/// Compares the test file against the truth file and returns the report
/// lines: diagnostics enabled in `options`, then statistics.
pub fn run(
    truth_path: impl AsRef<Path>,
    test_path: impl AsRef<Path>,
    options: &CompareOptions,
) -> Result<Vec<String>, CompareError> {
    let (_, _, report) = run_report(truth_path, test_path, options)?;
    Ok(report.lines())
}

fn associate(
    truth: &TrajectorySet,
    test: &TrajectorySet,
    options: &CompareOptions,
) -> Result<AssociationResult, CompareError> {
    info!(
        strategy = %options.strategy,
        truth = truth.len(),
        test = test.len(),
        "associating trajectories"
    );
    options.validate()?;
    let result = options.strategy.matcher(options)?.associate(truth, test)?;
    info!(
        matched = result.matches.len(),
        unmatched_truth = result.unmatched_truth.len(),
        unmatched_test = result.unmatched_test.len(),
        "association finished"
    );
    Ok(result)
}
