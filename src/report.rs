//! Point-wise comparison of associated trajectories.
//!
//! For every match the frame-aligned distances are recomputed and pooled
//! into overall statistics. Mismatches are collected as [`Diagnostic`]s
//! whose text form is stable; downstream tools match on it line by line.

use std::fmt;

use serde::Serialize;

use crate::{
    association::AssociationResult,
    config::CompareOptions,
    metric::point_distances,
    trajectory::{align, TrajectorySet},
};

/*----------------------------------------------------------------------------
Statistics
----------------------------------------------------------------------------*/

/// Descriptive statistics of a set of distances. Empty sets have
/// `count == 0` and no mean, median or maximum.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    pub sum: f64,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

impl Statistics {
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let count = samples.len();
        let sum: f64 = samples.iter().sum();

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            count,
            sum,
            mean: Some(sum / count as f64),
            median: Some(median),
            max: sorted.last().copied(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/*----------------------------------------------------------------------------
Diagnostic
----------------------------------------------------------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Truth,
    Test,
}

impl Side {
    pub fn other(&self) -> Side {
        match self {
            Side::Truth => Side::Test,
            Side::Test => Side::Truth,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Truth => write!(f, "truth"),
            Side::Test => write!(f, "test"),
        }
    }
}

/// One finding of a comparison run. Ids are 0-based here and printed
/// 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostic {
    NoCounterpart {
        side: Side,
        id: usize,
    },
    FirstFrameMismatch {
        truth: usize,
        truth_frame: usize,
        test: usize,
        test_frame: usize,
    },
    LastFrameMismatch {
        truth: usize,
        truth_frame: usize,
        test: usize,
        test_frame: usize,
    },
    PointDivergence {
        truth: usize,
        test: usize,
        frame: usize,
        distance: f64,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Diagnostic::NoCounterpart { side, id } => write!(
                f,
                "The person {} in the {} file has no counterpart in {}!",
                id + 1,
                side,
                side.other()
            ),
            Diagnostic::FirstFrameMismatch {
                truth,
                truth_frame,
                test,
                test_frame,
            } => write!(
                f,
                "Different first frame: truth({}) {} and test({}) {}",
                truth + 1,
                truth_frame,
                test + 1,
                test_frame
            ),
            Diagnostic::LastFrameMismatch {
                truth,
                truth_frame,
                test,
                test_frame,
            } => write!(
                f,
                "Different last frame: truth({}) {} and test({}) {}",
                truth + 1,
                truth_frame,
                test + 1,
                test_frame
            ),
            // `{:?}` keeps the decimal point on integral values
            Diagnostic::PointDivergence {
                truth,
                test,
                frame,
                distance,
            } => write!(
                f,
                "Diff of {:?} between test({}) and truth({}) in frame {}",
                distance,
                test + 1,
                truth + 1,
                frame
            ),
        }
    }
}

/*----------------------------------------------------------------------------
Report
----------------------------------------------------------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub association: AssociationResult,
    /// Unmatched ids first, then per-pair findings in truth id order
    pub diagnostics: Vec<Diagnostic>,
    /// Every compared per-frame distance, pair by pair
    pub point_distances: Vec<f64>,
    pub overall: Statistics,
    /// Same as `overall` with exact zeros removed
    pub nonzero: Statistics,
}

impl Report {
    /// Text form: diagnostics followed by the statistics lines.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> =
            self.diagnostics.iter().map(|d| d.to_string()).collect();
        statistics_lines(&mut lines, &self.overall, false);
        statistics_lines(&mut lines, &self.nonzero, true);
        lines
    }
}

fn statistics_lines(lines: &mut Vec<String>, stats: &Statistics, nonzero: bool) {
    let (mean, median, max, count) = if nonzero {
        (
            "The mean difference with 0s filtered out is",
            "The median with 0s filtered out is",
            "The maximum with 0s filtered out is",
            "The number of compared points with 0s filtered out is",
        )
    } else {
        (
            "The mean difference in point coordinates is",
            "The median difference in point coordinates is",
            "The maximum difference in point coordinates is",
            "The number of compared points is",
        )
    };
    if let (Some(mean_v), Some(median_v), Some(max_v)) = (stats.mean, stats.median, stats.max) {
        lines.push(format!("{}: {:?}", mean, mean_v));
        lines.push(format!("{}: {:?}", median, median_v));
        lines.push(format!("{}: {:?}", max, max_v));
    }
    lines.push(format!("{}: {}", count, stats.count));
}

/// Compares every matched pair of `association` point by point.
///
/// `truth` and `test` must be the collections the association was computed
/// on.
pub fn compare(
    truth: &TrajectorySet,
    test: &TrajectorySet,
    association: &AssociationResult,
    options: &CompareOptions,
) -> Report {
    let mut diagnostics = Vec::new();
    let mut distances = Vec::new();

    if options.check_counterpart {
        diagnostics.extend(
            association
                .unmatched_truth
                .iter()
                .map(|&id| Diagnostic::NoCounterpart { side: Side::Truth, id }),
        );
        diagnostics.extend(
            association
                .unmatched_test
                .iter()
                .map(|&id| Diagnostic::NoCounterpart { side: Side::Test, id }),
        );
    }

    let mut matches = association.matches.clone();
    matches.sort_by_key(|m| m.truth);
    for m in &matches {
        let tr = &truth[m.truth];
        let te = &test[m.test];

        if options.check_frames && tr.first_frame() != te.first_frame() {
            diagnostics.push(Diagnostic::FirstFrameMismatch {
                truth: m.truth,
                truth_frame: tr.first_frame(),
                test: m.test,
                test_frame: te.first_frame(),
            });
        }
        if options.check_frames && tr.last_frame() != te.last_frame() {
            diagnostics.push(Diagnostic::LastFrameMismatch {
                truth: m.truth,
                truth_frame: tr.last_frame(),
                test: m.test,
                test_frame: te.last_frame(),
            });
        }

        let Some(aligned) = align(tr, te) else {
            continue;
        };
        let pair_distances = point_distances(aligned.left, aligned.right);
        if options.warn_pointwise {
            for (offset, &distance) in pair_distances.iter().enumerate() {
                if distance > options.epsilon {
                    diagnostics.push(Diagnostic::PointDivergence {
                        truth: m.truth,
                        test: m.test,
                        frame: aligned.first_frame + offset,
                        distance,
                    });
                }
            }
        }
        distances.extend(pair_distances);
    }

    let overall = Statistics::from_samples(&distances);
    let nonzero: Vec<f64> = distances.iter().copied().filter(|&d| d != 0.0).collect();
    let nonzero = Statistics::from_samples(&nonzero);

    Report {
        association: association.clone(),
        diagnostics,
        point_distances: distances,
        overall,
        nonzero,
    }
}
