//! Truth/test trajectory association.
//!
//! Two interchangeable matchers implement [`Matcher`]: the greedy
//! [`ThresholdMatcher`] and the globally optimal [`OptimalMatcher`]. Both
//! return the same [`AssociationResult`], so the report stage does not
//! care which one ran.

mod optimal;
mod threshold;

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{config::CompareOptions, error::CompareError, trajectory::TrajectorySet};

pub use optimal::OptimalMatcher;
pub use threshold::{ThresholdMatcher, ThresholdParams};

/// Divergence at and above which two trajectories are never paired.
pub const MAX_DIVERGENCE: f64 = 20.0;

/// A paired truth and test trajectory, by id.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub truth: usize,
    pub test: usize,
    /// Divergence that produced the pairing.
    pub divergence: Option<f64>,
}

/// Result of association
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationResult {
    /// Matched pairs sorted by truth id
    pub matches: Vec<Match>,
    /// Ids of truth trajectories without a counterpart, ascending
    pub unmatched_truth: Vec<usize>,
    /// Ids of test trajectories without a counterpart, ascending
    pub unmatched_test: Vec<usize>,
}

impl AssociationResult {
    /// Builds a result from raw pairs, deriving the unmatched ids of both
    /// sides and putting everything in id order.
    pub(crate) fn from_matches(mut matches: Vec<Match>, n_truth: usize, n_test: usize) -> Self {
        matches.sort_by_key(|m| m.truth);
        let mut truth_used = vec![false; n_truth];
        let mut test_used = vec![false; n_test];
        for m in &matches {
            truth_used[m.truth] = true;
            test_used[m.test] = true;
        }
        let unused = |used: Vec<bool>| -> Vec<usize> {
            (0..used.len()).filter(|&id| !used[id]).collect()
        };
        Self {
            matches,
            unmatched_truth: unused(truth_used),
            unmatched_test: unused(test_used),
        }
    }

    /// Sum of the divergences of all matches.
    pub fn total_cost(&self) -> f64 {
        self.matches.iter().filter_map(|m| m.divergence).sum()
    }

    pub fn test_for(&self, truth: usize) -> Option<usize> {
        self.matches
            .iter()
            .find(|m| m.truth == truth)
            .map(|m| m.test)
    }
}

/// An association strategy.
pub trait Matcher {
    /// Pairs trajectories of `truth` with trajectories of `test`. Inputs
    /// are never modified.
    fn associate(
        &self,
        truth: &TrajectorySet,
        test: &TrajectorySet,
    ) -> Result<AssociationResult, CompareError>;
}

/// Selects the matcher used by a comparison run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Incremental threshold relaxation
    Threshold,
    /// Minimum-cost bipartite assignment
    #[default]
    Optimal,
}

impl Strategy {
    /// Builds the matcher, failing on parameters it cannot run with.
    pub fn matcher(&self, options: &CompareOptions) -> Result<Box<dyn Matcher>, CompareError> {
        let max = options.max_divergence;
        Ok(match self {
            Strategy::Threshold => Box::new(ThresholdMatcher::new(options.threshold.clone(), max)?),
            Strategy::Optimal => Box::new(OptimalMatcher::new(max)?),
        })
    }
}

impl FromStr for Strategy {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "threshold" | "greedy" => Ok(Strategy::Threshold),
            "optimal" | "lapjv" => Ok(Strategy::Optimal),
            _ => Err(CompareError::UnknownStrategy(s.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Threshold => write!(f, "threshold"),
            Strategy::Optimal => write!(f, "optimal"),
        }
    }
}
