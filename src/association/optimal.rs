use nalgebra::DMatrix;
use tracing::debug;

use super::{AssociationResult, Match, Matcher, MAX_DIVERGENCE};
use crate::{
    error::{require_positive, CompareError},
    lapjv::lapjv,
    metric::trajectory_divergence,
    trajectory::TrajectorySet,
};

/// Cost of an inadmissible pair: temporally disjoint, or at or above the
/// maximum divergence. Dominates any admissible cost, so the solver only
/// uses it where the matrix shape forces a pairing.
pub(crate) const NO_OVERLAP_COST: f64 = 1e6;

/*-----------------------------------------------------------------------------
OptimalMatcher
-----------------------------------------------------------------------------*/

/// Minimum total divergence one-to-one assignment over the pairs that
/// overlap and diverge by less than the maximum, solved with LAPJV.
///
/// Deterministic and independent of input order up to ties in cost.
#[derive(Debug, Clone)]
pub struct OptimalMatcher {
    max_divergence: f64,
}

impl Default for OptimalMatcher {
    fn default() -> Self {
        Self {
            max_divergence: MAX_DIVERGENCE,
        }
    }
}

impl OptimalMatcher {
    pub fn new(max_divergence: f64) -> Result<Self, CompareError> {
        require_positive("max_divergence", max_divergence)?;
        Ok(Self { max_divergence })
    }

    pub fn max_divergence(&self) -> f64 {
        self.max_divergence
    }

    /// `truth.len() x test.len()` divergence matrix with
    /// [`NO_OVERLAP_COST`] for inadmissible pairs.
    pub fn cost_matrix(
        &self,
        truth: &TrajectorySet,
        test: &TrajectorySet,
    ) -> Result<DMatrix<f64>, CompareError> {
        let mut cost = DMatrix::from_element(truth.len(), test.len(), NO_OVERLAP_COST);
        for (i, a) in truth.iter().enumerate() {
            for (j, b) in test.iter().enumerate() {
                if let Some(d) = trajectory_divergence(a, b)? {
                    if d < self.max_divergence {
                        cost[(i, j)] = d.min(NO_OVERLAP_COST);
                    }
                }
            }
        }
        Ok(cost)
    }
}

/// Solves the rectangular assignment on `cost` by padding it to a square
/// matrix with zero-cost dummy rows or columns.
///
/// Returns `(row, column)` pairs covering the smaller dimension.
pub(crate) fn rectangular_assignment(
    cost: &DMatrix<f64>,
) -> Result<Vec<(usize, usize)>, CompareError> {
    let nrows = cost.nrows();
    let ncols = cost.ncols();
    if nrows == 0 || ncols == 0 {
        return Ok(Vec::new());
    }

    let n = nrows.max(ncols);
    let mut square = DMatrix::zeros(n, n);
    square.view_mut((0, 0), (nrows, ncols)).copy_from(cost);

    let x = lapjv(&square)?;
    Ok(x
        .into_iter()
        .enumerate()
        .filter(|&(i, j)| i < nrows && j < ncols)
        .collect())
}

impl Matcher for OptimalMatcher {
    fn associate(
        &self,
        truth: &TrajectorySet,
        test: &TrajectorySet,
    ) -> Result<AssociationResult, CompareError> {
        let cost = self.cost_matrix(truth, test)?;
        let matches: Vec<Match> = rectangular_assignment(&cost)?
            .into_iter()
            .filter(|&(i, j)| cost[(i, j)] < NO_OVERLAP_COST)
            .map(|(i, j)| Match {
                truth: i,
                test: j,
                divergence: Some(cost[(i, j)]),
            })
            .collect();
        debug!(
            truth = truth.len(),
            test = test.len(),
            matched = matches.len(),
            "optimal association finished"
        );
        Ok(AssociationResult::from_matches(matches, truth.len(), test.len()))
    }
}
