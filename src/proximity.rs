use serde::Serialize;

use crate::{
    error::CompareError,
    metric::trajectory_divergence,
    trajectory::{Trajectory, TrajectorySet},
};

/// Trajectories close to a seed trajectory, by id, in both collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProximalCandidates {
    pub truth: Vec<usize>,
    pub test: Vec<usize>,
}

impl ProximalCandidates {
    pub fn is_empty(&self) -> bool {
        self.truth.is_empty() && self.test.is_empty()
    }
}

/// Finds every trajectory of `truth` and `test` that shares a frame with
/// `seed` and diverges from it by less than `max_divergence`.
///
/// The seed's own collection is searched as well, so a seed taken from one
/// of the sets finds itself. Nearby trajectories in the same set usually
/// mean a person was tracked twice.
pub fn proximal_candidates(
    seed: &Trajectory,
    truth: &TrajectorySet,
    test: &TrajectorySet,
    max_divergence: f64,
) -> Result<ProximalCandidates, CompareError> {
    Ok(ProximalCandidates {
        truth: near(seed, truth, max_divergence)?,
        test: near(seed, test, max_divergence)?,
    })
}

fn near(seed: &Trajectory, set: &TrajectorySet, max: f64) -> Result<Vec<usize>, CompareError> {
    let mut ids = Vec::new();
    for candidate in set {
        if let Some(d) = trajectory_divergence(seed, candidate)? {
            if d < max {
                ids.push(candidate.id());
            }
        }
    }
    Ok(ids)
}
