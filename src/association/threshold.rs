use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AssociationResult, Match, Matcher, MAX_DIVERGENCE};
use crate::{
    error::{require_finite, require_positive, CompareError},
    metric::trajectory_divergence,
    trajectory::TrajectorySet,
};

/// Parameters for incremental threshold relaxation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Acceptance threshold of the first pass, in pixels
    pub start: f64,
    /// Threshold increase after a pass without progress
    pub step: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            start: 0.01,
            step: 0.01,
        }
    }
}

impl ThresholdParams {
    /// A non-positive step would never raise the threshold.
    pub fn validate(&self) -> Result<(), CompareError> {
        require_finite("threshold.start", self.start)?;
        require_positive("threshold.step", self.step)
    }
}

/*-----------------------------------------------------------------------------
ThresholdMatcher
-----------------------------------------------------------------------------*/

/// Greedy matcher that relaxes an acceptance threshold until every truth
/// trajectory is paired or proven unmatchable.
///
/// Truth trajectories are visited in FIFO order starting from id order. A
/// truth trajectory takes the *first* remaining test trajectory whose
/// divergence is below the current threshold, which is not necessarily its
/// best one. The result therefore depends on `step` and on the queue order.
#[derive(Debug, Clone)]
pub struct ThresholdMatcher {
    params: ThresholdParams,
    max_divergence: f64,
}

impl Default for ThresholdMatcher {
    fn default() -> Self {
        Self {
            params: ThresholdParams::default(),
            max_divergence: MAX_DIVERGENCE,
        }
    }
}

impl ThresholdMatcher {
    /// `max_divergence` is the exclusive upper bound on the divergence of
    /// any match.
    pub fn new(params: ThresholdParams, max_divergence: f64) -> Result<Self, CompareError> {
        params.validate()?;
        require_positive("max_divergence", max_divergence)?;
        Ok(Self {
            params,
            max_divergence,
        })
    }

    pub fn params(&self) -> &ThresholdParams {
        &self.params
    }

    pub fn max_divergence(&self) -> f64 {
        self.max_divergence
    }
}

/// Best candidate seen on the last full scan for one truth trajectory.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    test: usize,
    divergence: f64,
}

impl Matcher for ThresholdMatcher {
    fn associate(
        &self,
        truth: &TrajectorySet,
        test: &TrajectorySet,
    ) -> Result<AssociationResult, CompareError> {
        let max = self.max_divergence;
        let mut queue: VecDeque<usize> = (0..truth.len()).collect();
        let mut remaining = vec![true; test.len()];
        let mut n_remaining = test.len();
        let mut memo: Vec<Option<Candidate>> = vec![None; truth.len()];
        let mut matches = Vec::new();

        let mut threshold = self.params.start;
        let mut pass_len = queue.len();
        let mut visited = 0;
        let mut progressed = false;

        while n_remaining > 0 {
            if visited == pass_len {
                if !progressed {
                    threshold += self.params.step;
                }
                pass_len = queue.len();
                visited = 0;
                progressed = false;
            }
            let Some(truth_id) = queue.pop_front() else {
                break;
            };
            visited += 1;

            // The memo is the minimum over a superset of the current pool,
            // so while its test trajectory is still free no rescan can do
            // better.
            if let Some(cached) = memo[truth_id] {
                if remaining[cached.test] {
                    if cached.divergence < threshold {
                        debug!(
                            truth = truth_id,
                            test = cached.test,
                            divergence = cached.divergence,
                            threshold,
                            "matched from memo"
                        );
                        remaining[cached.test] = false;
                        n_remaining -= 1;
                        matches.push(Match {
                            truth: truth_id,
                            test: cached.test,
                            divergence: Some(cached.divergence),
                        });
                        progressed = true;
                    } else {
                        queue.push_back(truth_id);
                    }
                    continue;
                }
            }

            let mut best: Option<Candidate> = None;
            let mut accepted: Option<Candidate> = None;
            for test_id in (0..test.len()).filter(|&j| remaining[j]) {
                let Some(divergence) =
                    trajectory_divergence(&truth[truth_id], &test[test_id])?
                else {
                    continue;
                };
                if divergence < threshold && divergence < max {
                    accepted = Some(Candidate { test: test_id, divergence });
                    break;
                }
                if divergence < best.map_or(max, |b| b.divergence) {
                    best = Some(Candidate { test: test_id, divergence });
                }
            }

            if let Some(found) = accepted {
                debug!(
                    truth = truth_id,
                    test = found.test,
                    divergence = found.divergence,
                    threshold,
                    "matched"
                );
                remaining[found.test] = false;
                n_remaining -= 1;
                matches.push(Match {
                    truth: truth_id,
                    test: found.test,
                    divergence: Some(found.divergence),
                });
                progressed = true;
            } else if best.is_some() {
                memo[truth_id] = best;
                queue.push_back(truth_id);
            } else {
                warn!(
                    truth = truth_id,
                    max_divergence = max,
                    "no test trajectory below maximum divergence"
                );
                progressed = true;
            }
        }

        debug!(
            matched = matches.len(),
            threshold, "threshold association finished"
        );
        Ok(AssociationResult::from_matches(matches, truth.len(), test.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::TrackPoint;
    use crate::trajectory::{tests::line, Trajectory};
    use nearly_eq::assert_nearly_eq;

    fn constant(first: usize, len: usize, x: f64, y: f64) -> Trajectory {
        Trajectory::starting_at(first, vec![TrackPoint::new(x, y); len]).unwrap()
    }

    #[test]
    fn test_default_params() {
        let params = ThresholdParams::default();
        assert_eq!(params.start, 0.01);
        assert_eq!(params.step, 0.01);
        let matcher = ThresholdMatcher::default();
        assert_eq!(matcher.params(), &params);
        assert_eq!(matcher.max_divergence(), 20.0);
    }

    #[test]
    fn test_rejects_parameters_that_never_terminate() {
        for step in [0.0, -0.01, f64::NAN, f64::INFINITY] {
            let params = ThresholdParams {
                step,
                ..ThresholdParams::default()
            };
            assert!(
                matches!(
                    ThresholdMatcher::new(params, MAX_DIVERGENCE),
                    Err(CompareError::InvalidOption { name: "threshold.step", .. })
                ),
                "step {} accepted",
                step
            );
        }
        let params = ThresholdParams {
            start: f64::NAN,
            ..ThresholdParams::default()
        };
        assert!(ThresholdMatcher::new(params, MAX_DIVERGENCE).is_err());
        assert!(ThresholdMatcher::new(ThresholdParams::default(), 0.0).is_err());
        assert!(ThresholdMatcher::new(ThresholdParams::default(), f64::NAN).is_err());
        assert!(ThresholdMatcher::new(ThresholdParams::default(), 5.0).is_ok());
    }

    #[test]
    fn test_custom_maximum_applies() {
        let truth: TrajectorySet = vec![constant(0, 5, 0.0, 0.0)].into_iter().collect();
        let test: TrajectorySet = vec![constant(0, 5, 3.0, 0.0)].into_iter().collect();
        let params = ThresholdParams {
            step: 0.5,
            ..ThresholdParams::default()
        };
        let strict = ThresholdMatcher::new(params.clone(), 3.0).unwrap();
        assert!(strict.associate(&truth, &test).unwrap().matches.is_empty());
        let loose = ThresholdMatcher::new(params, 3.5).unwrap();
        assert_eq!(loose.associate(&truth, &test).unwrap().matches.len(), 1);
    }

    #[test]
    fn test_divergence_at_maximum_is_unmatched() {
        let truth: TrajectorySet = vec![constant(0, 5, 0.0, 0.0)].into_iter().collect();
        let test: TrajectorySet = vec![constant(0, 5, 20.0, 0.0)].into_iter().collect();
        let result = ThresholdMatcher::default().associate(&truth, &test).unwrap();
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_truth, vec![0]);
        assert_eq!(result.unmatched_test, vec![0]);
    }

    #[test]
    fn test_divergence_below_maximum_is_matched() {
        let truth: TrajectorySet = vec![constant(0, 5, 0.0, 0.0)].into_iter().collect();
        let test: TrajectorySet = vec![constant(0, 5, 0.5, 0.0)].into_iter().collect();
        let params = ThresholdParams {
            step: 0.1,
            ..ThresholdParams::default()
        };
        let result = ThresholdMatcher::new(params, MAX_DIVERGENCE)
            .unwrap()
            .associate(&truth, &test)
            .unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_nearly_eq!(result.matches[0].divergence.unwrap(), 0.5, 1e-12);
    }

    #[test]
    fn test_takes_first_candidate_below_threshold() {
        // both test trajectories clear the first threshold; the earlier one
        // wins even though the later one is closer
        let truth: TrajectorySet = vec![constant(0, 5, 0.0, 0.0)].into_iter().collect();
        let test: TrajectorySet = vec![
            constant(0, 5, 0.9, 0.0),
            constant(0, 5, 0.1, 0.0),
        ]
        .into_iter()
        .collect();
        let params = ThresholdParams {
            start: 1.0,
            ..ThresholdParams::default()
        };
        let result = ThresholdMatcher::new(params, MAX_DIVERGENCE)
            .unwrap()
            .associate(&truth, &test)
            .unwrap();
        assert_eq!(result.matches[0].test, 0);
        assert_eq!(result.unmatched_test, vec![1]);
    }

    #[test]
    fn test_small_steps_let_closer_truth_win() {
        // truth 1 is closer to the only test trajectory and reaches it at a
        // lower threshold than truth 0
        let truth: TrajectorySet = vec![
            constant(0, 5, 0.0, 0.0),
            constant(0, 5, 3.0, 0.0),
        ]
        .into_iter()
        .collect();
        let test: TrajectorySet = vec![constant(0, 5, 2.5, 0.0)].into_iter().collect();
        let result = ThresholdMatcher::default().associate(&truth, &test).unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!((result.matches[0].truth, result.matches[0].test), (1, 0));
        assert_eq!(result.unmatched_truth, vec![0]);
    }

    #[test]
    fn test_rescans_when_memo_is_taken() {
        // truth 1 remembers test 0, which truth 0 takes first; truth 1 must
        // then fall back to test 1
        let truth: TrajectorySet = vec![
            constant(0, 5, 0.0, 0.0),
            constant(0, 5, 1.0, 0.0),
        ]
        .into_iter()
        .collect();
        let test: TrajectorySet = vec![
            constant(0, 5, 0.5, 0.0),
            constant(0, 5, 2.0, 0.0),
        ]
        .into_iter()
        .collect();
        let params = ThresholdParams {
            step: 0.1,
            ..ThresholdParams::default()
        };
        let result = ThresholdMatcher::new(params, MAX_DIVERGENCE)
            .unwrap()
            .associate(&truth, &test)
            .unwrap();
        let pairs: Vec<_> = result.matches.iter().map(|m| (m.truth, m.test)).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_skips_non_overlapping_candidates() {
        let truth: TrajectorySet = vec![line(0, 10, (0.0, 0.0), (1.0, 0.0))]
            .into_iter()
            .collect();
        let test: TrajectorySet = vec![
            line(10, 10, (0.0, 0.0), (1.0, 0.0)),
            line(5, 10, (5.0, 0.0), (1.0, 0.0)),
        ]
        .into_iter()
        .collect();
        let result = ThresholdMatcher::default().associate(&truth, &test).unwrap();
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].test, 1);
        assert_eq!(result.matches[0].divergence, Some(0.0));
    }
}
