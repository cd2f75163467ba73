//! Pairwise divergence between frame-aligned point sequences.

use crate::{
    error::CompareError,
    point::TrackPoint,
    trajectory::{align, Trajectory},
};

/// Mean planar distance over the common prefix of `a` and `b`.
///
/// Both slices must start at the same frame. An empty overlap has no
/// defined divergence and yields [`CompareError::DegenerateMetric`].
pub fn divergence(a: &[TrackPoint], b: &[TrackPoint]) -> Result<f64, CompareError> {
    let common = a.len().min(b.len());
    if common == 0 {
        return Err(CompareError::DegenerateMetric);
    }
    let sum: f64 = a.iter().zip(b.iter()).map(|(p, q)| p.distance(q)).sum();
    Ok(sum / common as f64)
}

/// Every per-frame distance over the common prefix, in frame order.
pub fn point_distances(a: &[TrackPoint], b: &[TrackPoint]) -> Vec<f64> {
    a.iter().zip(b.iter()).map(|(p, q)| p.distance(q)).collect()
}

/// Overlap gate, alignment and divergence in one call.
///
/// `Ok(None)` means the trajectories share no frame and are not comparable.
pub fn trajectory_divergence(a: &Trajectory, b: &Trajectory) -> Result<Option<f64>, CompareError> {
    match align(a, b) {
        Some(aligned) => {
            debug_assert!(!aligned.is_empty(), "overlap gate let through an empty alignment");
            divergence(aligned.left, aligned.right).map(Some)
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::tests::line;
    use nearly_eq::assert_nearly_eq;

    #[test]
    fn test_divergence_uses_common_prefix() {
        let a = vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(1.0, 0.0)];
        let b = vec![
            TrackPoint::new(0.0, 1.0),
            TrackPoint::new(1.0, 3.0),
            TrackPoint::new(100.0, 100.0),
        ];
        assert_nearly_eq!(divergence(&a, &b).unwrap(), 2.0, 1e-12);
        assert_nearly_eq!(divergence(&b, &a).unwrap(), 2.0, 1e-12);
    }

    #[test]
    fn test_divergence_empty_is_degenerate() {
        let a = vec![TrackPoint::new(0.0, 0.0)];
        assert!(matches!(
            divergence(&a, &[]),
            Err(CompareError::DegenerateMetric)
        ));
        assert!(matches!(
            divergence(&[], &[]),
            Err(CompareError::DegenerateMetric)
        ));
    }

    #[test]
    fn test_point_distances() {
        let a = vec![TrackPoint::new(0.0, 0.0), TrackPoint::new(0.0, 0.0)];
        let b = vec![TrackPoint::new(3.0, 4.0)];
        assert_eq!(point_distances(&a, &b), vec![5.0]);
    }

    #[test]
    fn test_trajectory_divergence_shifted_diagonal() {
        // frames 10..=14 on the diagonal vs frames 12..=16 shifted by (+1, +1)
        let truth = line(10, 5, (0.0, 0.0), (1.0, 1.0));
        let test = line(12, 5, (1.0, 1.0), (1.0, 1.0));
        let d = trajectory_divergence(&truth, &test).unwrap().unwrap();
        assert_nearly_eq!(d, 2.0_f64.sqrt(), 1e-12);
        let d = trajectory_divergence(&test, &truth).unwrap().unwrap();
        assert_nearly_eq!(d, 2.0_f64.sqrt(), 1e-12);
    }

    #[test]
    fn test_trajectory_divergence_disjoint() {
        let a = line(0, 5, (0.0, 0.0), (1.0, 1.0));
        let b = line(5, 5, (0.0, 0.0), (1.0, 1.0));
        assert_eq!(trajectory_divergence(&a, &b).unwrap(), None);
    }
}
