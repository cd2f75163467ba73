use crate::{error::CompareError, point::Rgb, point::TrackPoint};
use std::ops::Index;

/*----------------------------------------------------------------------------
TrajectoryMeta struct
----------------------------------------------------------------------------*/

/// Header values read alongside a trajectory. Only used for load-time
/// consistency checks and display.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryMeta {
    pub nr: i64,
    pub height: f64,
    pub col_count: i64,
    pub color: Rgb,
    pub marker_id: Option<i32>,
    pub declared_points: usize,
}

/*----------------------------------------------------------------------------
Trajectory struct
----------------------------------------------------------------------------*/

/// A single person's track over the closed frame interval
/// `[first_frame, last_frame]`, one sample per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    id: usize,
    first_frame: usize,
    last_frame: usize,
    points: Vec<TrackPoint>,
    meta: Option<TrajectoryMeta>,
}

impl Trajectory {
    /// Fails unless `points.len() == last_frame - first_frame + 1`.
    pub fn new(
        first_frame: usize,
        last_frame: usize,
        points: Vec<TrackPoint>,
    ) -> Result<Self, CompareError> {
        if last_frame < first_frame {
            return Err(CompareError::format(
                "trajectory",
                0,
                format!(
                    "last frame {} precedes first frame {}",
                    last_frame, first_frame
                ),
            ));
        }
        let expected = last_frame - first_frame + 1;
        if points.len() != expected {
            return Err(CompareError::format(
                "trajectory",
                0,
                format!(
                    "frames {}..={} need {} points, but got {}",
                    first_frame,
                    last_frame,
                    expected,
                    points.len()
                ),
            ));
        }
        Ok(Self {
            id: 0,
            first_frame,
            last_frame,
            points,
            meta: None,
        })
    }

    /// Convenience constructor deriving `last_frame` from the point count.
    pub fn starting_at(first_frame: usize, points: Vec<TrackPoint>) -> Result<Self, CompareError> {
        if points.is_empty() {
            return Err(CompareError::format(
                "trajectory",
                0,
                "a trajectory needs at least one point",
            ));
        }
        let last_frame = first_frame + points.len() - 1;
        Self::new(first_frame, last_frame, points)
    }

    pub fn with_meta(mut self, meta: TrajectoryMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Position in the owning [`TrajectorySet`]; 0 until inserted.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn first_frame(&self) -> usize {
        self.first_frame
    }

    pub fn last_frame(&self) -> usize {
        self.last_frame
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn meta(&self) -> Option<&TrajectoryMeta> {
        self.meta.as_ref()
    }

    pub fn contains_frame(&self, frame: usize) -> bool {
        self.first_frame <= frame && frame <= self.last_frame
    }

    pub fn point_at(&self, frame: usize) -> Option<&TrackPoint> {
        if self.contains_frame(frame) {
            self.points.get(frame - self.first_frame)
        } else {
            None
        }
    }

    /// O(1) interval intersection test run before any metric computation.
    #[inline]
    pub fn overlaps(&self, other: &Trajectory) -> bool {
        !(self.last_frame < other.first_frame
            || other.last_frame < self.first_frame)
    }
}

/*----------------------------------------------------------------------------
Frame alignment
----------------------------------------------------------------------------*/

/// Two point slices starting at the same absolute frame.
///
/// `left` and `right` keep the argument order of [`align`]. Their lengths may
/// differ; pairing stops at the shorter one, i.e. at the common last frame.
#[derive(Debug, Clone, Copy)]
pub struct Alignment<'a> {
    pub first_frame: usize,
    pub left: &'a [TrackPoint],
    pub right: &'a [TrackPoint],
}

impl<'a> Alignment<'a> {
    /// Number of common frames.
    pub fn len(&self) -> usize {
        self.left.len().min(self.right.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&'a TrackPoint, &'a TrackPoint)> + 'a {
        self.left.iter().zip(self.right.iter())
    }
}

/// Slices the earlier-starting trajectory forward so both begin at the later
/// first frame. Returns `None` for temporally disjoint trajectories.
pub fn align<'a>(left: &'a Trajectory, right: &'a Trajectory) -> Option<Alignment<'a>> {
    if !left.overlaps(right) {
        return None;
    }
    let first_frame = left.first_frame.max(right.first_frame);
    Some(Alignment {
        first_frame,
        left: &left.points[first_frame - left.first_frame..],
        right: &right.points[first_frame - right.first_frame..],
    })
}

/*----------------------------------------------------------------------------
TrajectorySet struct
----------------------------------------------------------------------------*/

/// All trajectories loaded from one file. The id of a trajectory is its
/// insertion index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrajectorySet {
    trajectories: Vec<Trajectory>,
}

impl TrajectorySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut trajectory: Trajectory) -> usize {
        let id = self.trajectories.len();
        trajectory.id = id;
        self.trajectories.push(trajectory);
        id
    }

    pub fn get(&self, id: usize) -> Option<&Trajectory> {
        self.trajectories.get(id)
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trajectory> {
        self.trajectories.iter()
    }

    pub fn as_slice(&self) -> &[Trajectory] {
        &self.trajectories
    }
}

impl Index<usize> for TrajectorySet {
    type Output = Trajectory;

    fn index(&self, id: usize) -> &Self::Output {
        &self.trajectories[id]
    }
}

impl FromIterator<Trajectory> for TrajectorySet {
    fn from_iter<I: IntoIterator<Item = Trajectory>>(iter: I) -> Self {
        let mut set = TrajectorySet::new();
        for trajectory in iter {
            set.push(trajectory);
        }
        set
    }
}

impl<'a> IntoIterator for &'a TrajectorySet {
    type Item = &'a Trajectory;
    type IntoIter = std::slice::Iter<'a, Trajectory>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
