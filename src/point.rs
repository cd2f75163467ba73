use std::hash::{Hash, Hasher};

use nalgebra::{Point2, Point3};

/* ------------------------------------------------------------------------------
 * Rgb struct
 * ------------------------------------------------------------------------------ */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/* ------------------------------------------------------------------------------
 * TrackPoint struct
 * ------------------------------------------------------------------------------ */

/// One frame's observation of a person.
///
/// Positions are in image pixels. Equality and hashing cover every field,
/// floats compared by bit pattern, so two samples are equal only if they
/// would be written out identically.
#[derive(Debug, Clone, Copy)]
pub struct TrackPoint {
    pos: Point2<f64>,
    stereo: Option<Point3<f64>>,
    quality: i32,
    color_pos: Point2<f64>,
    color: Rgb,
    marker_id: Option<i32>,
}

impl TrackPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            pos: Point2::new(x, y),
            stereo: None,
            quality: 0,
            color_pos: Point2::new(0.0, 0.0),
            color: Rgb::default(),
            marker_id: None,
        }
    }

    pub fn with_stereo(mut self, x: f64, y: f64, z: f64) -> Self {
        self.stereo = Some(Point3::new(x, y, z));
        self
    }

    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_marker(mut self, marker_id: i32) -> Self {
        self.marker_id = Some(marker_id);
        self
    }

    pub fn with_color(mut self, x: f64, y: f64, color: Rgb) -> Self {
        self.color_pos = Point2::new(x, y);
        self.color = color;
        self
    }

    #[inline(always)]
    pub fn x(&self) -> f64 {
        self.pos.x
    }

    #[inline(always)]
    pub fn y(&self) -> f64 {
        self.pos.y
    }

    #[inline(always)]
    pub fn position(&self) -> Point2<f64> {
        self.pos
    }

    pub fn stereo(&self) -> Option<Point3<f64>> {
        self.stereo
    }

    pub fn quality(&self) -> i32 {
        self.quality
    }

    pub fn color_position(&self) -> Point2<f64> {
        self.color_pos
    }

    pub fn color(&self) -> Rgb {
        self.color
    }

    pub fn marker_id(&self) -> Option<i32> {
        self.marker_id
    }

    /// Planar Euclidean distance; stereo coordinates are ignored.
    #[inline]
    pub fn distance(&self, other: &TrackPoint) -> f64 {
        (self.pos - other.pos).norm()
    }

    fn bits(&self) -> [u64; 7] {
        let stereo = self.stereo.map_or([u64::MAX; 3], |s| {
            [s.x.to_bits(), s.y.to_bits(), s.z.to_bits()]
        });
        [
            self.pos.x.to_bits(),
            self.pos.y.to_bits(),
            stereo[0],
            stereo[1],
            stereo[2],
            self.color_pos.x.to_bits(),
            self.color_pos.y.to_bits(),
        ]
    }
}

impl PartialEq for TrackPoint {
    fn eq(&self, other: &Self) -> bool {
        self.stereo.is_some() == other.stereo.is_some()
            && self.bits() == other.bits()
            && self.quality == other.quality
            && self.color == other.color
            && self.marker_id == other.marker_id
    }
}

impl Eq for TrackPoint {}

impl Hash for TrackPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.stereo.is_some().hash(state);
        self.bits().hash(state);
        self.quality.hash(state);
        self.color.hash(state);
        self.marker_id.hash(state);
    }
}
