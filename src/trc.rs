//! Reader for PeTrack `.trc` trajectory files.
//!
//! ```text
//! version 4
//! <person count>
//! <nr> <height> <first> <last> <colCount> <r> <g> <b> [<markerID>] <numPoints>
//! <comment>
//! <x> <y> [<sx> <sy> <sz>] <qual> <cx> <cy> <r> <g> <b> [<markerID>]
//! ...
//! ```
//!
//! Persons are separated by blank lines. The person marker id exists from
//! version 4 on, the comment line and the point marker id from version 3,
//! the stereo point from version 2.

use std::{path::Path, str::FromStr};

use tracing::{debug, info};

use crate::{
    error::CompareError,
    point::{Rgb, TrackPoint},
    trajectory::{Trajectory, TrajectoryMeta, TrajectorySet},
};

const MAX_VERSION: u32 = 4;

/// Reads and parses the file at `path`.
pub fn parse_trc(path: impl AsRef<Path>) -> Result<TrajectorySet, CompareError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| CompareError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let set = parse_trc_str(&path.display().to_string(), &text)?;
    info!(path = %path.display(), persons = set.len(), "loaded trajectories");
    Ok(set)
}

/// Parses `.trc` content. `origin` only labels error messages.
pub fn parse_trc_str(origin: &str, text: &str) -> Result<TrajectorySet, CompareError> {
    let mut reader = LineReader::new(origin, text);

    let (line, version_line) = reader.require("version header")?;
    let version = parse_version(origin, line, version_line)?;
    let (line, count_line) = reader.require("person count")?;
    let declared: usize = Fields::new(origin, line, count_line, 1)?.next("person count")?;
    debug!(origin, version, declared, "parsing trc");

    let mut set = TrajectorySet::new();
    while reader.skip_blank() {
        let trajectory = parse_person(&mut reader, version)?;
        set.push(trajectory);
    }

    if set.len() != declared {
        return Err(CompareError::format(
            origin,
            reader.line_number(),
            format!("file declares {} persons but contains {}", declared, set.len()),
        ));
    }
    Ok(set)
}

fn parse_version(origin: &str, line: usize, text: &str) -> Result<u32, CompareError> {
    let mut tokens = text.split_whitespace();
    let keyword = tokens.next().unwrap_or_default();
    if !keyword.eq_ignore_ascii_case("version") {
        return Err(CompareError::format(origin, line, "expected 'version <n>'"));
    }
    let version = tokens
        .next()
        .and_then(|t| t.parse::<u32>().ok())
        .ok_or_else(|| CompareError::format(origin, line, "missing version number"))?;
    if version == 0 || version > MAX_VERSION {
        return Err(CompareError::format(
            origin,
            line,
            format!("unsupported trc version {}", version),
        ));
    }
    Ok(version)
}

fn parse_person(reader: &mut LineReader<'_>, version: u32) -> Result<Trajectory, CompareError> {
    let origin = reader.origin;
    let (header_line, header) = reader.require("person header")?;
    let n_tokens = if version > 3 { 10 } else { 9 };
    let mut fields = Fields::new(origin, header_line, header, n_tokens)?;

    let nr: i64 = fields.next("person number")?;
    let height: f64 = fields.next("height")?;
    let first_frame: usize = fields.next("first frame")?;
    let last_frame: usize = fields.next("last frame")?;
    let col_count: i64 = fields.next("color count")?;
    let color = fields.color()?;
    let marker_id = if version > 3 {
        marker(fields.next("marker id")?)
    } else {
        None
    };
    let declared_points: usize = fields.next("point count")?;

    if declared_points == 0 {
        return Err(CompareError::format(origin, header_line, "person without points"));
    }
    if last_frame < first_frame || last_frame - first_frame + 1 != declared_points {
        return Err(CompareError::format(
            origin,
            header_line,
            format!(
                "frames {}..={} do not fit {} points",
                first_frame, last_frame, declared_points
            ),
        ));
    }

    if version > 2 {
        reader.require("comment line")?;
    }

    let mut points = Vec::with_capacity(declared_points);
    for i in 0..declared_points {
        let (line, text) = reader.next_line().ok_or_else(|| {
            CompareError::format(
                origin,
                reader.line_number(),
                format!(
                    "person {} declares {} points but file ends after {}",
                    nr, declared_points, i
                ),
            )
        })?;
        points.push(parse_point(origin, line, text, version)?);
    }

    let meta = TrajectoryMeta {
        nr,
        height,
        col_count,
        color,
        marker_id,
        declared_points,
    };
    Ok(Trajectory::new(first_frame, last_frame, points)?.with_meta(meta))
}

fn parse_point(
    origin: &str,
    line: usize,
    text: &str,
    version: u32,
) -> Result<TrackPoint, CompareError> {
    let mut n_tokens = 8;
    if version > 1 {
        n_tokens += 3;
    }
    if version > 2 {
        n_tokens += 1;
    }
    let mut fields = Fields::new(origin, line, text, n_tokens)?;

    let x: f64 = fields.next("x")?;
    let y: f64 = fields.next("y")?;
    let mut point = TrackPoint::new(x, y);

    if version > 1 {
        let sx: f64 = fields.next("stereo x")?;
        let sy: f64 = fields.next("stereo y")?;
        let sz: f64 = fields.next("stereo z")?;
        // -1 -1 -1 marks a point without stereo data
        if !(sx == -1.0 && sy == -1.0 && sz == -1.0) {
            point = point.with_stereo(sx, sy, sz);
        }
    }

    let quality: i32 = fields.next("quality")?;
    let cx: f64 = fields.next("color x")?;
    let cy: f64 = fields.next("color y")?;
    let color = fields.color()?;
    point = point.with_quality(quality).with_color(cx, cy, color);

    if version > 2 {
        if let Some(id) = marker(fields.next("marker id")?) {
            point = point.with_marker(id);
        }
    }
    Ok(point)
}

fn marker(id: i32) -> Option<i32> {
    (id != -1).then_some(id)
}

/*----------------------------------------------------------------------------
Line and field cursors
----------------------------------------------------------------------------*/

struct LineReader<'a> {
    origin: &'a str,
    lines: Vec<&'a str>,
    index: usize,
}

impl<'a> LineReader<'a> {
    fn new(origin: &'a str, text: &'a str) -> Self {
        Self {
            origin,
            lines: text.lines().collect(),
            index: 0,
        }
    }

    /// 1-based number of the next line.
    fn line_number(&self) -> usize {
        self.index + 1
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.index).copied()?;
        self.index += 1;
        Some((self.index, line))
    }

    fn require(&mut self, what: &str) -> Result<(usize, &'a str), CompareError> {
        let line_number = self.line_number();
        self.next_line().ok_or_else(|| {
            CompareError::format(
                self.origin,
                line_number,
                format!("expected {} but reached end of file", what),
            )
        })
    }

    /// Skips blank lines; returns whether content remains.
    fn skip_blank(&mut self) -> bool {
        while let Some(line) = self.lines.get(self.index) {
            if !line.trim().is_empty() {
                return true;
            }
            self.index += 1;
        }
        false
    }
}

struct Fields<'a> {
    origin: &'a str,
    line: usize,
    tokens: std::vec::IntoIter<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(
        origin: &'a str,
        line: usize,
        text: &'a str,
        expected: usize,
    ) -> Result<Self, CompareError> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() != expected {
            return Err(CompareError::format(
                origin,
                line,
                format!("expected {} fields but found {}", expected, tokens.len()),
            ));
        }
        Ok(Self {
            origin,
            line,
            tokens: tokens.into_iter(),
        })
    }

    fn next<T: FromStr>(&mut self, what: &str) -> Result<T, CompareError> {
        let token = self.tokens.next().ok_or_else(|| {
            CompareError::format(self.origin, self.line, format!("missing {}", what))
        })?;
        token.parse().map_err(|_| {
            CompareError::format(
                self.origin,
                self.line,
                format!("invalid {} '{}'", what, token),
            )
        })
    }

    /// Three channel values; `-1 -1 -1` reads as the default color.
    fn color(&mut self) -> Result<Rgb, CompareError> {
        let r: i32 = self.next("red")?;
        let g: i32 = self.next("green")?;
        let b: i32 = self.next("blue")?;
        if (r, g, b) == (-1, -1, -1) {
            return Ok(Rgb::default());
        }
        let channel = |value: i32, name: &str| {
            u8::try_from(value).map_err(|_| {
                CompareError::format(
                    self.origin,
                    self.line,
                    format!("{} value {} out of range 0..=255", name, value),
                )
            })
        };
        Ok(Rgb::new(channel(r, "red")?, channel(g, "green")?, channel(b, "blue")?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_PERSONS: &str = "version 4
2
1 175.5 10 12 1 255 0 0 -1 3

100.0 200.0 -1 -1 -1 100 101.0 201.0 255 0 0 -1
101.5 200.5 -1 -1 -1 100 102.0 202.0 255 0 0 -1
103.0 201.0 1.0 2.0 3.0 90 103.0 203.0 255 0 0 7

2 160 5 5 1 -1 -1 -1 12 1
walked in late
10 20 -1 -1 -1 50 10 20 0 0 255 12

";

    #[test]
    fn test_parse_two_persons() {
        let set = parse_trc_str("two.trc", TWO_PERSONS).unwrap();
        assert_eq!(set.len(), 2);

        let first = &set[0];
        assert_eq!(first.id(), 0);
        assert_eq!((first.first_frame(), first.last_frame()), (10, 12));
        assert_eq!(first.len(), 3);
        let meta = first.meta().unwrap();
        assert_eq!(meta.nr, 1);
        assert_eq!(meta.height, 175.5);
        assert_eq!(meta.color, Rgb::new(255, 0, 0));
        assert_eq!(meta.marker_id, None);
        assert_eq!(meta.declared_points, 3);

        let p = first.point_at(11).unwrap();
        assert_eq!((p.x(), p.y()), (101.5, 200.5));
        assert_eq!(p.stereo(), None);
        assert_eq!(p.quality(), 100);
        assert_eq!(p.marker_id(), None);
        let p = first.point_at(12).unwrap();
        assert!(p.stereo().is_some());
        assert_eq!(p.marker_id(), Some(7));

        let second = &set[1];
        assert_eq!(second.id(), 1);
        assert_eq!(second.len(), 1);
        let meta = second.meta().unwrap();
        assert_eq!(meta.marker_id, Some(12));
        assert_eq!(meta.color, Rgb::default());
        assert_eq!(second.points()[0].color(), Rgb::new(0, 0, 255));
    }

    #[test]
    fn test_parse_version_2_without_comment() {
        let text = concat!(
            "version 2\n1\n7 0 0 1 1 0 0 0 2\n",
            "1 1 -1 -1 -1 0 1 1 0 0 0\n",
            "2 2 -1 -1 -1 0 2 2 0 0 0\n",
        );
        let set = parse_trc_str("v2.trc", text).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].points()[1].x(), 2.0);
    }

    #[test]
    fn test_point_count_mismatch() {
        let text = concat!(
            "version 4\n1\n1 0 0 2 1 0 0 0 -1 3\n\n",
            "1 1 -1 -1 -1 0 1 1 0 0 0 -1\n",
            "2 2 -1 -1 -1 0 2 2 0 0 0 -1\n",
        );
        let err = parse_trc_str("short.trc", text).unwrap_err();
        assert!(matches!(err, CompareError::Format { .. }));
        assert!(err.to_string().contains("declares 3 points"));
    }

    #[test]
    fn test_interval_mismatch() {
        let text = concat!(
            "version 4\n1\n1 0 0 5 1 0 0 0 -1 2\n\n",
            "1 1 -1 -1 -1 0 1 1 0 0 0 -1\n",
            "2 2 -1 -1 -1 0 2 2 0 0 0 -1\n",
        );
        let err = parse_trc_str("interval.trc", text).unwrap_err();
        match err {
            CompareError::Format { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_person_count_mismatch() {
        let text = TWO_PERSONS.replacen("\n2\n", "\n3\n", 1);
        let err = parse_trc_str("count.trc", &text).unwrap_err();
        assert!(err.to_string().contains("declares 3 persons but contains 2"));
    }

    #[test]
    fn test_bad_tokens() {
        let text = TWO_PERSONS.replacen("101.5 200.5", "101.5 abc", 1);
        let err = parse_trc_str("bad.trc", &text).unwrap_err();
        assert_eq!(err.to_string(), "bad.trc:6: invalid y 'abc'");

        let text = TWO_PERSONS.replacen("255 0 0 -1 3", "256 0 0 -1 3", 1);
        assert!(parse_trc_str("color.trc", &text).is_err());

        let text = TWO_PERSONS.replacen("100 101.0 201.0", "100 101.0", 1);
        let err = parse_trc_str("fields.trc", &text).unwrap_err();
        assert!(err.to_string().contains("expected 12 fields but found 11"));
    }

    #[test]
    fn test_version_header() {
        assert!(parse_trc_str("v.trc", "version 5\n0\n").is_err());
        assert!(parse_trc_str("v.trc", "versio 4\n0\n").is_err());
        assert!(parse_trc_str("v.trc", "").is_err());
        let empty = parse_trc_str("v.trc", "Version 4\n0\n").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            parse_trc("/nonexistent/truth.trc"),
            Err(CompareError::Io { .. })
        ));
    }
}
