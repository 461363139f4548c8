//! Oriented anchors and the glyph / spline-sequence containers built from them.

use std::fmt;

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// A 2D position plus a direction angle in degrees.
///
/// The angle is kept in `(-180, 180]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedAnchor {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "angle_deg")]
    angle: f64,
}

/// One continuous drawn stroke, in drawing order.
pub type Glyph = Vec<OrientedAnchor>;

/// An ordered sequence of glyphs: a letter made of several strokes, or a word.
pub type SplineSequence = Vec<Glyph>;

impl OrientedAnchor {
    pub fn new(x: f64, y: f64, angle_deg: f64) -> Self {
        Self {
            x,
            y,
            angle: wrap_degrees(angle_deg),
        }
    }

    pub fn angle_deg(&self) -> f64 {
        self.angle
    }

    pub fn angle_rad(&self) -> f64 {
        self.angle.to_radians()
    }

    /// Slope of the line through this anchor along its direction.
    pub fn slope(&self) -> f64 {
        self.angle_rad().tan()
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn with_angle(&self, angle_deg: f64) -> Self {
        Self::new(self.x, self.y, angle_deg)
    }

    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            angle: self.angle,
        }
    }

    /// Rotate the direction only; the position is unchanged.
    pub fn rotate(&self, delta_deg: f64) -> Self {
        self.with_angle(self.angle + delta_deg)
    }

    /// Move the anchor by `distance` along `dir_deg`, keeping its angle.
    pub fn translate_along(&self, dir_deg: f64, distance: f64) -> Self {
        let dir = dir_deg.to_radians();
        self.translate(distance * dir.cos(), distance * dir.sin())
    }

    /// Coefficients `(a, b)` of the line `y = a·x + b` through this anchor.
    pub fn to_ab_line(&self) -> (f64, f64) {
        let a = self.slope();
        (a, self.y - a * self.x)
    }

    pub fn distance(&self, other: &OrientedAnchor) -> f64 {
        self.point().distance(other.point())
    }
}

impl fmt::Display for OrientedAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.4}, {:.4}) # {:.4}", self.x, self.y, self.angle)
    }
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn wrap_degrees(deg: f64) -> f64 {
    if deg > -180.0 && deg <= 180.0 {
        deg
    } else {
        180.0 - (180.0 - deg).rem_euclid(360.0)
    }
}

/// Translate every anchor of a spline sequence.
pub fn translate_spline_sequence(spline: &SplineSequence, dx: f64, dy: f64) -> SplineSequence {
    spline
        .iter()
        .map(|glyph| glyph.iter().map(|a| a.translate(dx, dy)).collect())
        .collect()
}

/// Bounding box of all anchor positions, `None` for an empty sequence.
pub fn spline_sequence_bbox(spline: &SplineSequence) -> Option<Rect> {
    let mut points = spline.iter().flatten().map(OrientedAnchor::point);
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |bbox, p| bbox.union_pt(p)))
}

/// Pick a sampling stride for a set of glyphs.
///
/// Each segment proposes a hundredth of its horizontal extent; the largest
/// proposal wins and is rounded down to a power of ten. Long segments stay
/// cheap to sample while short ones are sampled more coarsely.
pub fn find_align_stride<'a>(glyphs: impl IntoIterator<Item = &'a Glyph>) -> Option<f64> {
    let widest = glyphs
        .into_iter()
        .flat_map(|glyph| glyph.windows(2).map(|w| (w[1].x - w[0].x) / 100.0))
        .fold(f64::NEG_INFINITY, f64::max);
    if !widest.is_finite() || widest <= 0.0 {
        return None;
    }
    Some(10f64.powf(widest.log10().floor()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angles_wrap_into_half_open_range() {
        assert_eq!(OrientedAnchor::new(0.0, 0.0, 180.0).angle_deg(), 180.0);
        assert_eq!(OrientedAnchor::new(0.0, 0.0, -180.0).angle_deg(), 180.0);
        assert!((OrientedAnchor::new(0.0, 0.0, 270.0).angle_deg() + 90.0).abs() < 1e-12);
        assert!((OrientedAnchor::new(0.0, 0.0, -450.0).angle_deg() + 90.0).abs() < 1e-12);
        assert_eq!(OrientedAnchor::new(0.0, 0.0, -30.5).angle_deg(), -30.5);
    }

    #[test]
    fn ab_line_passes_through_anchor() {
        let a = OrientedAnchor::new(2.0, 3.0, 45.0);
        let (slope, intercept) = a.to_ab_line();
        assert!((slope - 1.0).abs() < 1e-12);
        assert!((slope * 2.0 + intercept - 3.0).abs() < 1e-12);
    }

    #[test]
    fn translate_along_keeps_angle() {
        let a = OrientedAnchor::new(1.0, 1.0, 30.0);
        let moved = a.translate_along(90.0, 2.0);
        assert!((moved.x - 1.0).abs() < 1e-12);
        assert!((moved.y - 3.0).abs() < 1e-12);
        assert_eq!(moved.angle_deg(), 30.0);
    }

    #[test]
    fn bbox_covers_all_glyphs() {
        let spline = vec![
            vec![OrientedAnchor::new(0.0, 5.0, 0.0), OrientedAnchor::new(3.0, -1.0, 0.0)],
            vec![OrientedAnchor::new(-2.0, 2.0, 0.0)],
        ];
        let bbox = spline_sequence_bbox(&spline).unwrap();
        assert_eq!((bbox.x0, bbox.y0, bbox.x1, bbox.y1), (-2.0, -1.0, 3.0, 5.0));
        assert!(spline_sequence_bbox(&Vec::new()).is_none());
    }

    #[test]
    fn stride_is_power_of_ten() {
        let glyph = vec![
            OrientedAnchor::new(0.0, 0.0, 0.0),
            OrientedAnchor::new(350.0, 10.0, 0.0),
            OrientedAnchor::new(420.0, 10.0, 0.0),
        ];
        assert_eq!(find_align_stride([&glyph]), Some(1.0));
        let short = vec![OrientedAnchor::new(0.0, 0.0, 0.0), OrientedAnchor::new(20.0, 0.0, 0.0)];
        assert!((find_align_stride([&short]).unwrap() - 0.1).abs() < 1e-12);
    }
}
