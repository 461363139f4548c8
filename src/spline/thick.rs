//! Pen-stroke thickening.
//!
//! A centerline segment is offset by half the pen width on each side into a
//! top and a bottom rail curve, closed by two straight end caps. The region
//! between them is scan-filled on the integer grid of the segment's baseline
//! frame and mapped back to the global frame.

use kurbo::{Point, Rect};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::baseline::to_baseline;
use super::fit::{fit_cubic, fit_line, Cubic, Line, COINCIDENT_TOLERANCE};
use crate::anchor::{Glyph, OrientedAnchor, SplineSequence};

/// Slack used when testing span membership and rounding fill bounds.
const FILL_EPS: f64 = 1e-9;

/// Filled interior of one thickened segment, as parallel coordinate arrays.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThickSegment {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl ThickSegment {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One thickened segment per consecutive anchor pair of a glyph.
pub type ThickGlyph = Vec<ThickSegment>;

/// Thickened glyphs of a spline sequence, in order.
pub type ThickSpline = Vec<ThickGlyph>;

// ── Contour cases ────────────────────────────────────────────────────────

/// How the end caps lean, which decides whether each cap bounds the stroke
/// from above or from below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourCase {
    /// Both caps bound the top.
    Peak,
    /// Left cap on top, right cap at the bottom.
    RisingPair,
    /// Left cap at the bottom, right cap on top.
    FallingPair,
    /// Both caps bound the bottom.
    Valley,
}

impl ContourCase {
    /// Classify from the slopes of the left and right caps, as `y(x)` slopes
    /// in the baseline frame. Vertical caps carry an infinite slope.
    pub fn classify(left_cap_slope: f64, right_cap_slope: f64) -> Self {
        let (l, r) = (left_cap_slope, right_cap_slope);
        if l >= 0.0 && r <= 0.0 {
            ContourCase::Peak
        } else if l >= 0.0 && r >= 0.0 {
            ContourCase::RisingPair
        } else if l <= 0.0 && r <= 0.0 {
            ContourCase::FallingPair
        } else {
            ContourCase::Valley
        }
    }

    fn roles(self) -> (Vec<Role>, Vec<Role>) {
        use Role::*;
        match self {
            ContourCase::Peak => (vec![LeftCap, TopRail, RightCap], vec![BottomRail]),
            ContourCase::RisingPair => (vec![LeftCap, TopRail], vec![BottomRail, RightCap]),
            ContourCase::FallingPair => (vec![TopRail, RightCap], vec![LeftCap, BottomRail]),
            ContourCase::Valley => (vec![TopRail], vec![LeftCap, BottomRail, RightCap]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    LeftCap,
    RightCap,
    TopRail,
    BottomRail,
}

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Rail(Cubic),
    Cap(Line),
}

/// A boundary curve restricted to an x span.
#[derive(Debug, Clone, Copy)]
struct Piece {
    boundary: Boundary,
    x_min: f64,
    x_max: f64,
}

impl Piece {
    fn new(boundary: Boundary, xa: f64, xb: f64) -> Self {
        Self {
            boundary,
            x_min: xa.min(xb),
            x_max: xa.max(xb),
        }
    }

    fn eval(&self, x: f64) -> Option<f64> {
        if x < self.x_min - FILL_EPS || x > self.x_max + FILL_EPS {
            return None;
        }
        match self.boundary {
            Boundary::Rail(cubic) => Some(cubic.eval(x)),
            Boundary::Cap(line) => line.eval(x),
        }
    }
}

/// Top and bottom boundaries of a thickened segment in its baseline frame.
#[derive(Debug, Clone)]
struct Contour {
    case: ContourCase,
    top: Vec<Piece>,
    bottom: Vec<Piece>,
    x_min: f64,
    x_max: f64,
}

impl Contour {
    /// Build the contour from the four corners: `p0t`, `p0b` at the start,
    /// `p1t`, `p1b` at the end.
    fn build(
        p0t: &OrientedAnchor,
        p0b: &OrientedAnchor,
        p1t: &OrientedAnchor,
        p1b: &OrientedAnchor,
    ) -> Self {
        let left_cap = fit_line(p0t, p0b);
        let right_cap = fit_line(p1t, p1b);
        let case = ContourCase::classify(left_cap.slope(), right_cap.slope());
        let (mut top_roles, mut bottom_roles) = case.roles();

        let mut left = Piece::new(Boundary::Cap(left_cap), p0t.x, p0b.x);
        let mut right = Piece::new(Boundary::Cap(right_cap), p1t.x, p1b.x);
        let top_rail = Piece::new(Boundary::Rail(fit_cubic(p0t, p1t)), p0t.x, p1t.x);
        let bottom_rail = Piece::new(Boundary::Rail(fit_cubic(p0b, p1b)), p0b.x, p1b.x);

        let top_crossed = p0t.x > p1t.x;
        let bottom_crossed = p0b.x > p1b.x;
        match (top_crossed, bottom_crossed) {
            (false, false) => {}
            (true, true) => {
                debug!("both rails crossed, bounding with the caps only");
                top_roles = vec![Role::LeftCap, Role::RightCap];
                bottom_roles = vec![Role::LeftCap, Role::RightCap];
            }
            (true, false) | (false, true) => {
                let (crossed, other, rail, survivors) = if top_crossed {
                    (&mut top_roles, &mut bottom_roles, Role::TopRail, (p0b, p1b))
                } else {
                    (&mut bottom_roles, &mut top_roles, Role::BottomRail, (p0t, p1t))
                };
                crossed.retain(|&r| r != rail);
                if crossed.is_empty() {
                    other.retain(|&r| r == Role::TopRail || r == Role::BottomRail);
                    crossed.extend([Role::LeftCap, Role::RightCap]);
                }
                match left_cap.intersect(&right_cap) {
                    Some((ix, iy)) if ix.is_finite() && iy.is_finite() => {
                        trace!("clipping caps at ({:.4}, {:.4})", ix, iy);
                        left = Piece::new(Boundary::Cap(left_cap), survivors.0.x, ix);
                        right = Piece::new(Boundary::Cap(right_cap), ix, survivors.1.x);
                    }
                    _ => trace!("caps do not intersect, leaving them unclipped"),
                }
            }
        }

        let piece = |role: &Role| match role {
            Role::LeftCap => left,
            Role::RightCap => right,
            Role::TopRail => top_rail,
            Role::BottomRail => bottom_rail,
        };
        let corners_x = [p0t.x, p0b.x, p1t.x, p1b.x];
        Self {
            case,
            top: top_roles.iter().map(piece).collect(),
            bottom: bottom_roles.iter().map(piece).collect(),
            x_min: corners_x.iter().copied().fold(f64::INFINITY, f64::min),
            x_max: corners_x.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    fn top_at(&self, x: f64) -> Option<f64> {
        self.top
            .iter()
            .filter_map(|p| p.eval(x))
            .reduce(f64::max)
    }

    fn bottom_at(&self, x: f64) -> Option<f64> {
        self.bottom
            .iter()
            .filter_map(|p| p.eval(x))
            .reduce(f64::min)
    }

    /// Integer grid points between the bottom and top boundaries.
    fn fill(&self) -> (Vec<f64>, Vec<f64>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        if !(self.x_min.is_finite() && self.x_max.is_finite()) {
            return (xs, ys);
        }
        let first = (self.x_min - FILL_EPS).ceil() as i64;
        let last = (self.x_max + FILL_EPS).floor() as i64;
        for column in first..=last {
            let x = column as f64;
            let (Some(top), Some(bottom)) = (self.top_at(x), self.bottom_at(x)) else {
                continue;
            };
            let y_lo = (bottom - FILL_EPS).ceil() as i64;
            let y_hi = (top + FILL_EPS).floor() as i64;
            for row in y_lo..=y_hi {
                xs.push(x);
                ys.push(row as f64);
            }
        }
        (xs, ys)
    }
}

// ── Thickening ───────────────────────────────────────────────────────────

/// Point the anchor into the right half plane, flipping it by 180° if needed.
fn face_forward(anchor: OrientedAnchor) -> OrientedAnchor {
    let angle = anchor.angle_deg();
    if angle > -90.0 && angle < 90.0 {
        anchor
    } else {
        anchor.rotate(180.0)
    }
}

/// The two corners at `half` distance on either side of `anchor`,
/// perpendicular to its direction.
fn offset_corners(anchor: &OrientedAnchor, half: f64) -> (OrientedAnchor, OrientedAnchor) {
    let normal = anchor.angle_deg() + 90.0;
    (
        anchor.translate_along(normal, half),
        anchor.translate_along(normal, -half),
    )
}

/// Fill the pen stroke of width `thickness` drawn along `p0 → p1`.
///
/// Coincident anchors produce the single point `p0`. `thickness` is
/// expected to be positive.
pub fn thicken_segment(p0: &OrientedAnchor, p1: &OrientedAnchor, thickness: f64) -> ThickSegment {
    if p0.distance(p1) < COINCIDENT_TOLERANCE {
        return ThickSegment {
            x: vec![p0.x],
            y: vec![p0.y],
        };
    }
    let (rot_p0, rot_p1, frame) = to_baseline(p0, p1);
    let rot_p0 = face_forward(rot_p0);
    let rot_p1 = face_forward(rot_p1);

    let half = thickness / 2.0;
    let (p0t, p0b) = offset_corners(&rot_p0, half);
    let (p1t, p1b) = offset_corners(&rot_p1, half);

    let contour = Contour::build(&p0t, &p0b, &p1t, &p1b);
    let (local_x, local_y) = contour.fill();
    trace!(
        "thickened {} -> {} as {:?}: {} points",
        p0,
        p1,
        contour.case,
        local_x.len()
    );
    let (x, y) = frame.points_to_global(&local_x, &local_y);
    ThickSegment { x, y }
}

/// Thicken every segment of a glyph.
pub fn thicken_glyph(glyph: &Glyph, thickness: f64) -> ThickGlyph {
    glyph
        .windows(2)
        .map(|pair| thicken_segment(&pair[0], &pair[1], thickness))
        .collect()
}

/// Thicken every glyph of a sequence. Glyphs are independent and processed
/// in parallel; the output keeps their order.
pub fn thicken_spline_sequence(spline: &SplineSequence, thickness: f64) -> ThickSpline {
    let thick: ThickSpline = spline
        .par_iter()
        .map(|glyph| thicken_glyph(glyph, thickness))
        .collect();
    debug!(
        "thickened {} glyphs into {} points",
        thick.len(),
        thick.iter().flatten().map(ThickSegment::len).sum::<usize>()
    );
    thick
}

pub fn translate_thick_spline(thick: &ThickSpline, dx: f64, dy: f64) -> ThickSpline {
    thick
        .iter()
        .map(|glyph| {
            glyph
                .iter()
                .map(|seg| ThickSegment {
                    x: seg.x.iter().map(|x| x + dx).collect(),
                    y: seg.y.iter().map(|y| y + dy).collect(),
                })
                .collect()
        })
        .collect()
}

/// Bounding box of all filled points, `None` when there are none.
pub fn thick_spline_bbox(thick: &ThickSpline) -> Option<Rect> {
    let mut points = thick
        .iter()
        .flatten()
        .flat_map(|seg| seg.x.iter().zip(&seg.y))
        .map(|(&x, &y)| Point::new(x, y));
    let first = points.next()?;
    Some(points.fold(Rect::from_points(first, first), |bbox, p| bbox.union_pt(p)))
}
