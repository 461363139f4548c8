//! Baseline frame: rotate and translate two anchors so their chord lies on
//! the local x axis, with the first anchor at the origin.

use kurbo::{Affine, Point, Vec2};

use crate::anchor::OrientedAnchor;

/// The rigid transform between a segment's baseline frame and the global frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineFrame {
    /// Global position of the segment start.
    pub origin: Point,
    /// Direction of the chord `p0 → p1` in the global frame, in degrees.
    pub dir_deg: f64,
}

impl BaselineFrame {
    /// Affine taking baseline coordinates to global ones: rotate, then translate.
    pub fn to_global_affine(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::rotate(self.dir_deg.to_radians())
    }

    pub fn to_global(&self, local: Point) -> Point {
        self.to_global_affine() * local
    }

    pub fn to_local(&self, global: Point) -> Point {
        Affine::rotate(-self.dir_deg.to_radians()) * Affine::translate(-self.origin.to_vec2()) * global
    }

    pub fn anchor_to_global(&self, local: &OrientedAnchor) -> OrientedAnchor {
        let p = self.to_global(local.point());
        OrientedAnchor::new(p.x, p.y, local.angle_deg() + self.dir_deg)
    }

    pub fn anchor_to_local(&self, global: &OrientedAnchor) -> OrientedAnchor {
        let p = self.to_local(global.point());
        OrientedAnchor::new(p.x, p.y, global.angle_deg() - self.dir_deg)
    }

    /// Map a batch of baseline points back to the global frame.
    pub fn points_to_global(&self, xs: &[f64], ys: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let affine = self.to_global_affine();
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| {
                let p = affine * Point::new(x, y);
                (p.x, p.y)
            })
            .unzip()
    }
}

/// Express `p0`, `p1` in their baseline frame.
///
/// Returns `(rot_p0, rot_p1, frame)`; `rot_p0` sits at the origin and
/// `rot_p1` on the positive x axis, both with their angles reduced by the
/// chord direction.
pub fn to_baseline(
    p0: &OrientedAnchor,
    p1: &OrientedAnchor,
) -> (OrientedAnchor, OrientedAnchor, BaselineFrame) {
    let chord = Vec2::new(p1.x - p0.x, p1.y - p0.y);
    let dir_deg = chord.y.atan2(chord.x).to_degrees();
    let frame = BaselineFrame {
        origin: p0.point(),
        dir_deg,
    };
    let rot_p0 = OrientedAnchor::new(0.0, 0.0, p0.angle_deg() - dir_deg);
    // The chord length is the exact local x of p1, so y is exactly zero.
    let rot_p1 = OrientedAnchor::new(chord.hypot(), 0.0, p1.angle_deg() - dir_deg);
    (rot_p0, rot_p1, frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} != {b} (tol {tol})");
    }

    #[test]
    fn chord_lies_on_x_axis() {
        let p0 = OrientedAnchor::new(10.0, 10.0, -30.0);
        let p1 = OrientedAnchor::new(30.0, 20.0, 70.0);
        let (rot_p0, rot_p1, frame) = to_baseline(&p0, &p1);
        assert_eq!((rot_p0.x, rot_p0.y), (0.0, 0.0));
        assert_eq!(rot_p1.y, 0.0);
        assert_close(rot_p1.x, 500f64.sqrt(), 1e-12);
        let dir = 0.5f64.atan().to_degrees();
        assert_close(frame.dir_deg, dir, 1e-12);
        assert_close(rot_p0.angle_deg(), -30.0 - dir, 1e-12);
        assert_close(rot_p1.angle_deg(), 70.0 - dir, 1e-12);
    }

    #[test]
    fn round_trip_reproduces_global_anchors() {
        let cases = [
            (
                OrientedAnchor::new(967.5267, 974.1696, -85.8470),
                OrientedAnchor::new(1006.2328, 822.0541, -62.3541),
            ),
            (OrientedAnchor::new(-3.0, 2.0, 170.0), OrientedAnchor::new(-40.0, -7.5, -160.0)),
            (OrientedAnchor::new(0.0, 0.0, 0.0), OrientedAnchor::new(0.0, 12.0, 90.0)),
        ];
        for (p0, p1) in cases {
            let (rot_p0, rot_p1, frame) = to_baseline(&p0, &p1);
            for (local, global) in [(rot_p0, p0), (rot_p1, p1)] {
                let back = frame.anchor_to_global(&local);
                assert_close(back.x, global.x, 1e-9);
                assert_close(back.y, global.y, 1e-9);
                let diff = crate::anchor::wrap_degrees(back.angle_deg() - global.angle_deg());
                assert_close(diff, 0.0, 1e-9);
            }
        }
    }

    #[test]
    fn local_and_global_are_inverse() {
        let frame = BaselineFrame {
            origin: Point::new(4.0, -2.0),
            dir_deg: 123.0,
        };
        let p = Point::new(7.25, 3.5);
        let back = frame.to_local(frame.to_global(p));
        assert_close(back.x, p.x, 1e-12);
        assert_close(back.y, p.y, 1e-12);
    }
}
