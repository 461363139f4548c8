//! Cubic Hermite fitting between two oriented anchors, plus the straight
//! lines used for stroke end caps.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::anchor::OrientedAnchor;

/// Below this distance two anchors are treated as the same point.
pub const COINCIDENT_TOLERANCE: f64 = 1e-9;

/// Coefficients of `y = a·x³ + b·x² + c·x + d`.
///
/// Only meaningful in the frame of the anchors that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cubic {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Cubic {
    /// Returned for coincident anchors instead of solving a singular system.
    pub const FALLBACK: Cubic = Cubic {
        a: 0.0,
        b: 0.0,
        c: 1.0,
        d: 0.0,
    };

    pub fn coeffs(&self) -> [f64; 4] {
        [self.a, self.b, self.c, self.d]
    }

    pub fn eval(&self, x: f64) -> f64 {
        ((self.a * x + self.b) * x + self.c) * x + self.d
    }

    pub fn deriv(&self, x: f64) -> f64 {
        (3.0 * self.a * x + 2.0 * self.b) * x + self.c
    }
}

/// A straight line through two points.
///
/// Vertical lines are kept apart because `y(x)` is undefined for them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Line {
    Sloped { slope: f64, intercept: f64 },
    Vertical { x: f64 },
}

impl Line {
    /// `y` at `x`; `None` for a vertical line.
    pub fn eval(&self, x: f64) -> Option<f64> {
        match *self {
            Line::Sloped { slope, intercept } => Some(slope * x + intercept),
            Line::Vertical { .. } => None,
        }
    }

    /// Leading coefficient; `+∞` for a vertical line.
    pub fn slope(&self) -> f64 {
        match *self {
            Line::Sloped { slope, .. } => slope,
            Line::Vertical { .. } => f64::INFINITY,
        }
    }

    /// Intersection point of two lines, `None` when parallel.
    pub fn intersect(&self, other: &Line) -> Option<(f64, f64)> {
        match (*self, *other) {
            (
                Line::Sloped {
                    slope: m1,
                    intercept: q1,
                },
                Line::Sloped {
                    slope: m2,
                    intercept: q2,
                },
            ) => {
                if (m1 - m2).abs() < f64::EPSILON {
                    return None;
                }
                let x = (q2 - q1) / (m1 - m2);
                Some((x, m1 * x + q1))
            }
            (Line::Vertical { x }, sloped @ Line::Sloped { .. })
            | (sloped @ Line::Sloped { .. }, Line::Vertical { x }) => {
                sloped.eval(x).map(|y| (x, y))
            }
            (Line::Vertical { .. }, Line::Vertical { .. }) => None,
        }
    }
}

/// Fit the cubic through `p0` and `p1` whose derivative at each end equals
/// the anchor's slope.
///
/// The four Hermite conditions are solved in closed form. Anchors that share
/// the same x cannot be expressed as `y(x)`; coincident anchors fall back to
/// [`Cubic::FALLBACK`], and so do distinct anchors stacked vertically, which
/// callers avoid by fitting in the baseline frame.
pub fn fit_cubic(p0: &OrientedAnchor, p1: &OrientedAnchor) -> Cubic {
    let h = p1.x - p0.x;
    if h.abs() < COINCIDENT_TOLERANCE {
        trace!("fit_cubic: degenerate x span between {} and {}", p0, p1);
        return Cubic::FALLBACK;
    }

    let (x0, y0, m0) = (p0.x, p0.y, p0.slope());
    let (y1, m1) = (p1.y, p1.slope());
    let dy = y1 - y0;

    // In u = x - x0: y = y0 + m0·u + B·u² + A·u³
    let big_a = (m0 + m1) / (h * h) - 2.0 * dy / (h * h * h);
    let big_b = 3.0 * dy / (h * h) - (2.0 * m0 + m1) / h;

    // Expand back to powers of x.
    let cubic = Cubic {
        a: big_a,
        b: big_b - 3.0 * big_a * x0,
        c: 3.0 * big_a * x0 * x0 - 2.0 * big_b * x0 + m0,
        d: -big_a * x0 * x0 * x0 + big_b * x0 * x0 - m0 * x0 + y0,
    };
    trace!(
        "y = {:.4}*x^3 + {:.4}*x^2 + {:.4}*x + {:.4}",
        cubic.a,
        cubic.b,
        cubic.c,
        cubic.d
    );
    cubic
}

/// Line through two points.
pub fn fit_line(p0: &OrientedAnchor, p1: &OrientedAnchor) -> Line {
    let dx = p1.x - p0.x;
    if dx.abs() < COINCIDENT_TOLERANCE {
        return Line::Vertical {
            x: (p0.x + p1.x) / 2.0,
        };
    }
    let slope = (p1.y - p0.y) / dx;
    Line::Sloped {
        slope,
        intercept: p0.y - slope * p0.x,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} != {b} (tol {tol})");
    }

    #[test]
    fn hermite_conditions_hold_at_both_ends() {
        let cases = [
            (OrientedAnchor::new(0.0, 0.0, -30.0), OrientedAnchor::new(22.36, 0.0, 43.4)),
            (OrientedAnchor::new(0.0, 0.0, 10.0), OrientedAnchor::new(5.0, 0.0, -10.0)),
            (OrientedAnchor::new(-3.0, 1.5, 20.0), OrientedAnchor::new(4.0, -2.0, 60.0)),
            (OrientedAnchor::new(100.0, 50.0, 0.0), OrientedAnchor::new(300.0, 80.0, -45.0)),
        ];
        for (p0, p1) in cases {
            let cubic = fit_cubic(&p0, &p1);
            let scale = 1.0 + p0.x.abs().max(p1.x.abs()).powi(3) * 1e-12;
            assert_close(cubic.eval(p0.x), p0.y, 1e-9 * scale);
            assert_close(cubic.eval(p1.x), p1.y, 1e-9 * scale);
            assert_close(cubic.deriv(p0.x), p0.slope(), 1e-9 * scale);
            assert_close(cubic.deriv(p1.x), p1.slope(), 1e-9 * scale);
        }
    }

    #[test]
    fn coincident_anchors_fall_back() {
        let p = OrientedAnchor::new(3.0, 4.0, 25.0);
        assert_eq!(fit_cubic(&p, &p), Cubic::FALLBACK);
        assert_eq!(Cubic::FALLBACK.coeffs(), [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn flat_anchors_give_flat_cubic() {
        let cubic = fit_cubic(
            &OrientedAnchor::new(0.0, 2.0, 0.0),
            &OrientedAnchor::new(10.0, 2.0, 0.0),
        );
        for x in [0.0, 2.5, 7.0, 10.0] {
            assert_close(cubic.eval(x), 2.0, 1e-12);
        }
    }

    #[test]
    fn lines_intersect() {
        let l1 = fit_line(&OrientedAnchor::new(0.0, 0.0, 0.0), &OrientedAnchor::new(2.0, 2.0, 0.0));
        let l2 = fit_line(&OrientedAnchor::new(0.0, 4.0, 0.0), &OrientedAnchor::new(4.0, 0.0, 0.0));
        let (x, y) = l1.intersect(&l2).unwrap();
        assert_close(x, 2.0, 1e-12);
        assert_close(y, 2.0, 1e-12);

        let vertical = fit_line(&OrientedAnchor::new(1.0, -1.0, 0.0), &OrientedAnchor::new(1.0, 3.0, 0.0));
        assert_eq!(vertical, Line::Vertical { x: 1.0 });
        assert_eq!(vertical.eval(1.0), None);
        let (x, y) = vertical.intersect(&l1).unwrap();
        assert_close(x, 1.0, 1e-12);
        assert_close(y, 1.0, 1e-12);
        assert!(l1.intersect(&l1).is_none());
    }
}
