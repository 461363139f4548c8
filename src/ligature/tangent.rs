//! Lower tangent search between two aligned curves.
//!
//! ## Algorithm
//!
//! 1. **Curvature sign** of the right curve, from the mean change of its
//!    slope between consecutive samples.
//! 2. **Scan order** over right samples: ascending for a non-negative
//!    curvature, descending otherwise.
//! 3. **Acceptance**: the tangent at the first candidate that leaves every
//!    left sample on or above it wins.
//! 4. **Left contact**: the left sample closest to the tangent from above.
//!    Ties go to the sample nearest in x to the right contact.

use tracing::trace;

use crate::spline::AlignedSample;

/// Vertical slack when comparing curves against a tangent line.
pub const TANGENT_TOLERANCE: f64 = 1e-9;

/// A tangent line `y = slope·x + intercept` touching the right curve at
/// `right_index` and passing under the left curve, closest at `left_index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentContact {
    pub left_index: usize,
    pub right_index: usize,
    pub slope: f64,
    pub intercept: f64,
}

impl TangentContact {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Mean change of slope between consecutive samples; near zero counts as zero.
fn curvature_sign(sample: &AlignedSample) -> f64 {
    let diffs: Vec<f64> = sample
        .yp
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| d.is_finite())
        .collect();
    if diffs.is_empty() {
        return 0.0;
    }
    let mean = diffs.iter().sum::<f64>() / diffs.len() as f64;
    if mean.abs() < TANGENT_TOLERANCE {
        0.0
    } else {
        mean
    }
}

/// Find the tangent to `right` that stays under `left`.
///
/// Both samples must share the global frame. `None` when no right sample
/// gives such a tangent, which is a normal outcome for some shifts.
pub fn find_lower_tangent(left: &AlignedSample, right: &AlignedSample) -> Option<TangentContact> {
    if left.is_empty() || right.is_empty() {
        return None;
    }

    let mut order: Vec<usize> = (0..right.len()).collect();
    if curvature_sign(right) < 0.0 {
        order.reverse();
    }

    for r in order {
        let slope = right.yp[r];
        if !slope.is_finite() {
            continue;
        }
        let intercept = right.y[r] - slope * right.x[r];
        let crosses = left
            .x
            .iter()
            .zip(&left.y)
            .any(|(&x, &y)| y < slope * x + intercept - TANGENT_TOLERANCE);
        if crosses {
            continue;
        }

        let gaps: Vec<f64> = left
            .x
            .iter()
            .zip(&left.y)
            .map(|(&x, &y)| y - (slope * x + intercept))
            .collect();
        let min_gap = gaps.iter().copied().fold(f64::INFINITY, f64::min);
        let rx = right.x[r];
        let left_index = gaps
            .iter()
            .enumerate()
            .filter(|(_, &g)| g <= min_gap + TANGENT_TOLERANCE)
            .min_by(|(a, _), (b, _)| {
                let da = (left.x[*a] - rx).abs();
                let db = (left.x[*b] - rx).abs();
                da.total_cmp(&db)
            })
            .map(|(i, _)| i)?;

        trace!(
            "tangent at right[{}] = ({:.4}, {:.4}) touches left[{}]",
            r,
            rx,
            right.y[r],
            left_index
        );
        return Some(TangentContact {
            left_index,
            right_index: r,
            slope,
            intercept,
        });
    }
    None
}
