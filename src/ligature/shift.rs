//! Best-shift search: slide the right curve along the stride grid and keep
//! the shift whose tangent bridge is the shortest one running forward.

use std::ops::RangeInclusive;

use tracing::{debug, trace};

use super::tangent::{find_lower_tangent, TangentContact};
use crate::anchor::OrientedAnchor;
use crate::error::AlignError;
use crate::spline::AlignedSample;

/// Tolerance, in strides, for a gap to still count as forward.
const GAP_SLACK: f64 = 1e-6;

/// Distance, in strides, under which a point counts as lying on a sample.
const GRID_SNAP: f64 = 1e-6;

/// The winning shift and the connector geometry derived from it.
///
/// Right-curve quantities are in the shifted frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BestShift {
    /// Horizontal shift applied to the right curve, a multiple of the stride.
    pub shift: f64,
    /// Horizontal distance from the left contact to the right contact.
    pub gap: f64,
    pub contact: TangentContact,
    pub left_contact: OrientedAnchor,
    pub right_contact: OrientedAnchor,
    /// Contacts pushed outward by half the gap along their curves.
    pub left_ext: OrientedAnchor,
    pub right_ext: OrientedAnchor,
    /// Left samples kept before the connector starts.
    pub left_keep: usize,
    /// First right sample kept after the connector ends.
    pub right_start: usize,
}

/// Stride multiples that keep at least `min_overlap` strides of overlap
/// between the two curves' x spans. Empty when either sample is.
pub fn shift_range(
    left: &AlignedSample,
    right: &AlignedSample,
    stride: f64,
    min_overlap: usize,
) -> RangeInclusive<i64> {
    let (Some((l_lo, l_hi)), Some((r_lo, r_hi))) = (left.x_range(), right.x_range()) else {
        return 1..=0;
    };
    let overlap = min_overlap as i64;
    let lo = ((l_lo - r_hi) / stride - GAP_SLACK).ceil() as i64 + overlap;
    let hi = ((l_hi - r_lo) / stride + GAP_SLACK).floor() as i64 - overlap;
    lo..=hi
}

/// Search every shift in [`shift_range`] for the best bridge.
pub fn find_best_shift(
    left: &AlignedSample,
    right: &AlignedSample,
    stride: f64,
    min_overlap: usize,
) -> Result<BestShift, AlignError> {
    let steps = shift_range(left, right, stride, min_overlap);
    find_best_shift_in(left, right, stride, steps)
}

/// Search the shifts `k·stride` for `k` in `steps`.
///
/// Shifts without a tangent are skipped, and so are bridges that run
/// backward. Among the rest the smallest gap wins; on ties the first shift
/// tried is kept.
pub fn find_best_shift_in(
    left: &AlignedSample,
    right: &AlignedSample,
    stride: f64,
    steps: RangeInclusive<i64>,
) -> Result<BestShift, AlignError> {
    if left.is_empty() || right.is_empty() || !(stride > 0.0 && stride.is_finite()) {
        return Err(AlignError::TooShort);
    }

    let mut found_tangent = false;
    let mut best: Option<(i64, TangentContact, f64)> = None;
    for k in steps.clone() {
        let shifted = right.shifted(k as f64 * stride, 0.0);
        let Some(contact) = find_lower_tangent(left, &shifted) else {
            trace!("shift {}: no tangent", k);
            continue;
        };
        found_tangent = true;
        let gap = shifted.x[contact.right_index] - left.x[contact.left_index];
        if gap < -GAP_SLACK * stride {
            trace!("shift {}: bridge runs backward by {:.4}", k, -gap);
            continue;
        }
        let gap = gap.max(0.0);
        if best.as_ref().map_or(true, |&(_, _, g)| gap < g) {
            best = Some((k, contact, gap));
        }
    }

    let Some((k, contact, gap)) = best else {
        debug!(
            "no forward bridge for shifts {}..={} (tangent found: {})",
            steps.start(),
            steps.end(),
            found_tangent
        );
        return Err(if found_tangent {
            AlignError::BackwardBridge
        } else {
            AlignError::NoTangent
        });
    };

    let shift = k as f64 * stride;
    let shifted = right.shifted(shift, 0.0);
    let (li, ri) = (contact.left_index, contact.right_index);
    let left_contact = contact_anchor(left, li, contact.slope);
    let right_contact = contact_anchor(&shifted, ri, contact.slope);

    let half = gap / 2.0;
    let left_ext = extend(&left_contact, -half);
    let right_ext = extend(&right_contact, half);

    let left_keep = trim_left(left, left_ext.x, stride);
    let right_start = trim_right(&shifted, right_ext.x, stride);
    debug!(
        "best shift {:.4} (gap {:.4}): {} -> {}",
        shift,
        gap,
        left_ext,
        right_ext
    );

    Ok(BestShift {
        shift,
        gap,
        contact,
        left_contact,
        right_contact,
        left_ext,
        right_ext,
        left_keep,
        right_start,
    })
}

/// Number of leading samples at or before `x`.
///
/// When `x` falls between two grid columns the nearest column may lie past
/// it; the trim then steps back one stride.
pub fn trim_left(sample: &AlignedSample, x: f64, stride: f64) -> usize {
    let Some(&x0) = sample.x.first() else {
        return 0;
    };
    let pos = (x - x0) / stride;
    let mut column = pos.round();
    if column - pos > GRID_SNAP {
        column -= 1.0;
    }
    ((column + 1.0).max(0.0) as usize).min(sample.len())
}

/// Index of the first sample at or after `x`, stepping forward one stride
/// when the nearest column lies before an off-grid `x`.
pub fn trim_right(sample: &AlignedSample, x: f64, stride: f64) -> usize {
    let Some(&x0) = sample.x.first() else {
        return 0;
    };
    let pos = (x - x0) / stride;
    let mut column = pos.round();
    if pos - column > GRID_SNAP {
        column += 1.0;
    }
    (column.max(0.0) as usize).min(sample.len())
}

/// The sample at `i` as an anchor, using `fallback` where the curve is vertical.
fn contact_anchor(sample: &AlignedSample, i: usize, fallback: f64) -> OrientedAnchor {
    let slope = if sample.yp[i].is_finite() {
        sample.yp[i]
    } else {
        fallback
    };
    OrientedAnchor::new(sample.x[i], sample.y[i], slope.atan().to_degrees())
}

/// Move along the anchor's direction by `dx` horizontally.
fn extend(anchor: &OrientedAnchor, dx: f64) -> OrientedAnchor {
    anchor.translate(dx, anchor.slope() * dx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spline::sample_aligned_glyph;

    fn sample(points: &[(f64, f64, f64)], stride: f64) -> AlignedSample {
        let glyph: Vec<OrientedAnchor> = points
            .iter()
            .map(|&(x, y, a)| OrientedAnchor::new(x, y, a))
            .collect();
        sample_aligned_glyph(&glyph, stride)
    }

    #[test]
    fn facing_strokes_meet_without_gap() {
        let left = sample(&[(-1.0, 0.0, 0.0), (0.0, 0.0, 0.0)], 1.0);
        let right = sample(&[(5.0, 0.0, 180.0), (6.0, 0.0, 180.0)], 1.0);
        let best = find_best_shift(&left, &right, 1.0, 1).unwrap();
        assert!((best.shift + 6.0).abs() < 1e-9);
        assert_eq!(best.gap, 0.0);
        assert!((best.right_ext.x - best.left_ext.x).abs() < 1e-9);
        assert!(best.right_ext.x - best.left_ext.x >= -1e-9);
        assert_eq!(best.left_keep, 1);
        assert_eq!(best.right_start, 0);
    }

    #[test]
    fn diverging_strokes_find_no_tangent() {
        let left = sample(&[(0.0, 0.0, 45.0), (10.0, 10.0, 45.0)], 1.0);
        let right = sample(&[(20.0, 10.0, -45.0), (30.0, 0.0, -45.0)], 1.0);
        assert_eq!(shift_range(&left, &right, 1.0, 1), -29..=-11);
        for k in shift_range(&left, &right, 1.0, 1) {
            assert!(find_lower_tangent(&left, &right.shifted(k as f64, 0.0)).is_none());
        }
        assert_eq!(
            find_best_shift(&left, &right, 1.0, 1).unwrap_err(),
            AlignError::NoTangent
        );
    }

    #[test]
    fn backward_bridges_are_rejected() {
        let left = sample(&[(0.0, 10.0, -45.0), (10.0, 0.0, 0.0)], 1.0);
        let right = sample(&[(0.0, 0.0, 0.0), (10.0, 10.0, 45.0)], 1.0);
        assert_eq!(
            find_best_shift(&left, &right, 1.0, 1).unwrap_err(),
            AlignError::BackwardBridge
        );
    }

    #[test]
    fn bridge_runs_forward_and_trims_both_curves() {
        let left = sample(&[(0.0, 10.0, -45.0), (10.0, 0.0, 0.0)], 1.0);
        let right = sample(&[(0.0, 5.0, -45.0), (10.0, 0.0, 0.0), (20.0, 5.0, 45.0)], 1.0);
        let best = find_best_shift(&left, &right, 1.0, 1).unwrap();
        assert!(best.gap >= 0.0);
        assert!(best.right_contact.x >= best.left_contact.x);
        assert!(best.right_ext.x >= best.left_ext.x);
        assert!((best.right_ext.x - best.left_ext.x - 2.0 * best.gap).abs() < 1e-9);
        assert!(best.left_keep <= left.len());
        assert!(best.right_start <= right.len());
        assert_eq!((best.shift / 1.0).fract(), 0.0);
    }

    #[test]
    fn wider_search_never_worsens_the_gap() {
        let left = sample(&[(0.0, 10.0, -45.0), (10.0, 0.0, 0.0)], 1.0);
        let right = sample(&[(0.0, 5.0, -45.0), (10.0, 0.0, 0.0), (20.0, 5.0, 45.0)], 1.0);
        let mut previous = f64::INFINITY;
        for lo in [9, 5, 0, -10, -19] {
            if let Ok(best) = find_best_shift_in(&left, &right, 1.0, lo..=9) {
                assert!(best.gap <= previous);
                previous = best.gap;
            }
        }
        assert!(previous.is_finite());
    }

    #[test]
    fn odd_gap_trims_one_stride_outward() {
        let curve = sample(&[(0.0, 0.0, 0.0), (5.0, 0.0, 0.0)], 0.5);
        assert_eq!(curve.len(), 11);

        // A gap of three strides puts the extended points half a stride off
        // the grid: 2.0 - 0.75 and 3.0 + 0.75.
        assert_eq!(trim_left(&curve, 1.25, 0.5), 3);
        assert_eq!(curve.x[2], 1.0);
        assert_eq!(trim_right(&curve, 3.75, 0.5), 8);
        assert_eq!(curve.x[8], 4.0);

        // On the grid, the sample itself is kept on both sides.
        assert_eq!(trim_left(&curve, 1.5, 0.5), 4);
        assert_eq!(trim_right(&curve, 1.5, 0.5), 3);
        assert_eq!(trim_left(&curve, 1.5 + 1e-9, 0.5), 4);

        // Out of range.
        assert_eq!(trim_left(&curve, -1.0, 0.5), 0);
        assert_eq!(trim_right(&curve, -1.0, 0.5), 0);
        assert_eq!(trim_left(&curve, 9.0, 0.5), 11);
        assert_eq!(trim_right(&curve, 9.0, 0.5), 11);
        assert_eq!(trim_left(&AlignedSample::default(), 1.0, 0.5), 0);
    }

    #[test]
    fn empty_input_is_too_short() {
        let left = sample(&[(0.0, 0.0, 0.0), (3.0, 0.0, 0.0)], 1.0);
        assert_eq!(
            find_best_shift(&left, &AlignedSample::default(), 1.0, 1).unwrap_err(),
            AlignError::TooShort
        );
    }
}
