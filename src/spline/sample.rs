//! Stride-aligned sampling of fitted segments.
//!
//! Every sampled x is an exact multiple of the stride in the global frame,
//! so two curves sampled with the same stride stay index-comparable after
//! one of them is shifted by a whole number of strides.

use std::collections::btree_map::{BTreeMap, Entry};

use kurbo::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::baseline::{to_baseline, BaselineFrame};
use super::fit::{fit_cubic, Cubic, COINCIDENT_TOLERANCE};
use crate::anchor::{Glyph, OrientedAnchor};

/// Parameter steps per stride when looking for grid crossings.
const OVERSAMPLE: f64 = 10.0;

/// Upper bound on parameter steps for a single call.
const MAX_STEPS: usize = 2_000_000;

/// Upper bound on grid columns for a single call.
const MAX_SAMPLES: usize = 1_000_000;

/// Slack, in strides, when deciding whether a grid line falls in a step.
const GRID_EPS: f64 = 1e-9;

const BISECT_ITERATIONS: usize = 64;

// ── Parametric form ──────────────────────────────────────────────────────

/// A cubic fitted in a baseline frame, expressed in the global frame as
/// `(x(t), y(t))` with `t` the local x coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParametricCubic {
    pub cubic: Cubic,
    pub frame: BaselineFrame,
    cos: f64,
    sin: f64,
}

impl ParametricCubic {
    pub fn new(cubic: Cubic, frame: BaselineFrame) -> Self {
        let theta = frame.dir_deg.to_radians();
        Self {
            cubic,
            frame,
            cos: theta.cos(),
            sin: theta.sin(),
        }
    }

    /// Fit the segment `p0 → p1` and return it with its local x span.
    ///
    /// `None` for coincident anchors.
    pub fn fit(p0: &OrientedAnchor, p1: &OrientedAnchor) -> Option<(Self, f64)> {
        if p0.distance(p1) < COINCIDENT_TOLERANCE {
            return None;
        }
        let (rot_p0, rot_p1, frame) = to_baseline(p0, p1);
        let cubic = fit_cubic(&rot_p0, &rot_p1);
        Some((Self::new(cubic, frame), rot_p1.x))
    }

    pub fn x(&self, t: f64) -> f64 {
        t * self.cos - self.sin * self.cubic.eval(t) + self.frame.origin.x
    }

    pub fn y(&self, t: f64) -> f64 {
        t * self.sin + self.cos * self.cubic.eval(t) + self.frame.origin.y
    }

    pub fn point(&self, t: f64) -> Point {
        Point::new(self.x(t), self.y(t))
    }

    pub fn dx(&self, t: f64) -> f64 {
        self.cos - self.sin * self.cubic.deriv(t)
    }

    pub fn dy(&self, t: f64) -> f64 {
        self.sin + self.cos * self.cubic.deriv(t)
    }

    /// Global `dy/dx` at parameter `t`; infinite where the curve is vertical.
    pub fn slope(&self, t: f64) -> f64 {
        self.dy(t) / self.dx(t)
    }
}

// ── Aligned samples ──────────────────────────────────────────────────────

/// Parallel arrays `(t, x, y, y′)` of a curve sampled on the stride grid.
///
/// `x` is non-decreasing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignedSample {
    pub t: Vec<f64>,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub yp: Vec<f64>,
}

impl AlignedSample {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn push(&mut self, t: f64, x: f64, y: f64, yp: f64) {
        self.t.push(t);
        self.x.push(x);
        self.y.push(y);
        self.yp.push(yp);
    }

    /// First and last x.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        Some((*self.x.first()?, *self.x.last()?))
    }

    /// The sample at `i` as an anchor pointing along the curve's slope.
    pub fn anchor(&self, i: usize) -> Option<OrientedAnchor> {
        Some(OrientedAnchor::new(
            *self.x.get(i)?,
            *self.y.get(i)?,
            self.yp.get(i)?.atan().to_degrees(),
        ))
    }

    /// Copy translated by `(dx, dy)`. Slopes and parameters are unchanged.
    pub fn shifted(&self, dx: f64, dy: f64) -> AlignedSample {
        AlignedSample {
            t: self.t.clone(),
            x: self.x.iter().map(|x| x + dx).collect(),
            y: self.y.iter().map(|y| y + dy).collect(),
            yp: self.yp.clone(),
        }
    }

    /// Append `next`, dropping its leading samples that do not advance past
    /// the current last x by more than `stride / 10`.
    pub fn stitch(&mut self, next: &AlignedSample, stride: f64) {
        let start = match self.x.last() {
            Some(&last) => next
                .x
                .iter()
                .position(|&x| x > last + stride / 10.0)
                .unwrap_or(next.len()),
            None => 0,
        };
        if start > 0 {
            trace!("stitch: dropping {} leading samples", start);
        }
        self.t.extend_from_slice(&next.t[start..]);
        self.x.extend_from_slice(&next.x[start..]);
        self.y.extend_from_slice(&next.y[start..]);
        self.yp.extend_from_slice(&next.yp[start..]);
    }
}

/// Sample `curve` at every grid x `k·stride` reached while `t` runs over
/// `[t_low, t_high]`.
///
/// The range may extend past the segment's own span, which lets the ligature
/// search sample the curve beyond its endpoints. When the curve folds back in
/// x, the first crossing along the direction of increasing x wins.
pub fn sample_parametric_aligned(
    curve: &ParametricCubic,
    t_low: f64,
    t_high: f64,
    stride: f64,
) -> AlignedSample {
    let mut sample = AlignedSample::default();
    if !(stride > 0.0 && stride.is_finite()) || !(t_low.is_finite() && t_high.is_finite()) {
        return sample;
    }
    let (t_low, t_high) = if t_low <= t_high {
        (t_low, t_high)
    } else {
        (t_high, t_low)
    };
    let span = t_high - t_low;
    let steps = ((span / stride) * OVERSAMPLE).ceil().clamp(1.0, MAX_STEPS as f64) as usize;

    let ts: Vec<f64> = (0..=steps)
        .map(|i| t_low + span * i as f64 / steps as f64)
        .collect();
    let xs: Vec<f64> = ts.iter().map(|&t| curve.x(t)).collect();

    let (x_lo, x_hi) = xs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
    let columns = (x_hi - x_lo) / stride;
    if !(columns <= MAX_SAMPLES as f64) {
        warn!(
            "stride {} over an x span of {:.4} needs {:.0} samples, more than {}",
            stride,
            x_hi - x_lo,
            columns,
            MAX_SAMPLES
        );
        return sample;
    }

    let mut order: Vec<usize> = (0..steps).collect();
    if xs[steps] < xs[0] {
        order.reverse();
    }

    // grid index -> parameter
    let mut crossings: BTreeMap<i64, f64> = BTreeMap::new();
    for i in order {
        let (lo, hi) = (xs[i].min(xs[i + 1]), xs[i].max(xs[i + 1]));
        let k_lo = (lo / stride - GRID_EPS).ceil() as i64;
        let k_hi = (hi / stride + GRID_EPS).floor() as i64;
        for k in k_lo..=k_hi {
            if let Entry::Vacant(slot) = crossings.entry(k) {
                let target = k as f64 * stride;
                slot.insert(solve_for_x(curve, target, ts[i], ts[i + 1]));
            }
        }
    }

    for (k, t) in crossings {
        sample.push(t, k as f64 * stride, curve.y(t), curve.slope(t));
    }
    trace!(
        "sampled {} aligned points over t in [{:.4}, {:.4}]",
        sample.len(),
        t_low,
        t_high
    );
    sample
}

/// Bisect for the parameter in `[ta, tb]` where `x(t) == target`.
fn solve_for_x(curve: &ParametricCubic, target: f64, mut ta: f64, mut tb: f64) -> f64 {
    let mut ga = curve.x(ta) - target;
    if ga == 0.0 {
        return ta;
    }
    if curve.x(tb) == target {
        return tb;
    }
    for _ in 0..BISECT_ITERATIONS {
        let tm = 0.5 * (ta + tb);
        let gm = curve.x(tm) - target;
        if gm == 0.0 || (tb - ta).abs() < 1e-13 {
            return tm;
        }
        if (gm < 0.0) == (ga < 0.0) {
            ta = tm;
            ga = gm;
        } else {
            tb = tm;
        }
    }
    0.5 * (ta + tb)
}

/// Aligned samples of the segment `p0 → p1`, in the global frame.
///
/// Coincident anchors produce an empty sample.
pub fn sample_aligned_segment(p0: &OrientedAnchor, p1: &OrientedAnchor, stride: f64) -> AlignedSample {
    match ParametricCubic::fit(p0, p1) {
        Some((curve, length)) => sample_parametric_aligned(&curve, 0.0, length, stride),
        None => {
            debug!("sample_aligned_segment: coincident anchors at {}", p0);
            AlignedSample::default()
        }
    }
}

/// Aligned samples of a whole glyph, segments stitched in drawing order.
pub fn sample_aligned_glyph(glyph: &Glyph, stride: f64) -> AlignedSample {
    sample_aligned_glyph_segments(glyph, stride).0
}

/// Like [`sample_aligned_glyph`], also returning for every sample the index
/// of the glyph segment (`glyph[i] → glyph[i + 1]`) it was taken from.
pub fn sample_aligned_glyph_segments(glyph: &Glyph, stride: f64) -> (AlignedSample, Vec<usize>) {
    let mut sample = AlignedSample::default();
    let mut segments = Vec::new();
    for (i, pair) in glyph.windows(2).enumerate() {
        sample.stitch(&sample_aligned_segment(&pair[0], &pair[1], stride), stride);
        segments.resize(sample.len(), i);
    }
    (sample, segments)
}

/// Plain sampling of `p0 → p1` on the unit grid of its baseline frame,
/// ending exactly at `p1`, mapped back to the global frame.
pub fn sample_cubic_segment(p0: &OrientedAnchor, p1: &OrientedAnchor) -> (Vec<f64>, Vec<f64>) {
    let Some((curve, length)) = ParametricCubic::fit(p0, p1) else {
        return (vec![p0.x], vec![p0.y]);
    };
    let mut local_x: Vec<f64> = (0..=length.floor() as usize).map(|i| i as f64).collect();
    if length.fract() > COINCIDENT_TOLERANCE {
        local_x.push(length);
    }
    let local_y: Vec<f64> = local_x.iter().map(|&x| curve.cubic.eval(x)).collect();
    curve.frame.points_to_global(&local_x, &local_y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "{a} != {b} (tol {tol})");
    }

    fn assert_on_grid(sample: &AlignedSample, stride: f64) {
        for w in sample.x.windows(2) {
            assert!(w[1] > w[0], "x not increasing: {:?}", w);
            assert_close(w[1] - w[0], stride, 1e-9);
        }
        for &x in &sample.x {
            assert_close((x / stride).round() * stride, x, 1e-9);
        }
    }

    #[test]
    fn horizontal_segment_hits_every_grid_column() {
        let sample = sample_aligned_segment(
            &OrientedAnchor::new(0.0, 0.0, 0.0),
            &OrientedAnchor::new(10.0, 0.0, 0.0),
            1.0,
        );
        assert_eq!(sample.x, (0..=10).map(f64::from).collect::<Vec<_>>());
        assert!(sample.y.iter().all(|y| y.abs() < 1e-12));
        assert!(sample.yp.iter().all(|yp| yp.abs() < 1e-12));
    }

    #[test]
    fn samples_snap_to_global_grid() {
        let p0 = OrientedAnchor::new(0.3, 0.0, 20.0);
        let p1 = OrientedAnchor::new(10.7, 2.0, 10.0);
        let sample = sample_aligned_segment(&p0, &p1, 0.5);
        assert_on_grid(&sample, 0.5);
        assert_close(sample.x[0], 0.5, 1e-9);
        assert_close(*sample.x.last().unwrap(), 10.5, 1e-9);
        assert_eq!(sample.len(), 21);
    }

    #[test]
    fn rotated_derivative_uses_chain_rule() {
        let sample = sample_aligned_segment(
            &OrientedAnchor::new(0.0, 0.0, 45.0),
            &OrientedAnchor::new(10.0, 10.0, 45.0),
            1.0,
        );
        assert_eq!(sample.len(), 11);
        for i in 0..sample.len() {
            assert_close(sample.y[i], sample.x[i], 1e-9);
            assert_close(sample.yp[i], 1.0, 1e-9);
        }
    }

    #[test]
    fn working_range_extends_past_endpoints() {
        let (curve, length) = ParametricCubic::fit(
            &OrientedAnchor::new(0.0, 0.0, 45.0),
            &OrientedAnchor::new(10.0, 10.0, 45.0),
        )
        .unwrap();
        let sample = sample_parametric_aligned(&curve, -0.5 * length, 1.5 * length, 1.0);
        assert_on_grid(&sample, 1.0);
        assert_close(sample.x[0], -5.0, 1e-9);
        assert_close(*sample.x.last().unwrap(), 15.0, 1e-9);
    }

    #[test]
    fn leftward_segment_is_sorted_by_x() {
        let sample = sample_aligned_segment(
            &OrientedAnchor::new(10.0, 0.0, 180.0),
            &OrientedAnchor::new(0.0, 0.0, 180.0),
            1.0,
        );
        assert_eq!(sample.len(), 11);
        assert_on_grid(&sample, 1.0);
        assert_close(sample.x[0], 0.0, 1e-9);
        assert_close(sample.x[10], 10.0, 1e-9);
    }

    #[test]
    fn glyph_stitching_drops_shared_boundary() {
        let glyph = vec![
            OrientedAnchor::new(0.0, 0.0, 0.0),
            OrientedAnchor::new(5.0, 0.0, 0.0),
            OrientedAnchor::new(10.0, 0.0, 0.0),
        ];
        let sample = sample_aligned_glyph(&glyph, 1.0);
        assert_eq!(sample.len(), 11);
        assert_on_grid(&sample, 1.0);
    }

    #[test]
    fn samples_remember_their_segment() {
        // The middle segment folds back and is hidden by the first one.
        let glyph = vec![
            OrientedAnchor::new(0.0, 0.0, 0.0),
            OrientedAnchor::new(6.0, 0.0, 0.0),
            OrientedAnchor::new(2.0, 1.0, 0.0),
            OrientedAnchor::new(8.0, 1.0, 0.0),
        ];
        let (sample, segments) = sample_aligned_glyph_segments(&glyph, 1.0);
        assert_eq!(segments.len(), sample.len());
        assert_on_grid(&sample, 1.0);
        assert_eq!(sample.x, (0..=8).map(f64::from).collect::<Vec<_>>());
        assert_eq!(segments, vec![0, 0, 0, 0, 0, 0, 0, 2, 2]);
    }

    #[test]
    fn oversized_grid_is_rejected() {
        let sample = sample_aligned_segment(
            &OrientedAnchor::new(0.0, 0.0, 0.0),
            &OrientedAnchor::new(100.0, 0.0, 0.0),
            1e-7,
        );
        assert!(sample.is_empty());
        let fine = sample_aligned_segment(
            &OrientedAnchor::new(0.0, 0.0, 0.0),
            &OrientedAnchor::new(100.0, 0.0, 0.0),
            1e-3,
        );
        assert_eq!(fine.len(), 100_001);
    }

    #[test]
    fn coincident_segment_is_empty() {
        let p = OrientedAnchor::new(1.0, 1.0, 30.0);
        assert!(sample_aligned_segment(&p, &p, 1.0).is_empty());
        assert_eq!(sample_cubic_segment(&p, &p), (vec![1.0], vec![1.0]));
    }

    #[test]
    fn plain_sampling_ends_on_last_anchor() {
        let (xs, ys) = sample_cubic_segment(
            &OrientedAnchor::new(0.0, 0.0, 0.0),
            &OrientedAnchor::new(3.5, 0.0, 0.0),
        );
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 3.5]);
        assert!(ys.iter().all(|y| y.abs() < 1e-12));
    }
}
