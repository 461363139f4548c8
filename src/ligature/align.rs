//! Joining the terminal glyph of one letter to the initial glyph of the next.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::shift::find_best_shift;
use crate::anchor::{Glyph, OrientedAnchor, SplineSequence};
use crate::error::AlignError;
use crate::spline::fit::COINCIDENT_TOLERANCE;
use crate::spline::sample_aligned_glyph_segments;

/// Exit lines flatter than this cannot reach a letter at another height.
const FLAT_EXIT_SLOPE: f64 = 1e-6;

/// How a letter pair is joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Search the best tangent bridge and chop both glyphs at its ends.
    Tangent,
    /// The strokes already face each other: only a shift is computed and a
    /// straight connector is drawn along the exit line.
    Facing,
}

/// Result of aligning two glyphs.
///
/// `left_chop` and `connector` are in the left letter's frame; `right_chop`
/// is in the right letter's own frame and must be moved by `shift`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub strategy: Strategy,
    pub shift: f64,
    pub left_chop: Glyph,
    pub right_chop: Glyph,
    pub connector: SplineSequence,
}

pub fn align_glyphs(
    strategy: Strategy,
    left: &Glyph,
    right: &Glyph,
    stride: f64,
    min_overlap: usize,
) -> Result<Alignment, AlignError> {
    match strategy {
        Strategy::Tangent => align_tangent(left, right, stride, min_overlap),
        Strategy::Facing => align_facing(left, right, stride),
    }
}

/// Join through the best tangent bridge between the two glyphs.
pub fn align_tangent(
    left: &Glyph,
    right: &Glyph,
    stride: f64,
    min_overlap: usize,
) -> Result<Alignment, AlignError> {
    if left.len() < 2 || right.len() < 2 {
        return Err(AlignError::TooShort);
    }
    let (left_sample, left_segments) = sample_aligned_glyph_segments(left, stride);
    let (right_sample, right_segments) = sample_aligned_glyph_segments(right, stride);
    let best = find_best_shift(&left_sample, &right_sample, stride, min_overlap)?;

    let right_ext = best.right_ext.translate(-best.shift, 0.0);
    Ok(Alignment {
        strategy: Strategy::Tangent,
        shift: best.shift,
        left_chop: chop_left(left, &left_segments, best.left_keep, &best.left_ext),
        right_chop: chop_right(right, &right_segments, best.right_start, &right_ext),
        connector: vec![vec![best.left_ext, best.right_ext]],
    })
}

/// The anchors up to the segment holding the last of the `keep` leading
/// samples, then `ext`.
fn chop_left(glyph: &Glyph, segments: &[usize], keep: usize, ext: &OrientedAnchor) -> Glyph {
    let mut chop: Glyph = match keep.checked_sub(1).and_then(|i| segments.get(i)) {
        Some(&segment) => glyph[..=segment].to_vec(),
        None => Vec::new(),
    };
    if chop.last().is_some_and(|a| a.distance(ext) < COINCIDENT_TOLERANCE) {
        chop.pop();
    }
    chop.push(*ext);
    chop
}

/// `ext`, then the anchors after the segment holding sample `start`.
fn chop_right(glyph: &Glyph, segments: &[usize], start: usize, ext: &OrientedAnchor) -> Glyph {
    let rest: &[OrientedAnchor] = match segments.get(start) {
        Some(&segment) => &glyph[segment + 1..],
        None => &[],
    };
    std::iter::once(*ext)
        .chain(
            rest.iter()
                .skip_while(|a| a.distance(ext) < COINCIDENT_TOLERANCE)
                .copied(),
        )
        .collect()
}

/// Place the right glyph so that its entry anchor lies on the exit line of
/// the left glyph, snapped to the stride grid.
pub fn align_facing(left: &Glyph, right: &Glyph, stride: f64) -> Result<Alignment, AlignError> {
    let (Some(exit), Some(entry)) = (left.last(), right.first()) else {
        return Err(AlignError::TooShort);
    };
    if !(stride > 0.0 && stride.is_finite()) {
        return Err(AlignError::TooShort);
    }
    let slope = exit.slope();
    if !slope.is_finite() || slope.abs() < FLAT_EXIT_SLOPE {
        return Err(AlignError::FlatExit);
    }

    let target_x = exit.x + (entry.y - exit.y) / slope;
    let shift = ((target_x - entry.x) / stride).round() * stride;
    let placed = entry.translate(shift, 0.0);
    if placed.x < exit.x {
        debug!("facing join would start at {:.4}, before the exit at {:.4}", placed.x, exit.x);
        return Err(AlignError::BackwardBridge);
    }

    Ok(Alignment {
        strategy: Strategy::Facing,
        shift,
        left_chop: left.clone(),
        right_chop: right.clone(),
        connector: vec![vec![*exit, placed]],
    })
}
