//! Ligature search: join the exit stroke of one letter to the entry stroke
//! of the next.
//!
//! 1. Sample both strokes on a shared stride grid
//! 2. For every shift of the right stroke, look for a lower tangent bridge
//! 3. Keep the shortest forward bridge and chop both strokes at its ends

pub mod align;
pub mod shift;
pub mod tangent;

pub use crate::error::AlignError;
pub use align::{align_facing, align_glyphs, align_tangent, Alignment, Strategy};
pub use shift::{find_best_shift, find_best_shift_in, shift_range, trim_left, trim_right, BestShift};
pub use tangent::{find_lower_tangent, TangentContact};
