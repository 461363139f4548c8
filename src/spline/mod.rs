//! Centerline geometry: baseline normalization, cubic fitting, aligned
//! sampling and stroke thickening.
//!
//! 1. Rotate a pair of anchors into their baseline frame
//! 2. Fit the cubic Hermite segment between them
//! 3. Sample it on the global stride grid, or
//! 4. Offset it into a filled pen stroke

pub mod baseline;
pub mod fit;
pub mod sample;
pub mod thick;

pub use baseline::{to_baseline, BaselineFrame};
pub use fit::{fit_cubic, fit_line, Cubic, Line};
pub use sample::{
    sample_aligned_glyph, sample_aligned_glyph_segments, sample_aligned_segment, sample_cubic_segment,
    sample_parametric_aligned, AlignedSample, ParametricCubic,
};
pub use thick::{
    thick_spline_bbox, thicken_glyph, thicken_segment, thicken_spline_sequence,
    translate_thick_spline, ContourCase, ThickGlyph, ThickSegment, ThickSpline,
};
