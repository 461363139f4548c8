use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// All word-building parameters in one struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkConfig {
    /// Pen width. Each rail sits `thickness / 2` from the centerline.
    pub thickness: f64,
    /// Sampling stride for the ligature search.
    /// If None, derived per letter pair from the glyphs being joined.
    pub stride: Option<f64>,
    /// Directory of the on-disk ligature store. If None, ligatures are
    /// cached in memory for the lifetime of the builder.
    pub cache_dir: Option<PathBuf>,
    /// Minimal overlap, in strides, kept between the two curves' x spans
    /// while searching for the best shift.
    pub min_overlap_strides: usize,
}

impl Default for InkConfig {
    fn default() -> Self {
        Self {
            thickness: 10.0,
            stride: None,
            cache_dir: None,
            min_overlap_strides: 1,
        }
    }
}
