//! inkjoin: cursive handwriting geometry.
//!
//! Fits cubic strokes between oriented anchors, thickens them into filled
//! pen strokes, and joins consecutive letters with ligatures so the strokes
//! of a word connect without gaps or crossings.
//!
//! # Example
//!
//! ```no_run
//! use inkjoin::{source, write_word, InkConfig};
//! use std::path::Path;
//!
//! let letters = source::load_letters(Path::new("letters/manifest.json"))?;
//! let inked = write_word(&letters, "minimum", &InkConfig::default())?;
//! for outcome in &inked.outcomes {
//!     println!("{outcome}");
//! }
//! // inked.strokes holds the filled point sets, per glyph and segment
//! # Ok::<(), inkjoin::InkError>(())
//! ```

#![forbid(unsafe_code)]

pub mod anchor;
pub mod config;
pub mod error;
pub mod ligature;
pub mod source;
pub mod spline;
pub mod word;

// Re-export kurbo so downstream users get the same Point/Rect types.
pub use kurbo;

pub use anchor::{Glyph, OrientedAnchor, SplineSequence};
pub use config::InkConfig;
pub use error::{AlignError, InkError};
pub use ligature::{align_glyphs, Alignment, Strategy};
pub use spline::{thicken_spline_sequence, ThickSpline};
pub use word::{thicken_word, Letter, LetterSet, LetterVariant, PairOutcome, WordBuilder, WordResult};

use std::time::Instant;

use serde::Serialize;
use tracing::info;

/// A fully assembled word: its centerline, the join outcome of every letter
/// pair and the thickened strokes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InkedWord {
    pub word: String,
    pub thickness: f64,
    pub outcomes: Vec<PairOutcome>,
    pub centerline: SplineSequence,
    pub strokes: ThickSpline,
}

/// Full pipeline: letters + text → joined, thickened word.
///
/// Pairs that cannot be joined are reported in `outcomes`, not as errors;
/// only opening the ligature store can fail.
pub fn write_word(letters: &LetterSet, word: &str, config: &InkConfig) -> Result<InkedWord, InkError> {
    let t_start = Instant::now();

    // ── Join ──────────────────────────────────────────────
    let mut builder = WordBuilder::new(letters, config.clone())?;
    let built = builder.build(word);

    // ── Thicken ───────────────────────────────────────────
    let strokes = thicken_word(&built, config.thickness);
    let points: usize = strokes
        .iter()
        .flatten()
        .map(|segment| segment.len())
        .sum();
    info!(
        "'{}': {} glyphs, {} stroke points ({}ms)",
        word,
        built.glyphs.len(),
        points,
        t_start.elapsed().as_millis()
    );

    Ok(InkedWord {
        word: word.to_string(),
        thickness: config.thickness,
        outcomes: built.outcomes,
        centerline: built.glyphs,
        strokes,
    })
}
