//! Words: letters, the ligature store, and the builder that joins them.

pub mod builder;
pub mod cache;
pub mod letter;

use std::collections::BTreeMap;

pub use builder::{select_strategy, thicken_word, PairOutcome, WordBuilder, WordResult};
pub use cache::{get_or_compute, JsonDirStore, LigatureInfo, LigatureKey, LigatureStore, MemoryStore};
pub use letter::{spline_hash, ConnectorType, Letter, LetterVariant, SourcedSpline, EXPECTED_GLYPHS};

/// Letters by name.
pub type LetterSet = BTreeMap<String, Letter>;
