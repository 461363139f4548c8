//! Word assembly: join each pair of consecutive letters and stitch their
//! glyphs into one spline sequence, carrying the horizontal offset forward.

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::cache::{get_or_compute, JsonDirStore, LigatureInfo, LigatureKey, LigatureStore, MemoryStore};
use super::letter::{ConnectorType, Letter, LetterVariant};
use super::LetterSet;
use crate::anchor::{
    find_align_stride, spline_sequence_bbox, translate_spline_sequence, Glyph, SplineSequence,
};
use crate::config::InkConfig;
use crate::error::{AlignError, InkError};
use crate::ligature::{align_glyphs, Strategy};
use crate::spline::{thicken_spline_sequence, ThickSpline};

/// What happened to one letter pair of a word.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PairOutcome {
    Ligated {
        pair: String,
        strategy: Strategy,
        shift: f64,
        cached: bool,
    },
    /// The letters were placed side by side without a connector.
    Unligated { pair: String, reason: AlignError },
}

impl PairOutcome {
    pub fn pair(&self) -> &str {
        match self {
            PairOutcome::Ligated { pair, .. } | PairOutcome::Unligated { pair, .. } => pair,
        }
    }

    pub fn is_ligated(&self) -> bool {
        matches!(self, PairOutcome::Ligated { .. })
    }
}

impl fmt::Display for PairOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairOutcome::Ligated {
                pair,
                strategy,
                shift,
                cached,
            } => write!(
                f,
                "{pair}: {strategy:?} join, shift {shift:.4}{}",
                if *cached { " (cached)" } else { "" }
            ),
            PairOutcome::Unligated { pair, reason } => write!(f, "{pair}: not joined, {reason}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordResult {
    pub glyphs: SplineSequence,
    pub outcomes: Vec<PairOutcome>,
}

/// Pick the join strategy and the variant of the right letter it needs.
///
/// A low rising exit into a high falling entry is joined along the exit
/// line; every other pair goes through the tangent search, entering the
/// right letter at the height the left one exits.
pub fn select_strategy(left: &Letter, right: &Letter) -> (Strategy, LetterVariant) {
    if left.right_type == ConnectorType::LowUp && right.left_type == ConnectorType::HighDown {
        return (Strategy::Facing, LetterVariant::High);
    }
    let right_variant = if left.right_type.is_high() {
        LetterVariant::High
    } else {
        LetterVariant::Low
    };
    (Strategy::Tangent, right_variant)
}

pub struct WordBuilder<'a> {
    letters: &'a LetterSet,
    config: InkConfig,
    store: Box<dyn LigatureStore + 'a>,
}

impl<'a> WordBuilder<'a> {
    /// Ligatures are kept in `config.cache_dir` when set, in memory otherwise.
    pub fn new(letters: &'a LetterSet, config: InkConfig) -> Result<Self, InkError> {
        let store: Box<dyn LigatureStore> = match &config.cache_dir {
            Some(dir) => Box::new(JsonDirStore::new(dir.clone())?),
            None => Box::new(MemoryStore::new()),
        };
        Ok(Self::with_store(letters, config, store))
    }

    pub fn with_store(
        letters: &'a LetterSet,
        config: InkConfig,
        store: Box<dyn LigatureStore + 'a>,
    ) -> Self {
        Self {
            letters,
            config,
            store,
        }
    }

    pub fn config(&self) -> &InkConfig {
        &self.config
    }

    /// The ligature between two letters, from the store or freshly computed.
    ///
    /// `left_variant` is the drawing of the left letter already placed in
    /// the word: `Alone` at the start, else whatever the previous join chose.
    pub fn ligature(
        &mut self,
        left: &Letter,
        left_variant: LetterVariant,
        right: &Letter,
    ) -> Result<(LigatureInfo, bool), AlignError> {
        let (strategy, right_variant) = select_strategy(left, right);
        let (left_variant, left_source) = left.resolve(left_variant).ok_or(AlignError::TooShort)?;
        let (right_variant, right_source) = right.resolve(right_variant).ok_or(AlignError::TooShort)?;

        let left_glyph: &Glyph = left_source.spline.last().ok_or(AlignError::TooShort)?;
        let right_glyph: &Glyph = right_source.spline.first().ok_or(AlignError::TooShort)?;
        let stride = match self.config.stride {
            Some(stride) => stride,
            None => find_align_stride([left_glyph, right_glyph]).ok_or(AlignError::TooShort)?,
        };
        let min_overlap = self.config.min_overlap_strides;
        let key = LigatureKey {
            left_source_name: left_source.source_name.clone(),
            right_source_name: right_source.source_name.clone(),
            left_variant,
            right_variant,
            left_hash: left.content_hash(left_variant).ok_or(AlignError::TooShort)?,
            right_hash: right.content_hash(right_variant).ok_or(AlignError::TooShort)?,
            strategy,
            stride,
            min_overlap_strides: min_overlap,
        };
        let pair = format!("{}{}", left.name, right.name);
        debug!(
            "pair '{}': {:?} ({} -> {}), stride {}",
            pair, strategy, left_variant, right_variant, stride
        );

        get_or_compute(self.store.as_mut(), &pair, &key, || {
            align_glyphs(strategy, left_glyph, right_glyph, stride, min_overlap)
        })
    }

    /// Assemble `word` letter by letter. Characters without a letter are
    /// skipped; pairs that cannot be joined are reported and placed side by
    /// side.
    pub fn build(&mut self, word: &str) -> WordResult {
        let letters: &'a LetterSet = self.letters;
        let word_letters: Vec<&'a Letter> = word
            .chars()
            .filter_map(|c| match letters.get(&c.to_string()) {
                Some(letter) if letter.spline(LetterVariant::Alone).is_some() => Some(letter),
                _ => {
                    warn!("skipping '{}': no such letter", c);
                    None
                }
            })
            .collect();

        let mut result = WordResult::default();
        let Some(first) = word_letters.first() else {
            return result;
        };
        if let Some(spline) = first.spline(LetterVariant::Alone) {
            result.glyphs.extend(spline.iter().cloned());
        }

        let mut acc_shift = 0.0;
        // drawing of the last letter placed
        let mut placed = LetterVariant::Alone;
        for pair in word_letters.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let name = format!("{}{}", left.name, right.name);
            match self.ligature(left, placed, right) {
                Ok((info, cached)) => {
                    stitch_ligature(&mut result.glyphs, right, &info, acc_shift);
                    acc_shift += info.shift;
                    placed = info.key.right_variant;
                    result.outcomes.push(PairOutcome::Ligated {
                        pair: name,
                        strategy: info.key.strategy,
                        shift: info.shift,
                        cached,
                    });
                }
                Err(reason) => {
                    warn!("pair '{}' not joined: {}", name, reason);
                    acc_shift = place_after(&mut result.glyphs, right);
                    placed = LetterVariant::Alone;
                    result.outcomes.push(PairOutcome::Unligated { pair: name, reason });
                }
            }
        }

        info!(
            "built '{}': {} glyphs, {}/{} pairs joined",
            word,
            result.glyphs.len(),
            result.outcomes.iter().filter(|o| o.is_ligated()).count(),
            result.outcomes.len()
        );
        result
    }
}

/// Replace the last glyph with the left chop, then append the connector,
/// the right chop and the rest of the right letter.
fn stitch_ligature(glyphs: &mut SplineSequence, right: &Letter, info: &LigatureInfo, acc_shift: f64) {
    let right_shift = acc_shift + info.shift;
    let moved = |glyph: &Glyph, dx: f64| -> Glyph { glyph.iter().map(|a| a.translate(dx, 0.0)).collect() };
    glyphs.pop();
    glyphs.push(moved(&info.left_chop_glyph, acc_shift));
    glyphs.extend(translate_spline_sequence(&info.connecting_glyph_sequence, acc_shift, 0.0));
    glyphs.push(moved(&info.right_chop_glyph, right_shift));
    if let Some(spline) = right.spline(info.key.right_variant) {
        let rest: SplineSequence = spline.iter().skip(1).cloned().collect();
        glyphs.extend(translate_spline_sequence(&rest, right_shift, 0.0));
    }
}

/// Append the right letter so that it starts where the word so far ends.
/// Returns the offset applied to it.
fn place_after(glyphs: &mut SplineSequence, right: &Letter) -> f64 {
    let Some(spline) = right.spline(LetterVariant::Alone) else {
        return 0.0;
    };
    let end = spline_sequence_bbox(glyphs).map_or(0.0, |b| b.x1);
    let start = spline_sequence_bbox(spline).map_or(0.0, |b| b.x0);
    let offset = end - start;
    glyphs.extend(translate_spline_sequence(spline, offset, 0.0));
    offset
}

/// Thicken every glyph of an assembled word.
pub fn thicken_word(word: &WordResult, thickness: f64) -> ThickSpline {
    thicken_spline_sequence(&word.glyphs, thickness)
}
