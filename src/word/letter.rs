//! Letters: named spline sequences in up to three height variants, plus the
//! connector types that decide how neighbouring letters are joined.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::anchor::SplineSequence;

/// A letter is expected to carry an entry stroke, a body and an exit stroke.
pub const EXPECTED_GLYPHS: usize = 3;

/// Which drawing of a letter to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterVariant {
    /// The letter on its own, or at the start of a word.
    Alone,
    /// Entered from a high connection.
    High,
    /// Entered from a low connection.
    Low,
}

impl LetterVariant {
    pub const ALL: [LetterVariant; 3] = [LetterVariant::Alone, LetterVariant::High, LetterVariant::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            LetterVariant::Alone => "alone",
            LetterVariant::High => "high",
            LetterVariant::Low => "low",
        }
    }
}

impl fmt::Display for LetterVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Height and concavity of a letter's entry or exit stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    LowUp,
    HighUp,
    HighDown,
}

impl ConnectorType {
    pub fn is_high(self) -> bool {
        matches!(self, ConnectorType::HighUp | ConnectorType::HighDown)
    }
}

/// A spline sequence together with the name of the file it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcedSpline {
    pub source_name: String,
    pub spline: SplineSequence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Letter {
    pub name: String,
    pub left_type: ConnectorType,
    pub right_type: ConnectorType,
    variants: BTreeMap<LetterVariant, SourcedSpline>,
}

impl Letter {
    pub fn new(name: impl Into<String>, left_type: ConnectorType, right_type: ConnectorType) -> Self {
        Self {
            name: name.into(),
            left_type,
            right_type,
            variants: BTreeMap::new(),
        }
    }

    pub fn with_variant(mut self, variant: LetterVariant, source: SourcedSpline) -> Self {
        self.insert_variant(variant, source);
        self
    }

    pub fn insert_variant(&mut self, variant: LetterVariant, source: SourcedSpline) {
        if source.spline.len() < EXPECTED_GLYPHS {
            warn!(
                "letter '{}' ({}) has {} glyphs, expected {}",
                self.name,
                variant,
                source.spline.len(),
                EXPECTED_GLYPHS
            );
        }
        self.variants.insert(variant, source);
    }

    pub fn has_variant(&self, variant: LetterVariant) -> bool {
        self.variants.contains_key(&variant)
    }

    pub fn variants(&self) -> impl Iterator<Item = (LetterVariant, &SourcedSpline)> {
        self.variants.iter().map(|(&v, s)| (v, s))
    }

    /// The requested variant, else `Alone`, else whichever one exists.
    pub fn resolve(&self, requested: LetterVariant) -> Option<(LetterVariant, &SourcedSpline)> {
        self.variants
            .get_key_value(&requested)
            .or_else(|| self.variants.get_key_value(&LetterVariant::Alone))
            .or_else(|| self.variants.iter().next())
            .map(|(&v, s)| (v, s))
    }

    pub fn spline(&self, requested: LetterVariant) -> Option<&SplineSequence> {
        self.resolve(requested).map(|(_, s)| &s.spline)
    }

    /// Structural hash of a variant's anchors, as hex.
    ///
    /// Stable for a given build; used to tell whether a stored ligature was
    /// computed from the same geometry.
    pub fn content_hash(&self, variant: LetterVariant) -> Option<String> {
        let source = self.variants.get(&variant)?;
        Some(spline_hash(&source.spline))
    }
}

impl fmt::Display for Letter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' left {:?} right {:?}",
            self.name, self.left_type, self.right_type
        )?;
        for (variant, source) in &self.variants {
            let points: usize = source.spline.iter().map(Vec::len).sum();
            write!(
                f,
                ", {} {} glyphs / {} points",
                variant,
                source.spline.len(),
                points
            )?;
        }
        Ok(())
    }
}

pub fn spline_hash(spline: &SplineSequence) -> String {
    let mut hasher = DefaultHasher::new();
    spline.len().hash(&mut hasher);
    for glyph in spline {
        glyph.len().hash(&mut hasher);
        for anchor in glyph {
            anchor.x.to_bits().hash(&mut hasher);
            anchor.y.to_bits().hash(&mut hasher);
            anchor.angle_deg().to_bits().hash(&mut hasher);
        }
    }
    format!("{:016x}", hasher.finish())
}
