//! Ligature store.
//!
//! A computed join is saved per letter pair together with the names,
//! variants and content hashes of the two letters it was built from, and the
//! search settings used. A stored record is reused only when all of them
//! match; anything else is a miss.
//! There is no locking: one writer per store directory is assumed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::letter::LetterVariant;
use crate::anchor::{Glyph, SplineSequence};
use crate::error::{AlignError, InkError};
use crate::ligature::{Alignment, Strategy};

/// Identity of the inputs a ligature was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigatureKey {
    pub left_source_name: String,
    pub right_source_name: String,
    pub left_variant: LetterVariant,
    pub right_variant: LetterVariant,
    pub left_hash: String,
    pub right_hash: String,
    pub strategy: Strategy,
    pub stride: f64,
    pub min_overlap_strides: usize,
}

/// A stored ligature: its key, plus the alignment it produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LigatureInfo {
    #[serde(flatten)]
    pub key: LigatureKey,
    pub shift: f64,
    pub left_chop_glyph: Glyph,
    pub right_chop_glyph: Glyph,
    pub connecting_glyph_sequence: SplineSequence,
}

impl LigatureInfo {
    pub fn new(key: LigatureKey, alignment: Alignment) -> Self {
        Self {
            key,
            shift: alignment.shift,
            left_chop_glyph: alignment.left_chop,
            right_chop_glyph: alignment.right_chop,
            connecting_glyph_sequence: alignment.connector,
        }
    }
}

pub trait LigatureStore {
    /// The record stored for `pair`, if any. Unreadable records are misses.
    fn load(&self, pair: &str) -> Option<LigatureInfo>;

    fn save(&mut self, pair: &str, info: &LigatureInfo) -> Result<(), InkError>;
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, LigatureInfo>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LigatureStore for MemoryStore {
    fn load(&self, pair: &str) -> Option<LigatureInfo> {
        self.entries.get(pair).cloned()
    }

    fn save(&mut self, pair: &str, info: &LigatureInfo) -> Result<(), InkError> {
        self.entries.insert(pair.to_string(), info.clone());
        Ok(())
    }
}

/// One pretty-printed JSON file per letter pair, named `{pair}.json`.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    /// Open a store in `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, InkError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| InkError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, pair: &str) -> PathBuf {
        self.dir.join(format!("{pair}.json"))
    }
}

impl LigatureStore for JsonDirStore {
    fn load(&self, pair: &str) -> Option<LigatureInfo> {
        let path = self.path_for(pair);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                debug!("no stored ligature at {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("ignoring unreadable ligature {}: {}", path.display(), e);
                None
            }
        }
    }

    fn save(&mut self, pair: &str, info: &LigatureInfo) -> Result<(), InkError> {
        let path = self.path_for(pair);
        let json = serde_json::to_string_pretty(info)?;
        fs::write(&path, json).map_err(|source| InkError::Io { path, source })
    }
}

/// Return the stored ligature for `pair` when its key matches, else compute,
/// store and return a fresh one. The flag tells whether the record was reused.
///
/// A failed save is logged and does not fail the call.
pub fn get_or_compute<S, F>(
    store: &mut S,
    pair: &str,
    key: &LigatureKey,
    compute: F,
) -> Result<(LigatureInfo, bool), AlignError>
where
    S: LigatureStore + ?Sized,
    F: FnOnce() -> Result<Alignment, AlignError>,
{
    if let Some(info) = store.load(pair) {
        if info.key == *key {
            debug!("ligature '{}' reused", pair);
            return Ok((info, true));
        }
        debug!("ligature '{}' is stale, recomputing", pair);
    }

    let info = LigatureInfo::new(key.clone(), compute()?);
    if let Err(e) = store.save(pair, &info) {
        warn!("could not store ligature '{}': {}", pair, e);
    }
    Ok((info, false))
}
