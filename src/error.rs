use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Errors from loading letters and persisting ligatures.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum InkError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("letter '{letter}' has no '{variant}' variant")]
    MissingVariant { letter: String, variant: String },

    #[error("empty glyph in {0}")]
    EmptyGlyph(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a letter pair could not be joined.
///
/// An expected outcome of the ligature search rather than a fault: the word
/// builder reports it and places the letters side by side.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AlignError {
    #[error("no tangent bridge exists for any shift in range")]
    NoTangent,

    #[error("every tangent bridge runs backward")]
    BackwardBridge,

    #[error("exit line is too flat to reach the next letter")]
    FlatExit,

    #[error("glyph too short to align")]
    TooShort,
}
