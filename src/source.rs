//! Loading letters from disk.
//!
//! Three formats, from the bottom up:
//!
//! - glyph table: one anchor per line, `x<TAB>y<TAB>angle_deg`; blank lines
//!   and `#` comments are skipped.
//! - spline index: one glyph per line, `glyph_file offset_x offset_y`,
//!   separated by whitespace or commas. Paths are relative to the index file
//!   and the offset is added to every anchor of that glyph.
//! - letter manifest: a JSON array of
//!   `{letter, left_type, right_type, variants: {alone|high|low: index}}`
//!   with index paths relative to the manifest.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::anchor::{Glyph, OrientedAnchor, SplineSequence};
use crate::error::InkError;
use crate::word::{ConnectorType, Letter, LetterSet, LetterVariant, SourcedSpline};

fn read(path: &Path) -> Result<String, InkError> {
    fs::read_to_string(path).map_err(|source| InkError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Non-empty, non-comment lines with their 1-based line numbers.
fn content_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn parse_field(path: &Path, line: usize, name: &str, field: Option<&str>) -> Result<f64, InkError> {
    let parse_error = |message: String| InkError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };
    let field = field.ok_or_else(|| parse_error(format!("missing {name}")))?;
    let value: f64 = field
        .trim()
        .parse()
        .map_err(|_| parse_error(format!("invalid {name} '{field}'")))?;
    if !value.is_finite() {
        return Err(parse_error(format!("non-finite {name} '{field}'")));
    }
    Ok(value)
}

/// Parse a glyph table. `path` is only used in error messages.
pub fn parse_glyph(text: &str, path: &Path) -> Result<Glyph, InkError> {
    content_lines(text)
        .map(|(line, row)| {
            let mut fields = row.split('\t');
            let x = parse_field(path, line, "x", fields.next())?;
            let y = parse_field(path, line, "y", fields.next())?;
            let angle = parse_field(path, line, "angle", fields.next())?;
            Ok(OrientedAnchor::new(x, y, angle))
        })
        .collect()
}

pub fn load_glyph(path: &Path) -> Result<Glyph, InkError> {
    parse_glyph(&read(path)?, path)
}

/// One line of a spline index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub glyph_file: PathBuf,
    pub offset_x: f64,
    pub offset_y: f64,
}

pub fn parse_index(text: &str, path: &Path) -> Result<Vec<IndexEntry>, InkError> {
    content_lines(text)
        .map(|(line, row)| {
            let mut fields = row
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty());
            let glyph_file = fields.next().ok_or_else(|| InkError::Parse {
                path: path.to_path_buf(),
                line,
                message: "missing glyph file".into(),
            })?;
            Ok(IndexEntry {
                glyph_file: PathBuf::from(glyph_file),
                offset_x: parse_field(path, line, "offset_x", fields.next())?,
                offset_y: parse_field(path, line, "offset_y", fields.next())?,
            })
        })
        .collect()
}

/// Load every glyph listed in a spline index, offsets applied.
pub fn load_spline(index_path: &Path) -> Result<SplineSequence, InkError> {
    let base = index_path.parent().unwrap_or_else(|| Path::new(""));
    let entries = parse_index(&read(index_path)?, index_path)?;
    let mut spline = Vec::with_capacity(entries.len());
    for entry in entries {
        let glyph_path = base.join(&entry.glyph_file);
        let glyph = load_glyph(&glyph_path)?;
        if glyph.is_empty() {
            return Err(InkError::EmptyGlyph(glyph_path.display().to_string()));
        }
        spline.push(
            glyph
                .iter()
                .map(|a| a.translate(entry.offset_x, entry.offset_y))
                .collect(),
        );
    }
    debug!("loaded {} glyphs from {}", spline.len(), index_path.display());
    Ok(spline)
}

/// A spline index loaded with its file name as the source name.
pub fn load_sourced(index_path: &Path) -> Result<SourcedSpline, InkError> {
    let source_name = index_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| index_path.display().to_string());
    Ok(SourcedSpline {
        source_name,
        spline: load_spline(index_path)?,
    })
}

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    letter: String,
    left_type: ConnectorType,
    right_type: ConnectorType,
    variants: BTreeMap<LetterVariant, PathBuf>,
}

/// Load all letters named in a JSON manifest.
pub fn load_letters(manifest_path: &Path) -> Result<LetterSet, InkError> {
    let base = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    let entries: Vec<ManifestEntry> = serde_json::from_str(&read(manifest_path)?)?;

    let mut letters = LetterSet::new();
    for entry in entries {
        if entry.variants.is_empty() {
            return Err(InkError::MissingVariant {
                letter: entry.letter,
                variant: LetterVariant::Alone.to_string(),
            });
        }
        let mut letter = Letter::new(entry.letter.clone(), entry.left_type, entry.right_type);
        for (variant, index) in &entry.variants {
            letter.insert_variant(*variant, load_sourced(&base.join(index))?);
        }
        debug!("letter {}", letter);
        letters.insert(entry.letter, letter);
    }
    info!("loaded {} letters from {}", letters.len(), manifest_path.display());
    Ok(letters)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn glyph_table_skips_comments() {
        let glyph = parse_glyph("# x y angle\n0\t0\t30\n\n5.5\t-1\t-45\n", Path::new("g.txt")).unwrap();
        assert_eq!(glyph.len(), 2);
        assert_eq!((glyph[1].x, glyph[1].y), (5.5, -1.0));
        assert_eq!(glyph[1].angle_deg(), -45.0);
    }

    #[test]
    fn bad_rows_report_their_line() {
        let err = parse_glyph("0\t0\t0\n1\toops\t0\n", Path::new("g.txt")).unwrap_err();
        match err {
            InkError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("oops"));
            }
            other => panic!("unexpected error {other}"),
        }
        assert!(matches!(
            parse_glyph("1\t2\n", Path::new("g.txt")),
            Err(InkError::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn index_accepts_commas_and_spaces() {
        let entries = parse_index("a.txt, 1.5, -2\nb.txt 0 0\n", Path::new("i.txt")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].glyph_file, PathBuf::from("a.txt"));
        assert_eq!((entries[0].offset_x, entries[0].offset_y), (1.5, -2.0));
    }

    #[test]
    fn spline_applies_offsets() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "stroke.txt", "0\t0\t0\n10\t0\t0\n");
        let index = write(dir.path(), "i_alone.idx", "stroke.txt 0 0\nstroke.txt 10 5\n");
        let sourced = load_sourced(&index).unwrap();
        assert_eq!(sourced.source_name, "i_alone.idx");
        assert_eq!(sourced.spline.len(), 2);
        assert_eq!((sourced.spline[1][0].x, sourced.spline[1][0].y), (10.0, 5.0));
        assert_eq!(sourced.spline[1][1].x, 20.0);
    }

    #[test]
    fn empty_glyph_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "empty.txt", "# nothing\n");
        let index = write(dir.path(), "e.idx", "empty.txt 0 0\n");
        assert!(matches!(load_spline(&index), Err(InkError::EmptyGlyph(_))));
        assert!(matches!(
            load_spline(&dir.path().join("missing.idx")),
            Err(InkError::Io { .. })
        ));
    }

    #[test]
    fn manifest_builds_letters() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "s.txt", "0\t0\t0\n10\t0\t0\n");
        write(dir.path(), "i.idx", "s.txt 0 0\ns.txt 10 0\ns.txt 20 0\n");
        write(dir.path(), "i_high.idx", "s.txt 0 5\ns.txt 10 5\ns.txt 20 5\n");
        let manifest = write(
            dir.path(),
            "letters.json",
            r#"[{"letter": "i", "left_type": "low_up", "right_type": "high_down",
                 "variants": {"alone": "i.idx", "high": "i_high.idx"}}]"#,
        );
        let letters = load_letters(&manifest).unwrap();
        let i = &letters["i"];
        assert_eq!(i.right_type, ConnectorType::HighDown);
        assert!(i.has_variant(LetterVariant::High));
        assert!(!i.has_variant(LetterVariant::Low));
        assert_eq!(i.spline(LetterVariant::High).unwrap()[0][0].y, 5.0);
    }
}
