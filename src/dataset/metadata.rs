//! Corpus scanning and clip-name parsing.
//!
//! Clip names follow `<actor>_<sentence>_<emotion>_<intensity>.wav`,
//! e.g. `1001_IEO_HAP_HI.wav`. A known anomaly in the corpus fuses the
//! sentence and emotion codes into one underscore-less part; those names
//! are recovered by splitting the fused part.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::DatasetError;
use super::csv::write_csv;

/// Columns of the scanned metadata table, in storage order.
pub const METADATA_COLUMNS: [&str; 5] = [
    "actor_id",
    "sentence_id",
    "emotion_id",
    "intensity",
    "file_path",
];

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Failed to read corpus directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Labels parsed from one clip name, plus the clip location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub actor_id: String,
    pub sentence_id: String,
    pub emotion_id: String,
    pub intensity: String,
    pub file_path: PathBuf,
}

fn clip_name_regex() -> &'static Regex {
    static CLIP_NAME: OnceLock<Regex> = OnceLock::new();
    CLIP_NAME.get_or_init(|| {
        Regex::new(r"^(?P<actor>\d{4})_(?P<sentence>[A-Z]{3})_(?P<emotion>[A-Z]{3})_(?P<intensity>[A-Z]{2,3})$")
            .expect("clip name regex must compile")
    })
}

/// Parses the labels out of a clip path, `None` when the name does not
/// follow the corpus convention.
pub fn parse_clip_name(path: &Path) -> Option<MetadataRow> {
    if !is_wav(path) {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (actor_id, sentence_id, emotion_id, intensity) = match clip_name_regex().captures(stem) {
        Some(captures) => (
            captures["actor"].to_string(),
            captures["sentence"].to_string(),
            captures["emotion"].to_string(),
            captures["intensity"].to_string(),
        ),
        None => split_fused_stem(stem)?,
    };
    Some(MetadataRow {
        actor_id,
        sentence_id,
        emotion_id,
        intensity,
        file_path: path.to_path_buf(),
    })
}

/// Recovers names like `1078_TIEDIS_XX` where the separator between the
/// sentence and emotion codes is missing.
fn split_fused_stem(stem: &str) -> Option<(String, String, String, String)> {
    let mut parts = stem.split('_');
    let actor = parts.next()?;
    let fused = parts.next()?;
    let intensity = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if actor.is_empty() || !actor.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let sentence = fused.get(..3)?;
    let emotion = fused.get(3..6)?;
    Some((
        actor.to_string(),
        sentence.to_string(),
        emotion.to_string(),
        intensity.to_string(),
    ))
}

/// Scans a corpus directory for WAV clips and parses their names.
///
/// Entries are visited in name order so repeated scans produce the same
/// table. Clips with unrecognized names are skipped with a warning.
pub fn scan_corpus(corpus_dir: &Path) -> Result<Vec<MetadataRow>, MetadataError> {
    let entries = std::fs::read_dir(corpus_dir).map_err(|source| MetadataError::ReadDir {
        path: corpus_dir.to_path_buf(),
        source,
    })?;
    let mut wav_paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_wav(path))
        .collect();
    wav_paths.sort();

    let mut rows = Vec::with_capacity(wav_paths.len());
    let mut skipped = 0usize;
    for path in wav_paths {
        match parse_clip_name(&path) {
            Some(row) => rows.push(row),
            None => {
                skipped += 1;
                warn!("Skipping clip with unrecognized name: {}", path.display());
            }
        }
    }
    info!(
        "Corpus scan found {} clips ({} skipped)",
        rows.len(),
        skipped
    );
    Ok(rows)
}

/// Writes the scanned rows as the metadata CSV.
pub fn write_metadata_csv(path: &Path, rows: &[MetadataRow]) -> Result<(), DatasetError> {
    let columns: Vec<String> = METADATA_COLUMNS.iter().map(|&c| c.to_string()).collect();
    let records = rows.iter().map(|row| {
        vec![
            row.actor_id.clone(),
            row.sentence_id.clone(),
            row.emotion_id.clone(),
            row.intensity.clone(),
            row.file_path.to_string_lossy().into_owned(),
        ]
    });
    write_csv(path, &columns, records)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}
