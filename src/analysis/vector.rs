//! Fixed-order flattening of the per-clip summaries into one row.

use serde::{Deserialize, Serialize};

use super::formant::MEAN_FORMANT_COUNT;
use super::prosody::ProsodySummary;
use super::spectral::SpectralSummary;

/// Column names of the exported feature table, in storage order.
pub const FEATURE_COLUMNS: &[&str] = &[
    "mfcc_1",
    "mfcc_2",
    "mfcc_3",
    "mfcc_4",
    "mfcc_5",
    "mfcc_6",
    "mfcc_7",
    "mfcc_8",
    "mfcc_9",
    "mfcc_10",
    "mfcc_11",
    "mfcc_12",
    "mfcc_13",
    "zcr",
    "pitch",
    "energy",
    "chroma_1",
    "chroma_2",
    "chroma_3",
    "chroma_4",
    "chroma_5",
    "chroma_6",
    "chroma_7",
    "chroma_8",
    "chroma_9",
    "chroma_10",
    "chroma_11",
    "chroma_12",
    "spec_centroid",
    "flux",
    "hnr",
    "f1",
    "f2",
    "f3",
];

/// Number of `f32` values in one feature row.
pub const FEATURE_LEN: usize = FEATURE_COLUMNS.len();

/// One clip's features, ordered to match [`FEATURE_COLUMNS`].
///
/// Undefined measurements (formants of an unvoiced clip) stay NaN and
/// are serialized as empty cells by the dataset layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Looks a value up by its column name.
    pub fn get(&self, column: &str) -> Option<f32> {
        FEATURE_COLUMNS
            .iter()
            .position(|&name| name == column)
            .map(|index| self.values[index])
    }
}

/// Flattens the summaries into column order.
pub fn assemble(
    spectral: &SpectralSummary,
    prosody: &ProsodySummary,
    hnr_db: f32,
    formants: &[f64; MEAN_FORMANT_COUNT],
) -> FeatureVector {
    let mut values = Vec::with_capacity(FEATURE_LEN);
    values.extend_from_slice(&spectral.mfcc_mean);
    values.push(spectral.zcr_mean);
    values.push(prosody.pitch_mean);
    values.push(prosody.energy_mean);
    values.extend_from_slice(&spectral.chroma_mean);
    values.push(spectral.centroid_mean);
    values.push(spectral.flux_mean);
    values.push(hnr_db);
    for &formant in formants {
        values.push(formant as f32);
    }
    debug_assert_eq!(values.len(), FEATURE_LEN);
    FeatureVector { values }
}
