//! Per-clip feature extraction (decoding, conditioning, summaries).

use std::path::Path;

use serde::{Deserialize, Serialize};

pub mod audio;
pub mod formant;
pub mod harmonicity;
pub mod prosody;
pub mod spectral;
pub mod vector;

pub use audio::{DEFAULT_SAMPLE_RATE, DEFAULT_SILENCE_THRESHOLD_DB, DecodedSignal};
pub use vector::{FEATURE_COLUMNS, FEATURE_LEN, FeatureVector};

/// Pitch search range in Hz, C2 to C7.
pub const DEFAULT_PITCH_RANGE_HZ: (f32, f32) = (65.41, 2_093.0);

/// Conditioning stage the voice-quality measures (HNR, formants) run on.
///
/// Spectral and prosodic features always use the prepared signal;
/// trimming and normalization would shift formant timing and HNR frame
/// coverage, so those default to the clip as recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormantSource {
    #[default]
    Untrimmed,
    Prepared,
}

/// Tunable knobs of the extraction pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub sample_rate: u32,
    pub silence_threshold_db: f32,
    pub pitch_range_hz: (f32, f32),
    pub formant_sample_count: usize,
    pub formant_source: FormantSource,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            silence_threshold_db: DEFAULT_SILENCE_THRESHOLD_DB,
            pitch_range_hz: DEFAULT_PITCH_RANGE_HZ,
            formant_sample_count: formant::DEFAULT_FORMANT_SAMPLE_COUNT,
            formant_source: FormantSource::default(),
        }
    }
}

/// Decodes a clip and extracts its feature vector.
pub fn extract_feature_vector(
    path: &Path,
    config: &ExtractionConfig,
) -> Result<FeatureVector, String> {
    let decoded = audio::load_signal(path, config.sample_rate, config.silence_threshold_db)?;
    Ok(extract_from_signal(&decoded, config))
}

/// Extracts the feature vector from an already decoded clip.
pub fn extract_from_signal(decoded: &DecodedSignal, config: &ExtractionConfig) -> FeatureVector {
    let spectral = spectral::summarize(&decoded.prepared);
    let prosody = prosody::summarize(&decoded.prepared, config.pitch_range_hz);
    let voice_source = match config.formant_source {
        FormantSource::Untrimmed => &decoded.untrimmed,
        FormantSource::Prepared => &decoded.prepared,
    };
    let hnr_db = harmonicity::mean_hnr_db(voice_source);
    let formants = formant::mean_formants(voice_source, config.formant_sample_count);
    vector::assemble(&spectral, &prosody, hnr_db, &formants)
}
