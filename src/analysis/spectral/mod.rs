//! Frame-based spectral features averaged over a whole clip.

use serde::{Deserialize, Serialize};

use super::audio::AudioSignal;

pub mod chroma;
pub mod mel;
pub mod stft;

pub use chroma::CHROMA_BINS;

pub const STFT_FRAME_SIZE: usize = 2048;
pub const STFT_HOP_SIZE: usize = 512;
pub const MFCC_COUNT: usize = 13;
pub const MEL_BANDS: usize = 40;

/// Clip-level means of the framewise spectral features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpectralSummary {
    pub mfcc_mean: [f32; MFCC_COUNT],
    pub zcr_mean: f32,
    pub chroma_mean: [f32; CHROMA_BINS],
    pub centroid_mean: f32,
    pub flux_mean: f32,
}

/// Runs one STFT pass over the signal and averages MFCC, chroma,
/// centroid, and flux across frames. The zero-crossing rate is averaged
/// over the same frame grid in the time domain.
pub fn summarize(signal: &AudioSignal) -> SpectralSummary {
    let spectrogram = stft::compute_spectrogram(
        &signal.samples,
        signal.sample_rate,
        STFT_FRAME_SIZE,
        STFT_HOP_SIZE,
    );
    let bank = mel::MelBank::new(
        signal.sample_rate,
        STFT_FRAME_SIZE,
        MEL_BANDS,
        MFCC_COUNT,
        0.0,
        signal.sample_rate as f32 * 0.5,
    );

    let frame_count = spectrogram.frames.len() as f64;
    let mut mfcc_sums = [0.0_f64; MFCC_COUNT];
    let mut centroid_sum = 0.0_f64;
    for frame in &spectrogram.frames {
        for (sum, coefficient) in mfcc_sums.iter_mut().zip(bank.mfcc_from_magnitudes(frame)) {
            *sum += f64::from(coefficient);
        }
        centroid_sum += f64::from(spectral_centroid(frame, &spectrogram));
    }
    let mut mfcc_mean = [0.0_f32; MFCC_COUNT];
    for (mean, sum) in mfcc_mean.iter_mut().zip(&mfcc_sums) {
        *mean = (sum / frame_count) as f32;
    }

    SpectralSummary {
        mfcc_mean,
        zcr_mean: mean_zero_crossing_rate(&signal.samples),
        chroma_mean: chroma::chroma_profile(&spectrogram),
        centroid_mean: (centroid_sum / frame_count) as f32,
        flux_mean: mean_spectral_flux(&spectrogram),
    }
}

/// Magnitude-weighted mean frequency of one frame, 0.0 for silence.
fn spectral_centroid(frame: &[f32], spectrogram: &stft::Spectrogram) -> f32 {
    let mut total = 0.0_f64;
    let mut weighted = 0.0_f64;
    for (bin, &magnitude) in frame.iter().enumerate() {
        let magnitude = f64::from(magnitude.max(0.0));
        total += magnitude;
        weighted += magnitude * f64::from(spectrogram.bin_frequency(bin));
    }
    if total <= 0.0 {
        return 0.0;
    }
    (weighted / total) as f32
}

/// Mean Euclidean distance between consecutive magnitude frames.
fn mean_spectral_flux(spectrogram: &stft::Spectrogram) -> f32 {
    if spectrogram.frames.len() < 2 {
        return 0.0;
    }
    let mut sum = 0.0_f64;
    for pair in spectrogram.frames.windows(2) {
        let mut distance = 0.0_f64;
        for (&a, &b) in pair[0].iter().zip(&pair[1]) {
            let diff = f64::from(b) - f64::from(a);
            distance += diff * diff;
        }
        sum += distance.sqrt();
    }
    (sum / (spectrogram.frames.len() - 1) as f64) as f32
}

/// Mean fraction of sign changes per frame, on the STFT frame grid.
fn mean_zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0_f64;
    let mut frames = 0usize;
    let mut start = 0usize;
    while start < samples.len() {
        let end = (start + STFT_FRAME_SIZE).min(samples.len());
        sum += f64::from(frame_zero_crossing_rate(&samples[start..end]));
        frames += 1;
        start += STFT_HOP_SIZE;
        if samples.len() <= STFT_FRAME_SIZE {
            break;
        }
    }
    (sum / frames.max(1) as f64) as f32
}

fn frame_zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let mut crossings = 0u64;
    let mut prev = frame[0];
    for &sample in &frame[1..] {
        let crossed = (prev >= 0.0 && sample < 0.0) || (prev < 0.0 && sample >= 0.0);
        if crossed && (prev != 0.0 || sample != 0.0) {
            crossings += 1;
        }
        prev = sample;
    }
    crossings as f32 / frame.len() as f32
}
