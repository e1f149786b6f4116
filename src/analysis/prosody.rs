//! Pitch and energy statistics over framed audio.
//!
//! Pitch uses the YIN difference function with the cumulative mean
//! normalized threshold test; unvoiced frames are excluded from the
//! mean, and a clip with no voiced frame reports 0.0.

use serde::{Deserialize, Serialize};

use super::audio::AudioSignal;
use super::audio::normalize::rms;

pub const PITCH_FRAME_SIZE: usize = 2048;
pub const PITCH_HOP_SIZE: usize = 512;
/// Dips in the normalized difference below this count as voiced.
const YIN_THRESHOLD: f64 = 0.14;

/// Clip-level pitch and energy means.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProsodySummary {
    pub pitch_mean: f32,
    pub energy_mean: f32,
}

/// Averages the fundamental frequency of voiced frames and the RMS of
/// every frame.
pub fn summarize(signal: &AudioSignal, pitch_range_hz: (f32, f32)) -> ProsodySummary {
    let (min_hz, max_hz) = pitch_range_hz;
    let samples = &signal.samples;
    let mut pitch_sum = 0.0_f64;
    let mut voiced_frames = 0usize;
    let mut start = 0usize;
    while start + PITCH_FRAME_SIZE <= samples.len() {
        let frame = &samples[start..start + PITCH_FRAME_SIZE];
        if let Some(f0) = yin_pitch(frame, signal.sample_rate, min_hz, max_hz) {
            pitch_sum += f64::from(f0);
            voiced_frames += 1;
        }
        start += PITCH_HOP_SIZE;
    }
    let pitch_mean = if voiced_frames > 0 {
        (pitch_sum / voiced_frames as f64) as f32
    } else {
        0.0
    };
    ProsodySummary {
        pitch_mean,
        energy_mean: mean_frame_rms(samples),
    }
}

/// Mean RMS over the hopped frame grid; partial tail frames count too.
fn mean_frame_rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let mut sum = 0.0_f64;
    let mut frames = 0usize;
    let mut start = 0usize;
    while start < samples.len() {
        let end = (start + PITCH_FRAME_SIZE).min(samples.len());
        sum += f64::from(rms(&samples[start..end]));
        frames += 1;
        start += PITCH_HOP_SIZE;
        if samples.len() <= PITCH_FRAME_SIZE {
            break;
        }
    }
    (sum / frames.max(1) as f64) as f32
}

/// Fundamental frequency of one frame, or `None` when unvoiced.
fn yin_pitch(frame: &[f32], sample_rate: u32, min_hz: f32, max_hz: f32) -> Option<f32> {
    let window = frame.len() / 2;
    if window < 2 || min_hz <= 0.0 || max_hz <= min_hz {
        return None;
    }
    let sr = f64::from(sample_rate.max(1));
    let min_period = ((sr / f64::from(max_hz)).floor() as usize).max(1);
    let max_period = ((sr / f64::from(min_hz)).ceil() as usize).min(window - 1);
    if min_period >= max_period {
        return None;
    }

    let mut difference = vec![0.0_f64; max_period + 1];
    for (tau, slot) in difference.iter_mut().enumerate().skip(1) {
        let mut sum = 0.0_f64;
        for i in 0..window {
            let delta = f64::from(frame[i]) - f64::from(frame[i + tau]);
            sum += delta * delta;
        }
        *slot = sum;
    }

    let mut normalized = vec![1.0_f64; max_period + 1];
    let mut running = 0.0_f64;
    for tau in 1..=max_period {
        running += difference[tau];
        if running > 0.0 {
            normalized[tau] = difference[tau] * tau as f64 / running;
        }
    }

    // First dip under the threshold, then slide down to its local minimum.
    let mut tau = (min_period..=max_period).find(|&t| normalized[t] < YIN_THRESHOLD)?;
    while tau + 1 <= max_period && normalized[tau + 1] < normalized[tau] {
        tau += 1;
    }
    let period = refine_minimum(&normalized, tau);
    Some((sr / period) as f32)
}

/// Parabolic interpolation around a sampled minimum.
fn refine_minimum(values: &[f64], tau: usize) -> f64 {
    if tau == 0 || tau + 1 >= values.len() {
        return tau as f64;
    }
    let left = values[tau - 1];
    let center = values[tau];
    let right = values[tau + 1];
    let denominator = left + right - 2.0 * center;
    if denominator.abs() < 1e-12 {
        return tau as f64;
    }
    let shift = 0.5 * (left - right) / denominator;
    tau as f64 + shift.clamp(-1.0, 1.0)
}
