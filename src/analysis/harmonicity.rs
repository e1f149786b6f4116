//! Harmonics-to-noise ratio from normalized cross-correlation.
//!
//! Each frame correlates a window against lagged copies of itself over
//! the candidate pitch period range. The best correlation `r` maps to
//! `10 * log10(r / (1 - r))` dB; frames with no positive correlation
//! take the unvoiced sentinel and still participate in the clip mean.

use super::audio::AudioSignal;

const MIN_PITCH_HZ: f64 = 75.0;
const MAX_PITCH_HZ: f64 = 600.0;
const TIME_STEP_SECONDS: f64 = 0.01;
/// Sentinel for frames without a periodic component.
const UNVOICED_HNR_DB: f64 = -200.0;

/// Mean HNR in dB over all analysis frames, unvoiced frames included.
///
/// Clips too short to fit a single analysis frame report 0.0.
pub fn mean_hnr_db(signal: &AudioSignal) -> f32 {
    let sr = f64::from(signal.sample_rate.max(1));
    let window = (sr / MIN_PITCH_HZ).round() as usize;
    let max_lag = window;
    let min_lag = ((sr / MAX_PITCH_HZ).round() as usize).max(1);
    let frame_len = window + max_lag;
    let hop = ((sr * TIME_STEP_SECONDS).round() as usize).max(1);
    if signal.samples.len() < frame_len || min_lag >= max_lag || window == 0 {
        return 0.0;
    }

    let mut sum = 0.0_f64;
    let mut frames = 0usize;
    let mut start = 0usize;
    while start + frame_len <= signal.samples.len() {
        let frame = &signal.samples[start..start + frame_len];
        sum += frame_hnr_db(frame, window, min_lag, max_lag);
        frames += 1;
        start += hop;
    }
    if frames == 0 {
        return 0.0;
    }
    (sum / frames as f64) as f32
}

fn frame_hnr_db(frame: &[f32], window: usize, min_lag: usize, max_lag: usize) -> f64 {
    let head = &frame[..window];
    let energy_head: f64 = head.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    if energy_head <= 0.0 {
        return UNVOICED_HNR_DB;
    }

    let mut best = 0.0_f64;
    for lag in min_lag..=max_lag {
        let tail = &frame[lag..lag + window];
        let mut cross = 0.0_f64;
        let mut energy_tail = 0.0_f64;
        for (&a, &b) in head.iter().zip(tail) {
            cross += f64::from(a) * f64::from(b);
            energy_tail += f64::from(b) * f64::from(b);
        }
        if energy_tail <= 0.0 {
            continue;
        }
        let r = cross / (energy_head * energy_tail).sqrt();
        best = best.max(r);
    }
    if best <= 0.0 {
        return UNVOICED_HNR_DB;
    }
    let r = best.min(1.0 - 1e-6);
    10.0 * (r / (1.0 - r)).log10()
}
