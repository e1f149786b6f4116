//! Leading/trailing silence removal based on framewise RMS energy.

use super::normalize::rms;

const TRIM_FRAME_SIZE: usize = 2048;
const TRIM_HOP_SIZE: usize = 512;

/// Trims leading and trailing silence relative to the loudest frame.
///
/// A frame is kept when its RMS exceeds `peak * 10^(-threshold_db / 20)`.
/// If no frame clears the threshold the signal is returned unchanged, so
/// silent clips still flow through the rest of the pipeline.
pub fn trim_edges(samples: &[f32], threshold_db: f32) -> &[f32] {
    if samples.is_empty() {
        return samples;
    }
    let frame_count = frame_count(samples.len());
    let mut levels = Vec::with_capacity(frame_count);
    let mut peak = 0.0_f32;
    for frame in 0..frame_count {
        let start = frame * TRIM_HOP_SIZE;
        let end = (start + TRIM_FRAME_SIZE).min(samples.len());
        let level = rms(&samples[start..end]);
        peak = peak.max(level);
        levels.push(level);
    }
    if peak <= 0.0 {
        return samples;
    }
    let threshold = peak * 10.0_f32.powf(-threshold_db / 20.0);
    let first = levels.iter().position(|&l| l > threshold);
    let last = levels.iter().rposition(|&l| l > threshold);
    match (first, last) {
        (Some(first), Some(last)) => {
            let start = first * TRIM_HOP_SIZE;
            let end = ((last + 1) * TRIM_HOP_SIZE).min(samples.len());
            &samples[start..end]
        }
        _ => samples,
    }
}

fn frame_count(len: usize) -> usize {
    if len <= TRIM_FRAME_SIZE {
        1
    } else {
        (len - TRIM_FRAME_SIZE).div_ceil(TRIM_HOP_SIZE) + 1
    }
}
