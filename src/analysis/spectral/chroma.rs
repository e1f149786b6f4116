//! Pitch-class energy profile folded from magnitude frames.

use super::stft::Spectrogram;

pub const CHROMA_BINS: usize = 12;

/// Lowest frequency folded into the chroma profile; bins below this are
/// dominated by DC leakage.
const MIN_CHROMA_HZ: f32 = 16.0;

/// Mean chroma profile over all frames.
///
/// Each frame's bin powers are folded onto the twelve pitch classes
/// (class 0 = C) and the frame is normalized by its peak class before
/// averaging, so loud frames do not dominate the profile.
pub fn chroma_profile(spectrogram: &Spectrogram) -> [f32; CHROMA_BINS] {
    let mut sums = [0.0_f64; CHROMA_BINS];
    for frame in &spectrogram.frames {
        let mut classes = [0.0_f64; CHROMA_BINS];
        for (bin, &magnitude) in frame.iter().enumerate().skip(1) {
            let freq = spectrogram.bin_frequency(bin);
            if freq < MIN_CHROMA_HZ {
                continue;
            }
            let class = pitch_class(freq);
            classes[class] += f64::from(magnitude) * f64::from(magnitude);
        }
        let peak = classes.iter().copied().fold(0.0_f64, f64::max);
        if peak > 0.0 {
            for (sum, &class_power) in sums.iter_mut().zip(&classes) {
                *sum += class_power / peak;
            }
        }
    }
    let frame_count = spectrogram.frames.len().max(1) as f64;
    let mut profile = [0.0_f32; CHROMA_BINS];
    for (out, sum) in profile.iter_mut().zip(&sums) {
        *out = (sum / frame_count) as f32;
    }
    profile
}

/// Maps a frequency to its equal-tempered pitch class, A440 reference.
fn pitch_class(freq_hz: f32) -> usize {
    let midi = 69.0 + 12.0 * (freq_hz / 440.0).log2();
    (midi.round() as i64).rem_euclid(12) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::spectral::stft::compute_spectrogram;

    #[test]
    fn pitch_class_of_reference_notes() {
        assert_eq!(pitch_class(440.0), 9); // A4
        assert_eq!(pitch_class(880.0), 9); // A5
        assert_eq!(pitch_class(261.63), 0); // C4
        assert_eq!(pitch_class(329.63), 4); // E4
    }

    #[test]
    fn pure_tone_concentrates_in_its_class() {
        let sample_rate = 16_000;
        let samples: Vec<f32> = (0..16_000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        let spec = compute_spectrogram(&samples, sample_rate, 2048, 512);
        let profile = chroma_profile(&spec);
        let loudest = profile
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(class, _)| class)
            .unwrap();
        assert_eq!(loudest, 9);
        assert!((profile[9] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn silence_yields_zero_profile() {
        let spec = compute_spectrogram(&[], 16_000, 2048, 512);
        let profile = chroma_profile(&spec);
        assert!(profile.iter().all(|&c| c == 0.0));
    }
}
