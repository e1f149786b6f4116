//! Short-time Fourier transform producing magnitude frames.

use num_complex::Complex;
use rustfft::FftPlanner;

use crate::analysis::audio::normalize::sanitize_sample;

/// Magnitude spectrogram of a mono signal.
///
/// Each frame holds `fft_len / 2 + 1` magnitudes. There is always at
/// least one frame, even for empty input.
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub sample_rate: u32,
    pub fft_len: usize,
}

impl Spectrogram {
    pub fn bin_count(&self) -> usize {
        self.fft_len / 2 + 1
    }

    /// Center frequency of a bin in Hz.
    pub fn bin_frequency(&self, bin: usize) -> f32 {
        bin as f32 * self.sample_rate as f32 / self.fft_len as f32
    }
}

/// Periodic Hann window of the given length.
pub fn hann_window(len: usize) -> Vec<f32> {
    if len <= 1 {
        return vec![1.0; len];
    }
    (0..len)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * i as f32 / len as f32;
            0.5 * (1.0 - phase.cos())
        })
        .collect()
}

/// Slices the signal into hopped Hann-windowed frames and returns the
/// magnitude spectrum of each.
pub fn compute_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    frame_size: usize,
    hop_size: usize,
) -> Spectrogram {
    let frame_size = frame_size.max(1);
    let hop_size = hop_size.max(1);
    let window = hann_window(frame_size);
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(frame_size);
    let mut buffer = vec![Complex::new(0.0_f32, 0.0); frame_size];

    let mut frames = Vec::new();
    let mut start = 0usize;
    while start < samples.len() {
        fill_windowed(&mut buffer, samples, start, &window);
        fft.process(&mut buffer);
        frames.push(magnitudes(&buffer));
        start = start.saturating_add(hop_size);
        if samples.len() <= frame_size {
            break;
        }
    }
    if frames.is_empty() {
        frames.push(vec![0.0_f32; frame_size / 2 + 1]);
    }

    Spectrogram {
        frames,
        sample_rate: sample_rate.max(1),
        fft_len: frame_size,
    }
}

fn fill_windowed(target: &mut [Complex<f32>], samples: &[f32], start: usize, window: &[f32]) {
    for (i, cell) in target.iter_mut().enumerate() {
        let src = samples.get(start + i).copied().unwrap_or(0.0);
        let win = window.get(i).copied().unwrap_or(1.0);
        *cell = Complex::new(sanitize_sample(src) * win, 0.0);
    }
}

fn magnitudes(fft: &[Complex<f32>]) -> Vec<f32> {
    let bins = fft.len() / 2 + 1;
    let mut out = Vec::with_capacity(bins);
    for bin in 0..bins {
        out.push(fft[bin].norm());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hann_window_is_symmetric_and_zero_at_start() {
        let window = hann_window(8);
        assert!(window[0].abs() < 1e-7);
        assert!((window[4] - 1.0).abs() < 1e-6);
        for i in 1..8 {
            assert!((window[i] - window[8 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_input_yields_one_zero_frame() {
        let spec = compute_spectrogram(&[], 16_000, 2048, 512);
        assert_eq!(spec.frames.len(), 1);
        assert!(spec.frames[0].iter().all(|&m| m == 0.0));
        assert_eq!(spec.frames[0].len(), 1025);
    }

    #[test]
    fn short_input_yields_exactly_one_frame() {
        let samples = vec![0.5_f32; 100];
        let spec = compute_spectrogram(&samples, 16_000, 2048, 512);
        assert_eq!(spec.frames.len(), 1);
    }

    #[test]
    fn frame_count_follows_hop_size() {
        let samples = vec![0.1_f32; 2048 + 512 * 3];
        let spec = compute_spectrogram(&samples, 16_000, 2048, 512);
        // Frames start at every hop until the signal is exhausted.
        assert_eq!(spec.frames.len(), samples.len().div_ceil(512));
    }

    #[test]
    fn sine_peaks_at_matching_bin() {
        let sample_rate = 16_000;
        let samples: Vec<f32> = (0..4096)
            .map(|i| (2.0 * std::f32::consts::PI * 1_000.0 * i as f32 / sample_rate as f32).sin())
            .collect();
        let spec = compute_spectrogram(&samples, sample_rate, 2048, 512);
        let frame = &spec.frames[0];
        let peak_bin = frame
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin)
            .unwrap();
        let peak_hz = spec.bin_frequency(peak_bin);
        assert!((peak_hz - 1_000.0).abs() < 20.0, "peak at {peak_hz} Hz");
    }
}
