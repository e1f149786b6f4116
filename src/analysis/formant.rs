//! Formant frequency tracking with Gaussian-windowed Burg LPC.
//!
//! The clip is resampled so the band of interest ends at the requested
//! ceiling, pre-emphasized, and sliced into centered frames. Each frame
//! yields an LPC polynomial whose stable complex roots map to formant
//! candidates; candidates are sorted by frequency and read back out via
//! linear interpolation between frames.

use nalgebra::DMatrix;
use num_complex::Complex64;
use rustfft::FftPlanner;

use super::audio::AudioSignal;

pub const DEFAULT_MAX_FORMANT_HZ: f64 = 5_500.0;
pub const DEFAULT_FORMANT_SAMPLE_COUNT: usize = 100;
/// Formants averaged into the feature vector: F1, F2, F3.
pub const MEAN_FORMANT_COUNT: usize = 3;

const MAX_FORMANTS_PER_FRAME: usize = 5;
/// The analysis window physically spans twice this value.
const WINDOW_SECONDS: f64 = 0.025;
const PRE_EMPHASIS_FROM_HZ: f64 = 50.0;
/// Candidates this close to 0 Hz or the ceiling are LPC edge artifacts.
const EDGE_MARGIN_HZ: f64 = 50.0;
const GAUSSIAN_ALPHA: f64 = 12.0;
const NEWTON_ITERATIONS: usize = 10;
const NEWTON_TOLERANCE: f64 = 1e-10;

/// Per-frame formant frequencies, sorted ascending within each frame.
pub struct FormantTrack {
    frames: Vec<Vec<f64>>,
    first_frame_time: f64,
    time_step: f64,
}

impl FormantTrack {
    /// Frequency of the n-th formant (1-based) at a point in time,
    /// linearly interpolated between the two nearest frames.
    ///
    /// Returns `None` outside the analysed span or when neither
    /// neighbouring frame resolved that formant.
    pub fn value_at(&self, formant_number: usize, time: f64) -> Option<f64> {
        if self.frames.is_empty() || formant_number == 0 {
            return None;
        }
        let index_float = (time - self.first_frame_time) / self.time_step;
        if index_float < -0.5 || index_float > self.frames.len() as f64 - 0.5 {
            return None;
        }
        let index = index_float.floor() as isize;
        let frac = index_float - index as f64;
        let last = self.frames.len() as isize - 1;
        let left = index.clamp(0, last) as usize;
        let right = (index + 1).clamp(0, last) as usize;
        let first = self.frames[left].get(formant_number - 1).copied();
        let second = self.frames[right].get(formant_number - 1).copied();
        match (first, second) {
            (None, None) => None,
            (None, Some(f)) | (Some(f), None) => Some(f),
            (Some(a), Some(b)) => Some(a * (1.0 - frac) + b * frac),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Runs the Burg analysis over the whole clip.
pub fn track_formants(signal: &AudioSignal, max_formant_hz: f64) -> FormantTrack {
    let duration = signal.duration_seconds();
    let original_rate = f64::from(signal.sample_rate.max(1));
    let source: Vec<f64> = signal.samples.iter().map(|&s| f64::from(s)).collect();

    // Everything above the ceiling is irrelevant, so analyse at 2x ceiling.
    let target_rate = 2.0 * max_formant_hz;
    let (samples, sample_rate) = if target_rate < original_rate {
        (resample_fft(&source, original_rate, target_rate), target_rate)
    } else {
        (source, original_rate)
    };
    let emphasized = pre_emphasize(&samples, sample_rate);

    let physical_window = 2.0 * WINDOW_SECONDS;
    let mut window_len = (physical_window * sample_rate).round() as usize;
    if window_len % 2 == 0 {
        window_len += 1;
    }
    let half_window = window_len / 2;
    let time_step = WINDOW_SECONDS / 4.0;
    let lpc_order = 2 * MAX_FORMANTS_PER_FRAME;
    let window = gaussian_window(window_len);

    let steps = ((duration - physical_window) / time_step).floor();
    let frame_count = if steps.is_sign_negative() {
        1
    } else {
        steps as usize + 1
    };
    let first_frame_time = (duration - (frame_count - 1) as f64 * time_step) / 2.0;

    let mut frames = Vec::with_capacity(frame_count);
    let mut windowed = vec![0.0_f64; window_len];
    for i in 0..frame_count {
        let center_time = first_frame_time + i as f64 * time_step;
        fill_centered_frame(&mut windowed, &emphasized, center_time, sample_rate, half_window);
        for (sample, &weight) in windowed.iter_mut().zip(&window) {
            *sample *= weight;
        }
        let coefficients = burg_coefficients(&windowed, lpc_order);
        let roots = polynomial_roots(&coefficients);
        frames.push(frame_formants(&roots, sample_rate, max_formant_hz));
    }

    FormantTrack {
        frames,
        first_frame_time,
        time_step,
    }
}

/// Means of F1..F3 over evenly spaced sample times spanning the clip.
///
/// Sample points where a formant is undefined are skipped; a formant
/// that is undefined everywhere reports NaN.
pub fn mean_formants(signal: &AudioSignal, sample_count: usize) -> [f64; MEAN_FORMANT_COUNT] {
    let track = track_formants(signal, DEFAULT_MAX_FORMANT_HZ);
    let times = sample_times(signal.duration_seconds(), sample_count);
    let mut means = [f64::NAN; MEAN_FORMANT_COUNT];
    for (slot, formant_number) in means.iter_mut().zip(1..) {
        let mut sum = 0.0_f64;
        let mut defined = 0usize;
        for &time in &times {
            if let Some(frequency) = track.value_at(formant_number, time) {
                sum += frequency;
                defined += 1;
            }
        }
        if defined > 0 {
            *slot = sum / defined as f64;
        }
    }
    means
}

/// Evenly spaced times from 0 to `duration`, endpoints included.
fn sample_times(duration: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => (0..count)
            .map(|i| duration * i as f64 / (count - 1) as f64)
            .collect(),
    }
}

fn pre_emphasize(samples: &[f64], sample_rate: f64) -> Vec<f64> {
    if samples.is_empty() {
        return Vec::new();
    }
    let alpha = (-2.0 * std::f64::consts::PI * PRE_EMPHASIS_FROM_HZ / sample_rate).exp();
    let mut out = Vec::with_capacity(samples.len());
    out.push(samples[0]);
    for pair in samples.windows(2) {
        out.push(pair[1] - alpha * pair[0]);
    }
    out
}

fn gaussian_window(len: usize) -> Vec<f64> {
    if len <= 1 {
        return vec![1.0; len.max(1)];
    }
    let mid = (len - 1) as f64 / 2.0;
    (0..len)
        .map(|i| {
            let x = (i as f64 - mid) / mid;
            (-GAUSSIAN_ALPHA * x * x).exp()
        })
        .collect()
}

/// Copies a window centered on `center_time` into `target`, zero-padding
/// past the clip edges.
fn fill_centered_frame(
    target: &mut [f64],
    samples: &[f64],
    center_time: f64,
    sample_rate: f64,
    half_window: usize,
) {
    let center = (center_time * sample_rate).round() as isize;
    let start = center - half_window as isize;
    for (offset, cell) in target.iter_mut().enumerate() {
        let index = start + offset as isize;
        *cell = if index >= 0 && (index as usize) < samples.len() {
            samples[index as usize]
        } else {
            0.0
        };
    }
}

/// Burg's method for LPC coefficients, `a[0] = 1`.
fn burg_coefficients(samples: &[f64], order: usize) -> Vec<f64> {
    let n = samples.len();
    let mut a = vec![0.0_f64; order + 1];
    a[0] = 1.0;
    if n <= order {
        return a;
    }

    let mut forward = samples.to_vec();
    let mut backward = samples.to_vec();
    for k in 1..=order {
        let mut numerator = 0.0_f64;
        let mut denominator = 0.0_f64;
        for i in k..n {
            numerator += forward[i] * backward[i - 1];
            denominator += forward[i] * forward[i] + backward[i - 1] * backward[i - 1];
        }
        if denominator < 1e-30 {
            break;
        }
        let reflection = -2.0 * numerator / denominator;

        // Descending order keeps the reads ahead of the writes, so the
        // error sequences update in place.
        for i in (k..n).rev() {
            let f = forward[i];
            let b = backward[i - 1];
            forward[i] = f + reflection * b;
            backward[i] = b + reflection * f;
        }

        let previous = a.clone();
        for i in 1..k {
            a[i] = previous[i] + reflection * previous[k - i];
        }
        a[k] = reflection;
    }
    a
}

/// Evaluates the monic LPC polynomial and its derivative at `z`.
fn polynomial_with_derivative(a: &[f64], z: Complex64) -> (Complex64, Complex64) {
    let mut value = Complex64::new(1.0, 0.0);
    let mut derivative = Complex64::new(0.0, 0.0);
    for &coefficient in a.iter().skip(1) {
        derivative = value + z * derivative;
        value = value * z + Complex64::new(coefficient, 0.0);
    }
    (value, derivative)
}

/// Newton-Raphson refinement of one polynomial root.
fn polish_root(a: &[f64], mut z: Complex64) -> Complex64 {
    for _ in 0..NEWTON_ITERATIONS {
        let (value, derivative) = polynomial_with_derivative(a, z);
        if derivative.norm() < 1e-30 {
            break;
        }
        let delta = value / derivative;
        z -= delta;
        if delta.norm() < NEWTON_TOLERANCE * z.norm() {
            break;
        }
    }
    z
}

/// Roots of the LPC polynomial via companion-matrix eigenvalues,
/// reflected inside the unit circle and polished.
fn polynomial_roots(a: &[f64]) -> Vec<Complex64> {
    let order = a.len().saturating_sub(1);
    if order < 1 {
        return Vec::new();
    }
    // A silent frame leaves the polynomial at z^p; skip the eigensolve.
    let coefficient_sum: f64 = a.iter().skip(1).map(|c| c.abs()).sum();
    if coefficient_sum < 1e-10 {
        return Vec::new();
    }

    let mut companion = DMatrix::<f64>::zeros(order, order);
    for i in 0..order {
        companion[(0, i)] = -a[i + 1];
    }
    for i in 1..order {
        companion[(i, i - 1)] = 1.0;
    }
    let eigenvalues = companion.schur().complex_eigenvalues();

    let mut roots: Vec<Complex64> = eigenvalues
        .iter()
        .map(|e| Complex64::new(e.re, e.im))
        .collect();
    for root in roots.iter_mut() {
        let radius = root.norm();
        if radius > 1.0 {
            *root = root.conj() / (radius * radius);
        }
        *root = polish_root(a, *root);
    }
    roots
}

/// Keeps stable positive-frequency roots inside the usable band and
/// returns their frequencies sorted ascending.
fn frame_formants(roots: &[Complex64], sample_rate: f64, max_formant_hz: f64) -> Vec<f64> {
    let mut frequencies: Vec<f64> = roots
        .iter()
        .filter_map(|root| {
            if root.im <= 0.0 || root.norm() >= 1.0 {
                return None;
            }
            let frequency = root.arg() * sample_rate / (2.0 * std::f64::consts::PI);
            (frequency >= EDGE_MARGIN_HZ && frequency <= max_formant_hz - EDGE_MARGIN_HZ)
                .then_some(frequency)
        })
        .collect();
    frequencies.sort_by(f64::total_cmp);
    frequencies.truncate(MAX_FORMANTS_PER_FRAME);
    frequencies
}

/// Band-limited resampling through the frequency domain.
fn resample_fft(samples: &[f64], input_rate: f64, output_rate: f64) -> Vec<f64> {
    if (input_rate - output_rate).abs() < 1e-6 || samples.is_empty() {
        return samples.to_vec();
    }
    let n = samples.len();
    let out_len = (n as f64 * output_rate / input_rate).round() as usize;
    if out_len == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(n);
    let mut spectrum: Vec<Complex64> = samples.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    forward.process(&mut spectrum);

    let mut resized = vec![Complex64::new(0.0, 0.0); out_len];
    let half_in = n / 2;
    let half_out = out_len / 2;
    let half = half_out.min(half_in);
    for i in 0..=half {
        resized[i] = spectrum[i];
    }
    for i in 1..=half {
        if i < out_len - i && i < n - i {
            resized[out_len - i] = spectrum[n - i];
        }
    }
    // An even output length has a lone Nyquist bin; averaging the two
    // conjugate input bins keeps the result real.
    if out_len % 2 == 0 && half_out <= half_in {
        resized[half_out] = (spectrum[half_out] + spectrum[n - half_out]) * 0.5;
    }

    let inverse = planner.plan_fft_inverse(out_len);
    inverse.process(&mut resized);
    let scale = 1.0 / n as f64;
    resized.iter().map(|c| c.re * scale).collect()
}
