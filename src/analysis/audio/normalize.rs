//! Sample conditioning and peak normalization for decoded clips.

/// Replaces non-finite or denormal samples and clamps the rest to `[-1.0, 1.0]`.
pub fn sanitize_sample(sample: f32) -> f32 {
    if !sample.is_finite() {
        return 0.0;
    }
    if sample != 0.0 && sample.abs() < f32::MIN_POSITIVE {
        return 0.0;
    }
    sample.clamp(-1.0, 1.0)
}

/// Scales the signal in place so the absolute peak sits at 1.0.
///
/// Silent or degenerate input is left untouched.
pub fn normalize_peak(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()));
    if !peak.is_finite() || peak <= 0.0 {
        return;
    }
    let gain = 1.0 / peak;
    for sample in samples.iter_mut() {
        *sample *= gain;
    }
}

/// Root-mean-square level of the signal, 0.0 for empty input.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = samples.iter().map(|&s| f64::from(s) * f64::from(s)).sum();
    (sum_squares / samples.len() as f64).sqrt() as f32
}

/// Converts a decibel value to a linear amplitude ratio.
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}
