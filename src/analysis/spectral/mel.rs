//! Mel filter bank and MFCC extraction from magnitude frames.

/// Triangular mel filters plus the DCT size used for cepstral coefficients.
pub struct MelBank {
    coefficient_count: usize,
    filters: Vec<MelFilter>,
}

/// One triangular filter as a contiguous run of bin weights.
struct MelFilter {
    first_bin: usize,
    weights: Vec<f32>,
}

impl MelBank {
    pub fn new(
        sample_rate: u32,
        fft_len: usize,
        mel_bands: usize,
        coefficient_count: usize,
        f_min: f32,
        f_max: f32,
    ) -> Self {
        let bins = mel_bin_edges(sample_rate, fft_len, mel_bands, f_min, f_max);
        let mut filters = Vec::with_capacity(mel_bands);
        for band in 0..mel_bands {
            let left = bins[band];
            let center = bins[band + 1];
            let right = bins[band + 2].max(center + 1);
            filters.push(MelFilter::triangular(left, center, right));
        }
        Self {
            coefficient_count,
            filters,
        }
    }

    /// Log-mel energies of one magnitude frame, reduced to cepstral
    /// coefficients with a DCT-II.
    pub fn mfcc_from_magnitudes(&self, magnitudes: &[f32]) -> Vec<f32> {
        let log_energies: Vec<f32> = self
            .filters
            .iter()
            .map(|filter| filter.apply_power(magnitudes).max(1e-12).ln())
            .collect();
        dct_ii(&log_energies, self.coefficient_count)
    }
}

impl MelFilter {
    fn triangular(left: usize, center: usize, right: usize) -> Self {
        let mut weights = Vec::new();
        if right <= left {
            return Self {
                first_bin: left,
                weights,
            };
        }
        for bin in left..=right {
            let w = if bin < center {
                if center == left {
                    0.0
                } else {
                    (bin - left) as f32 / (center - left) as f32
                }
            } else if right == center {
                0.0
            } else {
                (right - bin) as f32 / (right - center) as f32
            };
            weights.push(w);
        }
        Self {
            first_bin: left,
            weights,
        }
    }

    /// Weighted power summed over the filter's support.
    fn apply_power(&self, magnitudes: &[f32]) -> f32 {
        let mut sum = 0.0_f64;
        for (offset, &weight) in self.weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            let magnitude = magnitudes
                .get(self.first_bin + offset)
                .copied()
                .unwrap_or(0.0);
            sum += f64::from(magnitude) * f64::from(magnitude) * f64::from(weight);
        }
        sum as f32
    }
}

fn mel_bin_edges(
    sample_rate: u32,
    fft_len: usize,
    mel_bands: usize,
    f_min: f32,
    f_max: f32,
) -> Vec<usize> {
    let sr = sample_rate.max(1) as f32;
    let nyquist = sr * 0.5;
    let f_max = f_max.min(nyquist).max(f_min);
    let mel_min = hz_to_mel(f_min);
    let mel_max = hz_to_mel(f_max);
    (0..mel_bands + 2)
        .map(|i| {
            let t = i as f32 / (mel_bands + 1) as f32;
            let hz = mel_to_hz(mel_min + (mel_max - mel_min) * t);
            freq_to_bin(hz, sample_rate, fft_len)
        })
        .collect()
}

fn freq_to_bin(freq_hz: f32, sample_rate: u32, fft_len: usize) -> usize {
    let sr = sample_rate.max(1) as f32;
    let freq = freq_hz.clamp(0.0, sr * 0.5);
    (((freq * fft_len as f32) / sr).floor() as usize).min(fft_len / 2)
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0_f32 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0_f32 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

fn dct_ii(values: &[f32], count: usize) -> Vec<f32> {
    let n = values.len().max(1) as f64;
    let mut out = Vec::with_capacity(count);
    for k in 0..count {
        let mut sum = 0.0_f64;
        for (m, &v) in values.iter().enumerate() {
            let angle = std::f64::consts::PI * (k as f64) * (m as f64 + 0.5) / n;
            sum += f64::from(v) * angle.cos();
        }
        out.push(sum as f32);
    }
    out
}
