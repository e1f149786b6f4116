use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn write_test_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create wav parent dirs");
    }
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav writer");
    for &sample in samples {
        writer.write_sample(sample).expect("write wav sample");
    }
    writer.finalize().expect("finalize wav");
}

pub fn sine(freq: f32, seconds: f32, sample_rate: u32) -> Vec<f32> {
    let len = (seconds * sample_rate as f32).round() as usize;
    (0..len)
        .map(|i| 0.8 * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
        .collect()
}

pub fn noise(seconds: f32, sample_rate: u32, seed: u64) -> Vec<f32> {
    let len = (seconds * sample_rate as f32).round() as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(-0.8..0.8)).collect()
}

/// Wraps a signal in `pad` zero samples on both sides.
pub fn padded(samples: &[f32], pad: usize) -> Vec<f32> {
    let mut out = vec![0.0; pad];
    out.extend_from_slice(samples);
    out.extend(std::iter::repeat_n(0.0, pad));
    out
}
