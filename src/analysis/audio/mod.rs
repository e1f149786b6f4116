//! Decoding and conditioning of speech clips ahead of feature extraction.
//!
//! Every clip is decoded once, downmixed to mono, and resampled to the
//! working rate. The prepared variant additionally has leading/trailing
//! silence trimmed and its peak normalized to 1.0.

use std::path::Path;

pub mod decode;
pub mod export;
pub mod normalize;
pub mod resample;
pub mod silence;

pub use export::write_wav_pcm16;

/// Working sample rate for the whole pipeline.
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
/// Frames quieter than the loudest frame by this many dB count as silence.
pub const DEFAULT_SILENCE_THRESHOLD_DB: f32 = 60.0;

/// A mono signal at a known sample rate.
#[derive(Debug, Clone)]
pub struct AudioSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioSignal {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }
}

/// Both conditioning stages of one decoded clip.
///
/// `untrimmed` keeps the original silence and level so duration and
/// formant measurements see the clip as recorded; `prepared` is the
/// trimmed, peak-normalized variant the spectral features run on.
#[derive(Debug, Clone)]
pub struct DecodedSignal {
    pub untrimmed: AudioSignal,
    pub prepared: AudioSignal,
}

/// Decodes, downmixes, and resamples a clip, returning both the raw
/// and the trimmed/normalized signal.
pub fn load_signal(
    path: &Path,
    sample_rate: u32,
    silence_threshold_db: f32,
) -> Result<DecodedSignal, String> {
    let raw = decode::decode_file(path)?;
    let mono = decode::downmix_to_mono(&raw);
    let samples = resample::resample_linear(&mono, raw.sample_rate, sample_rate.max(1));
    let untrimmed = AudioSignal {
        samples,
        sample_rate: sample_rate.max(1),
    };
    let mut prepared_samples =
        silence::trim_edges(&untrimmed.samples, silence_threshold_db).to_vec();
    normalize::normalize_peak(&mut prepared_samples);
    let prepared = AudioSignal {
        samples: prepared_samples,
        sample_rate: untrimmed.sample_rate,
    };
    Ok(DecodedSignal {
        untrimmed,
        prepared,
    })
}

/// Duration of a clip in seconds, measured after resampling to `sample_rate`.
///
/// Works on the interleaved decode directly; no downmix or resample
/// buffer is materialized.
pub fn clip_duration_seconds(path: &Path, sample_rate: u32) -> Result<f64, String> {
    let raw = decode::decode_file(path)?;
    let channels = usize::from(raw.channels.max(1));
    let frames = raw.samples.len() / channels;
    let rate = sample_rate.max(1);
    let resampled = resample::resampled_len(frames, raw.sample_rate, rate);
    Ok(resampled as f64 / f64::from(rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_padded_tone(path: &Path, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let pad = sample_rate as usize / 2;
        for _ in 0..pad {
            writer.write_sample(0.0_f32).unwrap();
        }
        for i in 0..sample_rate as usize {
            let t = i as f32 / sample_rate as f32;
            let s = 0.4 * (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            writer.write_sample(s).unwrap();
        }
        for _ in 0..pad {
            writer.write_sample(0.0_f32).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn load_produces_trimmed_and_normalized_variant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_padded_tone(&path, 16_000);
        let decoded = load_signal(&path, 16_000, 60.0).unwrap();
        assert_eq!(decoded.untrimmed.samples.len(), 32_000);
        assert!(decoded.prepared.samples.len() < decoded.untrimmed.samples.len());
        let peak = decoded
            .prepared
            .samples
            .iter()
            .fold(0.0_f32, |acc, s| acc.max(s.abs()));
        assert!((peak - 1.0).abs() < 1e-4);
    }

    #[test]
    fn load_resamples_to_requested_rate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hi.wav");
        write_padded_tone(&path, 32_000);
        let decoded = load_signal(&path, 16_000, 60.0).unwrap();
        assert_eq!(decoded.untrimmed.sample_rate, 16_000);
        assert_eq!(decoded.untrimmed.samples.len(), 32_000);
    }

    #[test]
    fn silent_clip_is_not_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiet.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..8_000 {
            writer.write_sample(0.0_f32).unwrap();
        }
        writer.finalize().unwrap();
        let decoded = load_signal(&path, 16_000, 60.0).unwrap();
        assert_eq!(
            decoded.prepared.samples.len(),
            decoded.untrimmed.samples.len()
        );
        assert!(decoded.prepared.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn duration_reflects_resampled_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("two_sec.wav");
        write_padded_tone(&path, 16_000);
        let duration = clip_duration_seconds(&path, 16_000).unwrap();
        assert!((duration - 2.0).abs() < 1e-6);
        let duration_8k = clip_duration_seconds(&path, 8_000).unwrap();
        assert!((duration_8k - 2.0).abs() < 1e-3);
    }

    #[test]
    fn duration_of_missing_file_is_an_error() {
        assert!(clip_duration_seconds(Path::new("/no/such.wav"), 16_000).is_err());
    }
}
