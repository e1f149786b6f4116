//! Symphonia-backed decoding of audio clips into `f32` samples.

use std::fs::File;
use std::path::Path;

use symphonia::core::{
    audio::SampleBuffer, codecs::DecoderOptions, errors::Error, formats::FormatOptions,
    io::MediaSourceStream, meta::MetadataOptions, probe::Hint,
};

use super::normalize::sanitize_sample;

/// Raw decoded audio in interleaved `f32` samples.
#[derive(Debug)]
pub struct RawAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Decodes a clip into interleaved `f32` samples with rate and channel count.
pub fn decode_file(path: &Path) -> Result<RawAudio, String> {
    match decode_with_symphonia(path) {
        Ok((samples, sample_rate, channels)) => Ok(RawAudio {
            samples,
            sample_rate: sample_rate.max(1),
            channels: channels.max(1),
        }),
        Err(err) => Err(format!("Audio decode failed for {}: {err}", path.display())),
    }
}

/// Averages interleaved channels into a single sanitized mono track.
///
/// A ragged trailing frame is dropped rather than padded.
pub fn downmix_to_mono(raw: &RawAudio) -> Vec<f32> {
    let channels = usize::from(raw.channels.max(1));
    if channels == 1 {
        return raw.samples.iter().map(|&s| sanitize_sample(s)).collect();
    }
    let frames = raw.samples.len() / channels;
    let mut mono = Vec::with_capacity(frames);
    for frame in 0..frames {
        let start = frame * channels;
        let sum: f32 = raw.samples[start..start + channels].iter().sum();
        mono.push(sanitize_sample(sum / channels as f32));
    }
    mono
}

fn decode_with_symphonia(path: &Path) -> Result<(Vec<f32>, u32, u16), String> {
    let file = File::open(path).map_err(|err| format!("Open {}: {err}", path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|err| format!("Symphonia probe failed for {}: {err}", path.display()))?;
    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| format!("No default track for {}", path.display()))?;
    let codec_params = &track.codec_params;
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| format!("Missing sample rate for {}", path.display()))?;
    let channels = codec_params
        .channels
        .ok_or_else(|| format!("Missing channel count for {}", path.display()))?
        .count() as u16;

    let mut decoder = symphonia::default::get_codecs()
        .make(codec_params, &DecoderOptions::default())
        .map_err(|err| format!("Symphonia decoder failed for {}: {err}", path.display()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(_)) => break,
            Err(err) => {
                return Err(format!(
                    "Symphonia packet read failed for {}: {err}",
                    path.display()
                ));
            }
        };
        let audio_buf = match decoder.decode(&packet) {
            Ok(audio_buf) => audio_buf,
            Err(Error::DecodeError(_)) => continue,
            Err(err) => {
                return Err(format!(
                    "Symphonia decode failed for {}: {err}",
                    path.display()
                ));
            }
        };
        let spec = *audio_buf.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(audio_buf.capacity() as u64, spec);
        sample_buf.copy_interleaved_ref(audio_buf);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() {
        return Err(format!(
            "Symphonia decoded 0 samples for {}",
            path.display()
        ));
    }

    Ok((samples, sample_rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stereo_wav(path: &Path, frames: usize, sample_rate: u32) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let left = (i as f32 / frames as f32) - 0.5;
            writer.write_sample(left).unwrap();
            writer.write_sample(-left).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn decodes_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_stereo_wav(&path, 512, 22_050);
        let raw = decode_file(&path).unwrap();
        assert_eq!(raw.channels, 2);
        assert_eq!(raw.sample_rate, 22_050);
        assert_eq!(raw.samples.len(), 1024);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = decode_file(Path::new("/nonexistent/clip.wav")).unwrap_err();
        assert!(err.contains("clip.wav"));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"not a riff header at all").unwrap();
        assert!(decode_file(&path).is_err());
    }

    #[test]
    fn downmix_averages_channel_pairs() {
        let raw = RawAudio {
            samples: vec![0.2, 0.4, -1.0, 1.0, 0.6],
            sample_rate: 16_000,
            channels: 2,
        };
        let mono = downmix_to_mono(&raw);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!(mono[1].abs() < 1e-6);
    }

    #[test]
    fn downmix_sanitizes_mono_passthrough() {
        let raw = RawAudio {
            samples: vec![0.5, f32::NAN, 2.0],
            sample_rate: 16_000,
            channels: 1,
        };
        assert_eq!(downmix_to_mono(&raw), vec![0.5, 0.0, 1.0]);
    }
}
