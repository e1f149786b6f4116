//! Writing conditioned clips back out as 16-bit PCM WAV.

use std::path::Path;

use super::AudioSignal;

/// Writes a mono signal as a 16-bit PCM WAV file.
///
/// Samples are clamped to `[-1.0, 1.0]` before quantisation.
pub fn write_wav_pcm16(path: &Path, signal: &AudioSignal) -> Result<(), String> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: signal.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|err| format!("Create WAV {}: {err}", path.display()))?;
    for &sample in &signal.samples {
        let quantised = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16;
        writer
            .write_sample(quantised)
            .map_err(|err| format!("Write WAV {}: {err}", path.display()))?;
    }
    writer
        .finalize()
        .map_err(|err| format!("Finalize WAV {}: {err}", path.display()))?;
    Ok(())
}
