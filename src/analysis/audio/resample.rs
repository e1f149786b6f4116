//! Linear-interpolation resampling to the pipeline's working rate.

/// Output length produced by [`resample_linear`] for the given rates.
pub fn resampled_len(input_len: usize, input_rate: u32, output_rate: u32) -> usize {
    if input_len == 0 || input_rate == 0 || output_rate == 0 {
        return 0;
    }
    if input_rate == output_rate {
        return input_len;
    }
    let ratio = f64::from(output_rate) / f64::from(input_rate);
    ((input_len as f64) * ratio).round() as usize
}

/// Resamples mono audio with linear interpolation between neighbouring samples.
///
/// Returns the input unchanged when the rates already match.
pub fn resample_linear(samples: &[f32], input_rate: u32, output_rate: u32) -> Vec<f32> {
    if input_rate == output_rate || samples.is_empty() {
        return samples.to_vec();
    }
    let output_len = resampled_len(samples.len(), input_rate, output_rate);
    if output_len == 0 {
        return Vec::new();
    }
    let step = f64::from(input_rate) / f64::from(output_rate);
    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let position = i as f64 * step;
        let index = position.floor() as usize;
        if index + 1 >= samples.len() {
            output.push(samples[samples.len() - 1]);
            continue;
        }
        let frac = (position - index as f64) as f32;
        let interpolated = samples[index] * (1.0 - frac) + samples[index + 1] * frac;
        output.push(interpolated);
    }
    output
}
