//! Sample-rate and channel conversion for decoder input.
//!
//! The decode engine wants **mono 16-bit** audio at its native rate.  Live
//! capture devices and WAV files arrive in whatever format they like, so
//! two conversion steps are provided:
//!
//! 1. [`downmix_to_mono`] — average interleaved channels into one.
//! 2. [`resample`] — linear-interpolation rate conversion.
//!
//! Linear interpolation is plenty for speech recognition input; the engine
//! itself is far noisier than the interpolation error.

use crate::audio::AudioBuffer;

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging channels.
///
/// The output length is `samples.len() / channels`.  Mono input is returned
/// unchanged (owned); zero channels yields an empty vector.
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                    (sum / n as i32) as i16
                })
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono audio from `source_rate` to `target_rate` Hz using linear
/// interpolation.
///
/// Matching rates (or empty input) return the input unchanged.  Output
/// length is `ceil(samples.len() * target_rate / source_rate)`.
pub fn resample(samples: &[i16], source_rate: u32, target_rate: u32) -> Vec<i16> {
    if source_rate == target_rate {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            let a = samples[idx] as f64;
            let b = samples[idx + 1] as f64;
            (a * (1.0 - frac) + b * frac).round() as i16
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// to_engine_format
// ---------------------------------------------------------------------------

/// Convert a loaded [`AudioBuffer`] to the mono sample stream the engine
/// expects at `engine_rate` Hz.
///
/// Logs a warning when up-sampling, since recognition on up-sampled audio
/// tends to be erratic.
pub fn to_engine_format(buffer: &AudioBuffer, engine_rate: u32) -> Vec<i16> {
    if buffer.sample_rate() < engine_rate {
        log::warn!(
            "original sample rate ({} Hz) is lower than {} Hz; up-sampling may \
             produce erratic recognition",
            buffer.sample_rate(),
            engine_rate
        );
    }
    let mono = downmix_to_mono(buffer.samples(), buffer.channels());
    resample(&mono, buffer.sample_rate(), engine_rate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
