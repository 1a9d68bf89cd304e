//! In-memory PCM sample buffer.
//!
//! [`AudioBuffer`] owns a contiguous block of interleaved 16-bit signed
//! samples together with the metadata needed to interpret them (sample
//! rate, channel count).  It is produced by the WAV loader or by the
//! debug-capture writer, and is exclusively owned by whichever component
//! created it — nothing in the pipeline shares one.

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// Interleaved 16-bit signed PCM audio.
///
/// Samples are laid out per frame, `[C0, C1, C0, C1, …]` for a two-channel
/// buffer.  Invariant: `samples.len() == samples_per_channel * channels`,
/// which the constructors enforce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl AudioBuffer {
    /// Wrap an existing interleaved sample vector.
    ///
    /// # Panics
    ///
    /// Panics if `channels == 0` or if `samples.len()` is not a whole number
    /// of frames.
    pub fn from_samples(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
        assert!(channels > 0, "AudioBuffer needs at least one channel");
        assert!(
            samples.len() % channels as usize == 0,
            "sample count {} is not a multiple of the channel count {}",
            samples.len(),
            channels
        );
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Interleaved samples, all channels.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames (samples per channel).
    pub fn samples_per_channel(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples_per_channel() as f32 / self.sample_rate as f32
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_samples_keeps_data() {
        let buf = AudioBuffer::from_samples(16_000, 1, vec![1, -2, 3]);
        assert_eq!(buf.samples(), &[1, -2, 3]);
        assert_eq!(buf.samples_per_channel(), 3);
    }

    #[test]
    fn duration_is_frames_over_rate() {
        let buf = AudioBuffer::from_samples(16_000, 1, vec![0; 8_000]);
        assert!((buf.duration_secs() - 0.5).abs() < 1e-6);

        let stereo = AudioBuffer::from_samples(16_000, 2, vec![0; 16_000]);
        assert!((stereo.duration_secs() - 0.5).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "at least one channel")]
    fn zero_channels_panics() {
        let _ = AudioBuffer::from_samples(16_000, 0, vec![0; 4]);
    }

    #[test]
    #[should_panic(expected = "not a multiple of the channel count")]
    fn ragged_frame_panics() {
        let _ = AudioBuffer::from_samples(16_000, 2, vec![1, 2, 3]);
    }
}
