//! Audio source abstraction.
//!
//! A [`SourceSpec`] says *where* audio comes from; an [`AudioSource`] is an
//! opened handle that the decode loop pulls fixed windows of engine-rate
//! mono `i16` samples from.  Live sources (microphone, system monitor,
//! named device) are provided by [`crate::audio::capture::LiveCapture`];
//! [`FileSource`] replays a fully-loaded buffer for the batch streaming
//! path and for tests.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// SourceSpec
// ---------------------------------------------------------------------------

/// A resolved description of where audio comes from.
///
/// Built once during configuration resolution and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// The platform default capture device.
    Microphone,
    /// The first capture device whose name ends in the monitor suffix
    /// (a loopback of what the system is playing).
    SystemMonitor,
    /// Exactly this capture device, no pattern matching.
    NamedDevice(String),
    /// One or more WAV files, decoded whole and transcribed in turn.
    FileList(Vec<PathBuf>),
}

impl SourceSpec {
    /// `true` for the three live-capture variants.
    pub fn is_live(&self) -> bool {
        !matches!(self, SourceSpec::FileList(_))
    }
}

// ---------------------------------------------------------------------------
// SourceError
// ---------------------------------------------------------------------------

/// Errors opening or reading an audio source.
///
/// Open failures carry enough context to be actionable: the device that was
/// requested and, where it helps, the devices that actually exist.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error(
        "no default capture device found; available input devices: {}",
        format_device_list(.available)
    )]
    NoDefaultDevice { available: Vec<String> },

    #[error(
        "capture device '{name}' not found; available input devices: {}",
        format_device_list(.available)
    )]
    DeviceNotFound {
        name: String,
        available: Vec<String>,
    },

    #[error(
        "system audio requested but no monitor device (name ending in \
         '{suffix}') was found; inspected devices: {}",
        format_device_list(.inspected)
    )]
    NoMonitorDevice {
        suffix: &'static str,
        inspected: Vec<String>,
    },

    #[error("failed to open capture device '{name}': {reason}")]
    Open { name: String, reason: String },

    #[error("capture stream failed: {0}")]
    Read(String),

    #[error("source '{0:?}' is not a live capture source")]
    NotLive(SourceSpec),
}

fn format_device_list(devices: &[String]) -> String {
    if devices.is_empty() {
        "(none)".to_string()
    } else {
        devices.join(", ")
    }
}

// ---------------------------------------------------------------------------
// AudioSource
// ---------------------------------------------------------------------------

/// An opened, pull-based stream of engine-rate mono samples.
///
/// `pull` fills as much of `window` as it can and returns the number of
/// samples written; `0` means end of stream.  Live sources block until the
/// whole window is available or the device reports a fatal error — they
/// never return a partial window as success.  File sources may return one
/// short final window when the loaded buffer runs out mid-window.
///
/// Device/session resources are released when the source is dropped, on
/// every exit path.
pub trait AudioSource {
    fn pull(&mut self, window: &mut [i16]) -> Result<usize, SourceError>;
}

// ---------------------------------------------------------------------------
// FileSource
// ---------------------------------------------------------------------------

/// Replays an already-loaded sample buffer window by window.
///
/// The source imposes no windowing of its own; the decode loop decides the
/// window size and this just hands out consecutive slices.
pub struct FileSource {
    samples: Vec<i16>,
    pos: usize,
}

impl FileSource {
    /// Wrap mono engine-rate samples (see
    /// [`crate::audio::resample::to_engine_format`]).
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples, pos: 0 }
    }
}

impl AudioSource for FileSource {
    fn pull(&mut self, window: &mut [i16]) -> Result<usize, SourceError> {
        let remaining = self.samples.len() - self.pos;
        let count = remaining.min(window.len());
        window[..count].copy_from_slice(&self.samples[self.pos..self.pos + count]);
        self.pos += count;
        Ok(count)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
