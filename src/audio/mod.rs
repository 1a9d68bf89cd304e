//! Audio acquisition and container handling.
//!
//! # Pipeline
//!
//! ```text
//! SourceSpec ──▶ LiveCapture (cpal) ─┐
//!            └─▶ wav::load → FileSource ─┴─▶ pull(window) → decode loop
//! ```
//!
//! Everything downstream of a source is mono 16-bit PCM at the engine's
//! sample rate; [`resample`] holds the conversion helpers, [`wav`] the
//! strict container codec used for batch input and debug capture output.

pub mod buffer;
pub mod capture;
pub mod resample;
pub mod source;
pub mod wav;

pub use buffer::AudioBuffer;
pub use capture::{list_input_devices, LiveCapture, MONITOR_SUFFIX};
pub use source::{AudioSource, FileSource, SourceError, SourceSpec};
pub use wav::WavError;
