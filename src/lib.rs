//! voxcat — streaming speech-to-text for the terminal.
//!
//! Microphone, system audio or WAV files go in; a stable transcript comes
//! out.  The recognition model is an external collaborator behind the
//! [`stt::SpeechEngine`] traits; everything else is the
//! capture-and-stabilize pipeline:
//!
//! ```text
//! config ─▶ audio source ─▶ decode loop ─▶ flatten ─▶ stabilize ─▶ stdout
//!            (cpal / wav)    (stt)          (transcript)
//! ```

pub mod audio;
pub mod config;
pub mod pipeline;
pub mod stt;
pub mod transcript;
