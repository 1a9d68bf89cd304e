//! Speech-to-text engine layer.
//!
//! [`engine`] defines the backend-agnostic streaming contract the rest of
//! the crate programs against; [`whisper`] is the production backend.

pub mod engine;
pub mod whisper;

pub use engine::{
    DecodeResult, DecodeSession, EngineError, SpeechEngine, Token, Transcript, ENGINE_FRAME_SIZE,
    ENGINE_SAMPLE_RATE,
};
pub use whisper::WhisperEngine;

#[cfg(test)]
pub use engine::{tokenize_words, MockEngine};
