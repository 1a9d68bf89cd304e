//! Speech-engine interface consumed by the pipeline.
//!
//! The recognition engine is an external collaborator: the pipeline only
//! knows the streaming contract expressed by [`SpeechEngine`] and
//! [`DecodeSession`].  A session accepts audio increments via `feed`,
//! answers "best guess so far" via `decode_incremental`, and commits to a
//! final answer via `decode_final` (which consumes the session and
//! releases its search state).  `decode_once` is the non-streaming
//! whole-buffer path used by batch mode.
//!
//! [`MockEngine`] (`#[cfg(test)]`) replays a scripted sequence of
//! transcripts so the decode loop and stabilizer can be tested without a
//! model file.

use thiserror::Error;

/// Sample rate the engine consumes, in Hz.
pub const ENGINE_SAMPLE_RATE: u32 = 16_000;

/// The engine's native frame size in samples; decode windows must be a
/// positive multiple of this (10 ms at 16 kHz).
pub const ENGINE_FRAME_SIZE: usize = 160;

// ---------------------------------------------------------------------------
// Transcript types
// ---------------------------------------------------------------------------

/// One timed text fragment of a transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Fragment text; a lone `" "` acts as a word separator.
    pub text: String,
    /// Start of the fragment in seconds from the beginning of the stream.
    pub start_time: f32,
}

impl Token {
    pub fn new(text: impl Into<String>, start_time: f32) -> Self {
        Self {
            text: text.into(),
            start_time,
        }
    }
}

/// One candidate transcription: ordered tokens plus a confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub tokens: Vec<Token>,
    /// Engine-reported confidence; backends that don't score whole
    /// transcripts report `0.0`.
    pub confidence: f64,
}

impl Transcript {
    /// Plain concatenation of every token's text, no formatting.
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}

/// The outcome of a final or whole-buffer decode: one or more candidate
/// transcripts, best first.
#[derive(Debug, Clone)]
pub struct DecodeResult {
    pub candidates: Vec<Transcript>,
}

impl DecodeResult {
    /// The engine's best candidate.
    ///
    /// # Panics
    ///
    /// Panics if the engine returned no candidates, which would violate the
    /// engine contract.
    pub fn best(&self) -> &Transcript {
        &self.candidates[0]
    }
}

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Structured engine failures, translated to human-readable messages.
///
/// There is no fallback decoding path, so callers treat these as fatal.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("model not found: {0}")]
    ModelNotFound(String),

    #[error("engine initialisation failed: {0}")]
    Init(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

// ---------------------------------------------------------------------------
// SpeechEngine / DecodeSession
// ---------------------------------------------------------------------------

/// A loaded recognition model.
pub trait SpeechEngine {
    /// Open a streaming decode session against this model.
    ///
    /// Each session is exclusively owned by one decode loop; sessions are
    /// never shared across threads or across files.
    fn session(&self) -> Result<Box<dyn DecodeSession + '_>, EngineError>;

    /// Decode a whole buffer in one call (batch mode).
    fn decode_once(&self, samples: &[i16], candidates: usize) -> Result<DecodeResult, EngineError>;
}

/// One streaming decode in progress.
pub trait DecodeSession {
    /// Append a window of engine-rate mono samples to the stream.
    fn feed(&mut self, samples: &[i16]);

    /// Best-guess transcript of everything fed so far.  Later audio may
    /// revise any part of it.
    fn decode_incremental(&mut self) -> Result<Transcript, EngineError>;

    /// Commit to a final transcript and release the session's search
    /// state.  May apply a different search budget than the incremental
    /// path.
    fn decode_final(self: Box<Self>, candidates: usize) -> Result<DecodeResult, EngineError>;
}

// ---------------------------------------------------------------------------
// MockEngine  (test-only)
// ---------------------------------------------------------------------------

/// Scripted engine for loop and stabilizer tests.
///
/// Each `decode_incremental` call returns the next transcript in the
/// script (sticking on the last one when the script runs out);
/// `decode_final` returns the configured final result.
#[cfg(test)]
pub struct MockEngine {
    pub script: Vec<Transcript>,
    pub final_result: DecodeResult,
}

#[cfg(test)]
impl MockEngine {
    /// Build a mock whose incremental script and final answer are plain
    /// word tokens with fabricated timings.
    pub fn scripted(partials: &[&str], final_text: &str) -> Self {
        let to_transcript = |text: &str| Transcript {
            tokens: tokenize_words(text),
            confidence: 0.9,
        };
        Self {
            script: partials.iter().map(|t| to_transcript(t)).collect(),
            final_result: DecodeResult {
                candidates: vec![to_transcript(final_text)],
            },
        }
    }
}

/// Split `text` into word and space tokens 0.1 s apart, the shape real
/// engines produce.
#[cfg(test)]
pub fn tokenize_words(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut t = 0.0f32;
    for (i, word) in text.split(' ').enumerate() {
        if i > 0 {
            tokens.push(Token::new(" ", t));
            t += 0.1;
        }
        if !word.is_empty() {
            tokens.push(Token::new(word, t));
            t += 0.1;
        }
    }
    tokens
}

#[cfg(test)]
struct MockSession<'a> {
    engine: &'a MockEngine,
    calls: usize,
    fed_samples: usize,
}

#[cfg(test)]
impl SpeechEngine for MockEngine {
    fn session(&self) -> Result<Box<dyn DecodeSession + '_>, EngineError> {
        Ok(Box::new(MockSession {
            engine: self,
            calls: 0,
            fed_samples: 0,
        }))
    }

    fn decode_once(
        &self,
        _samples: &[i16],
        _candidates: usize,
    ) -> Result<DecodeResult, EngineError> {
        Ok(self.final_result.clone())
    }
}

#[cfg(test)]
impl DecodeSession for MockSession<'_> {
    fn feed(&mut self, samples: &[i16]) {
        self.fed_samples += samples.len();
    }

    fn decode_incremental(&mut self) -> Result<Transcript, EngineError> {
        let idx = self.calls.min(self.engine.script.len().saturating_sub(1));
        self.calls += 1;
        self.engine
            .script
            .get(idx)
            .cloned()
            .ok_or_else(|| EngineError::Decode("mock script is empty".to_string()))
    }

    fn decode_final(self: Box<Self>, _candidates: usize) -> Result<DecodeResult, EngineError> {
        Ok(self.engine.final_result.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
