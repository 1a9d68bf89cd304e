//! Whisper backend for the [`SpeechEngine`] contract.
//!
//! Whisper has no native incremental API, so a [`WhisperSession`]
//! accumulates every window fed to it and re-runs inference over the whole
//! accumulated buffer on each `decode_incremental` call.  That makes an
//! incremental decode cost proportional to the stream length so far, which
//! is acceptable for the interactive window sizes this tool uses and is
//! how Whisper-family engines are streamed in practice.
//!
//! Segment timestamps are converted to per-word [`Token`]s so the
//! flattening and JSON layers downstream see the timed-token shape the
//! engine contract promises.

use std::path::Path;

use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::stt::engine::{
    DecodeResult, DecodeSession, EngineError, SpeechEngine, Token, Transcript,
};

/// Whisper rejects buffers shorter than about a second; shorter input is
/// zero-padded up to this many samples.
const MIN_DECODE_SAMPLES: usize = 16_000;

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

/// A loaded Whisper model.
pub struct WhisperEngine {
    ctx: WhisperContext,
    /// ISO-639-1 decode language, `None` for auto-detection.
    language: Option<String>,
    n_threads: i32,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("language", &self.language)
            .field("n_threads", &self.n_threads)
            .finish_non_exhaustive()
    }
}

impl WhisperEngine {
    /// Load a GGML model file.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ModelNotFound`] — `model_path` does not exist.
    /// - [`EngineError::Init`] — whisper-rs rejected the file.
    pub fn load(model_path: impl AsRef<Path>, language: Option<String>) -> Result<Self, EngineError> {
        let path = model_path.as_ref();
        if !path.exists() {
            return Err(EngineError::ModelNotFound(path.display().to_string()));
        }
        let path_str = path.to_str().ok_or_else(|| {
            EngineError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx = WhisperContext::new_with_params(path_str, WhisperContextParameters::default())
            .map_err(|e| EngineError::Init(e.to_string()))?;

        log::info!("model loaded: {}", path.display());

        Ok(Self {
            ctx,
            language,
            n_threads: default_threads(),
        })
    }

    /// Run one full inference pass over `audio` (16 kHz mono f32).
    fn run(&self, audio: &[f32]) -> Result<Transcript, EngineError> {
        let mut padded;
        let audio = if audio.len() < MIN_DECODE_SAMPLES {
            padded = audio.to_vec();
            padded.resize(MIN_DECODE_SAMPLES, 0.0);
            &padded[..]
        } else {
            audio
        };

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_language(self.language.as_deref());
        params.set_n_threads(self.n_threads);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_special(false);

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| EngineError::Init(e.to_string()))?;

        state
            .full(params, audio)
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| EngineError::Decode(e.to_string()))?;

        let mut segments = Vec::with_capacity(n_segments as usize);
        for i in 0..n_segments {
            let text = state
                .full_get_segment_text(i)
                .map_err(|e| EngineError::Decode(format!("segment {i}: {e}")))?;
            // Timestamps arrive in centiseconds.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as f32 * 0.01;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as f32 * 0.01;
            segments.push((text, t0, t1));
        }

        Ok(Transcript {
            tokens: segments_to_tokens(&segments),
            // Whisper doesn't score whole transcripts.
            confidence: 0.0,
        })
    }
}

/// Half the logical cores, capped at 8 — inference saturates memory
/// bandwidth well before it saturates a big machine's core count.
fn default_threads() -> i32 {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    ((cores / 2).max(1).min(8)) as i32
}

/// Expand `(text, t0, t1)` segments into word and separator tokens.
///
/// Word start times are interpolated across the segment's span.  The
/// separator token between two segments carries the *following* segment's
/// start time, so a long silence shows up as a gap on the separator —
/// which is exactly where the flattener decides between a space and a
/// line break.
fn segments_to_tokens(segments: &[(String, f32, f32)]) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    for (text, t0, t1) in segments {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            continue;
        }
        if !tokens.is_empty() {
            tokens.push(Token::new(" ", *t0));
        }
        let step = (t1 - t0).max(0.0) / words.len() as f32;
        for (j, word) in words.iter().enumerate() {
            let start = t0 + step * j as f32;
            if j > 0 {
                tokens.push(Token::new(" ", start));
            }
            tokens.push(Token::new(*word, start));
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// WhisperSession
// ---------------------------------------------------------------------------

/// Streaming session: an accumulated audio buffer plus the engine to
/// re-decode it with.
pub struct WhisperSession<'a> {
    engine: &'a WhisperEngine,
    audio: Vec<f32>,
}

impl SpeechEngine for WhisperEngine {
    fn session(&self) -> Result<Box<dyn DecodeSession + '_>, EngineError> {
        Ok(Box::new(WhisperSession {
            engine: self,
            audio: Vec::new(),
        }))
    }

    fn decode_once(&self, samples: &[i16], candidates: usize) -> Result<DecodeResult, EngineError> {
        if candidates > 1 {
            log::debug!("whisper produces a single candidate; {candidates} were requested");
        }
        let audio: Vec<f32> = samples.iter().map(|&s| s as f32 / 32_768.0).collect();
        let transcript = self.run(&audio)?;
        Ok(DecodeResult {
            candidates: vec![transcript],
        })
    }
}

impl DecodeSession for WhisperSession<'_> {
    fn feed(&mut self, samples: &[i16]) {
        self.audio
            .extend(samples.iter().map(|&s| s as f32 / 32_768.0));
    }

    fn decode_incremental(&mut self) -> Result<Transcript, EngineError> {
        self.engine.run(&self.audio)
    }

    fn decode_final(self: Box<Self>, candidates: usize) -> Result<DecodeResult, EngineError> {
        if candidates > 1 {
            log::debug!("whisper produces a single candidate; {candidates} were requested");
        }
        let transcript = self.engine.run(&self.audio)?;
        Ok(DecodeResult {
            candidates: vec![transcript],
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_model_reports_path() {
        let err = WhisperEngine::load("/nonexistent/model.bin", None).unwrap_err();
        match err {
            EngineError::ModelNotFound(path) => assert!(path.contains("model.bin")),
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn default_threads_within_bounds() {
        let t = default_threads();
        assert!((1..=8).contains(&t));
    }

    // ---- segments_to_tokens ------------------------------------------------

    #[test]
    fn single_segment_splits_into_words() {
        let segments = vec![("hello world".to_string(), 0.0, 1.0)];
        let tokens = segments_to_tokens(&segments);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", " ", "world"]);
        assert!(tokens[0].start_time < tokens[2].start_time);
    }

    #[test]
    fn separator_between_segments_carries_next_start() {
        let segments = vec![
            ("one".to_string(), 0.0, 0.5),
            ("two".to_string(), 5.0, 5.5),
        ];
        let tokens = segments_to_tokens(&segments);
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["one", " ", "two"]);
        // The separator carries the second segment's start so the gap is
        // visible exactly on the separator.
        assert!((tokens[1].start_time - 5.0).abs() < 1e-6);
    }

    #[test]
    fn empty_segments_are_dropped() {
        let segments = vec![
            ("  ".to_string(), 0.0, 0.5),
            ("words".to_string(), 1.0, 1.5),
        ];
        let tokens = segments_to_tokens(&segments);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "words");
    }
}
