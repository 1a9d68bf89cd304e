//! JSON rendering of decode results.
//!
//! Batch mode can emit word-level timings instead of plain text.  The
//! document carries the best candidate at the top level and any further
//! candidates under `alternatives`:
//!
//! ```json
//! {
//!   "metadata": { "confidence": 0.98 },
//!   "words": [
//!     { "word": "hello", "time": 0.2, "duration": 0.3 }
//!   ],
//!   "alternatives": []
//! }
//! ```

use serde::Serialize;

use crate::stt::{DecodeResult, Token, Transcript};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordEntry {
    pub word: String,
    pub time: f32,
    pub duration: f32,
}

#[derive(Debug, Serialize)]
struct Metadata {
    confidence: f64,
}

#[derive(Debug, Serialize)]
struct CandidateDoc {
    metadata: Metadata,
    words: Vec<WordEntry>,
}

#[derive(Debug, Serialize)]
struct ResultDoc {
    metadata: Metadata,
    words: Vec<WordEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    alternatives: Vec<CandidateDoc>,
}

/// Group a transcript's tokens into timed words.
///
/// Separator tokens end the current word; a word's duration runs from its
/// first token to the separator (or last token) that ends it, clamped to
/// zero for degenerate timings.
pub fn words(transcript: &Transcript) -> Vec<WordEntry> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut word_start = 0.0f32;

    let close_word =
        |entries: &mut Vec<WordEntry>, current: &mut String, start: f32, end: f32| {
            if !current.is_empty() {
                entries.push(WordEntry {
                    word: std::mem::take(current),
                    time: start,
                    duration: (end - start).max(0.0),
                });
            }
        };

    for token in &transcript.tokens {
        if token.text == " " {
            close_word(&mut entries, &mut current, word_start, token.start_time);
        } else {
            if current.is_empty() {
                word_start = token.start_time;
            }
            current.push_str(&token.text);
        }
    }
    let last_time = transcript
        .tokens
        .last()
        .map(|t: &Token| t.start_time)
        .unwrap_or(0.0);
    close_word(&mut entries, &mut current, word_start, last_time);

    entries
}

fn candidate_doc(transcript: &Transcript) -> CandidateDoc {
    CandidateDoc {
        metadata: Metadata {
            confidence: transcript.confidence,
        },
        words: words(transcript),
    }
}

/// Serialize a decode result with word timings, best candidate first.
pub fn to_json(result: &DecodeResult) -> Result<String, serde_json::Error> {
    let best = result.best();
    let doc = ResultDoc {
        metadata: Metadata {
            confidence: best.confidence,
        },
        words: words(best),
        alternatives: result.candidates[1..].iter().map(candidate_doc).collect(),
    };
    serde_json::to_string_pretty(&doc)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
