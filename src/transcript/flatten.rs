//! Turning timed tokens into display text.
//!
//! Token text is concatenated as-is, except that a silence longer than
//! [`GAP_BREAK_SECS`] between consecutive tokens becomes a line break.
//! When the silence falls on a separator token, the break *replaces* the
//! separator so lines never start or end with a stray space.

use crate::stt::{Token, Transcript};

/// A pause longer than this many seconds starts a new output line.
pub const GAP_BREAK_SECS: f32 = 1.0;

/// Render `transcript` as display text with silence-derived line breaks.
pub fn flatten(transcript: &Transcript) -> String {
    flatten_tokens(&transcript.tokens)
}

pub fn flatten_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    // Start time of the last text-bearing token; separators don't count,
    // so the gap is measured across the whole silence, not to the space
    // the engine emitted at its edge.
    let mut prev_start: Option<f32> = None;

    for token in tokens {
        let is_separator = token.text == " ";

        if let Some(prev) = prev_start {
            if token.start_time - prev > GAP_BREAK_SECS {
                out.push('\n');
                // One break per silence, however many tokens straddle it.
                prev_start = Some(token.start_time);
                if is_separator {
                    continue;
                }
            }
        }

        out.push_str(&token.text);
        if !is_separator {
            prev_start = Some(token.start_time);
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
