//! Transcript rendering: timed tokens in, readable output out.

pub mod flatten;
pub mod json;
pub mod stabilize;

pub use flatten::{flatten, flatten_tokens, GAP_BREAK_SECS};
pub use json::{to_json, words, WordEntry};
pub use stabilize::{OutputMode, Stabilizer, TRAILING_MARGIN};
