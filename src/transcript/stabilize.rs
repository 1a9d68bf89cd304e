//! Incremental transcript presentation.
//!
//! Every incremental decode yields a fresh best-guess transcript of the
//! whole stream, so naively printing each one floods the terminal with
//! near-duplicates.  [`Stabilizer`] turns that stream of snapshots into
//! something readable, in one of three modes:
//!
//! - [`OutputMode::Interactive`] — clear the screen and repaint the whole
//!   transcript on every change.  The terminal always shows the current
//!   best guess, revisions included.
//! - [`OutputMode::Appending`] — append-only output for pipes and files.
//!   Text is held back until it sits at least [`TRAILING_MARGIN`]
//!   characters behind the end of the transcript; the engine almost never
//!   revises that far back, so what is emitted is effectively final.
//! - [`OutputMode::Lines`] — print each changed snapshot on its own line;
//!   used when streaming partials from a file are explicitly requested.
//!
//! All modes suppress snapshots identical to the previous one.

use std::io::{self, IsTerminal, Write};

/// Characters held back from append-only output, as revision head-room.
pub const TRAILING_MARGIN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Interactive,
    Appending,
    Lines,
}

/// Stateful presenter for a stream of transcript snapshots.
pub struct Stabilizer<W: Write> {
    out: W,
    mode: OutputMode,
    /// Previous snapshot, for change suppression.
    last: String,
    /// Characters already emitted (append-only modes never take them back).
    committed: usize,
}

impl Stabilizer<io::Stdout> {
    /// Stdout presenter: interactive repaint on a terminal, append-only
    /// when stdout is a pipe or file.
    pub fn for_stdout() -> Self {
        let stdout = io::stdout();
        let mode = if stdout.is_terminal() {
            OutputMode::Interactive
        } else {
            OutputMode::Appending
        };
        Self::new(stdout, mode)
    }
}

impl<W: Write> Stabilizer<W> {
    pub fn new(out: W, mode: OutputMode) -> Self {
        Self {
            out,
            mode,
            last: String::new(),
            committed: 0,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Consume the presenter and hand back its writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Present one incremental snapshot.
    pub fn push(&mut self, text: &str) -> io::Result<()> {
        if text == self.last {
            return Ok(());
        }

        match self.mode {
            OutputMode::Interactive => {
                // Home the cursor, clear, repaint.
                write!(self.out, "\x1b[H\x1b[J{text}")?;
                self.out.flush()?;
            }
            OutputMode::Appending => {
                let total = text.chars().count();
                let stable = total.saturating_sub(TRAILING_MARGIN);
                if stable > self.committed {
                    self.emit_chars(text, stable)?;
                }
            }
            OutputMode::Lines => {
                writeln!(self.out, "{text}")?;
                self.out.flush()?;
            }
        }

        self.last = text.to_string();
        Ok(())
    }

    /// Present the final transcript and release the held-back tail.
    pub fn finish(&mut self, text: &str) -> io::Result<()> {
        match self.mode {
            OutputMode::Interactive => {
                write!(self.out, "\x1b[H\x1b[J{text}")?;
                writeln!(self.out)?;
            }
            OutputMode::Appending => {
                self.emit_chars(text, text.chars().count())?;
                writeln!(self.out)?;
            }
            OutputMode::Lines => {
                if text != self.last {
                    writeln!(self.out, "{text}")?;
                }
            }
        }
        self.out.flush()?;
        self.reset();
        Ok(())
    }

    /// Forget all presentation state, ready for an unrelated stream.
    pub fn reset(&mut self) {
        self.last.clear();
        self.committed = 0;
    }

    /// Emit characters `committed..upto` of `text` and advance the mark.
    ///
    /// Counted in characters, not bytes, so the margin never splits a
    /// multi-byte character.
    fn emit_chars(&mut self, text: &str, upto: usize) -> io::Result<()> {
        if upto <= self.committed {
            return Ok(());
        }
        let start = byte_offset(text, self.committed);
        let end = byte_offset(text, upto);
        write!(self.out, "{}", &text[start..end])?;
        self.out.flush()?;
        self.committed = upto;
        Ok(())
    }
}

/// Byte offset of the `n`-th character, or the text's length if shorter.
fn byte_offset(text: &str, n: usize) -> usize {
    text.char_indices()
        .nth(n)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn appending() -> Stabilizer<Vec<u8>> {
        Stabilizer::new(Vec::new(), OutputMode::Appending)
    }

    fn output(s: &Stabilizer<Vec<u8>>) -> String {
        String::from_utf8(s.out.clone()).unwrap()
    }

    // ---- change suppression ------------------------------------------------

    #[test]
    fn identical_snapshots_emit_nothing_twice() {
        let mut s = Stabilizer::new(Vec::new(), OutputMode::Lines);
        s.push("hello").unwrap();
        s.push("hello").unwrap();
        s.push("hello").unwrap();
        assert_eq!(output(&s), "hello\n");
    }

    #[test]
    fn interactive_repaints_on_each_change() {
        let mut s = Stabilizer::new(Vec::new(), OutputMode::Interactive);
        s.push("a").unwrap();
        s.push("ab").unwrap();
        assert_eq!(output(&s), "\x1b[H\x1b[Ja\x1b[H\x1b[Jab");
    }

    // ---- appending margin --------------------------------------------------

    #[test]
    fn appending_holds_back_trailing_margin() {
        let mut s = appending();
        s.push("hello world").unwrap(); // 11 chars, 1 past the margin
        assert_eq!(output(&s), "h");
        s.push("hello world again").unwrap(); // 17 chars → 7 stable
        assert_eq!(output(&s), "hello w");
    }

    #[test]
    fn appending_short_snapshot_emits_nothing() {
        let mut s = appending();
        s.push("short").unwrap();
        assert_eq!(output(&s), "");
    }

    #[test]
    fn finish_releases_the_tail_with_newline() {
        let mut s = appending();
        s.push("hello world").unwrap();
        s.finish("hello world").unwrap();
        assert_eq!(output(&s), "hello world\n");
    }

    #[test]
    fn committed_text_is_never_reemitted() {
        let mut s = appending();
        s.push("aaaaaaaaaaaaaaa").unwrap(); // 15 chars → 5 committed
        assert_eq!(output(&s), "aaaaa");
        // A shorter revision can't take committed text back.
        s.push("aaaa").unwrap();
        assert_eq!(output(&s), "aaaaa");
    }

    #[test]
    fn margin_counts_characters_not_bytes() {
        let mut s = appending();
        // 12 characters, multi-byte ones included → 2 stable.
        s.push("héllo wörld!").unwrap();
        assert_eq!(output(&s), "hé");
    }

    // ---- finish / reset ----------------------------------------------------

    #[test]
    fn reset_clears_suppression_and_margin_state() {
        let mut s = Stabilizer::new(Vec::new(), OutputMode::Lines);
        s.push("same").unwrap();
        s.reset();
        s.push("same").unwrap();
        assert_eq!(output(&s), "same\nsame\n");
    }

    #[test]
    fn lines_finish_skips_duplicate_final_text() {
        let mut s = Stabilizer::new(Vec::new(), OutputMode::Lines);
        s.push("done").unwrap();
        s.finish("done").unwrap();
        assert_eq!(output(&s), "done\n");
    }

    #[test]
    fn interactive_finish_ends_with_newline() {
        let mut s = Stabilizer::new(Vec::new(), OutputMode::Interactive);
        s.push("word").unwrap();
        s.finish("word done").unwrap();
        assert!(output(&s).ends_with("word done\n"));
    }
}
