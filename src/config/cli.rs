//! Command-line interface, parsed with `clap`'s derive API.
//!
//! Flags are the raw user input; [`crate::config::resolve`] turns them
//! (plus `settings.toml` defaults) into a validated [`crate::config::Config`].

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "voxcat",
    version,
    about = "Streaming speech-to-text for the terminal",
    long_about = "Transcribes the microphone, system audio or WAV files.\n\
                  Live transcripts repaint in place on a terminal and stream\n\
                  append-only when piped."
)]
pub struct Cli {
    /// Audio source: `mic`, `system`, `file`, or a capture device name.
    #[arg(long)]
    pub source: Option<String>,

    /// Model file to load, skipping per-language discovery.
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Transcription language (e.g. `en`, `de_DE`, `auto`); defaults to $LANG.
    #[arg(long)]
    pub language: Option<String>,

    /// Directory holding per-language model subdirectories.
    #[arg(long)]
    pub languages_dir: Option<PathBuf>,

    /// Samples pulled per live decode window; must be a multiple of 160.
    #[arg(long)]
    pub source_buffer_size: Option<usize>,

    /// Stream files through the incremental decoder in chunks of this many
    /// samples instead of one whole-buffer decode (0 = off).
    #[arg(long, default_value_t = 0)]
    pub stream_size: usize,

    /// Like --stream-size, but the final result keeps token metadata
    /// (0 = off).
    #[arg(long, default_value_t = 0)]
    pub extended_stream_size: usize,

    /// Emit word timings as JSON instead of plain text (batch mode).
    #[arg(long)]
    pub json_output: bool,

    /// Emit per-token text and timings instead of plain text (batch mode).
    #[arg(long)]
    pub extended_metadata: bool,

    /// Candidate transcripts to include in JSON output.
    #[arg(long)]
    pub json_candidate_transcripts: Option<usize>,

    /// Report per-file decode wall-clock time on stderr.
    #[arg(long)]
    pub show_times: bool,

    /// Write the audio that was fed to the decoder to this WAV file.
    #[arg(long)]
    pub stream_capture_file: Option<PathBuf>,

    /// Seconds of audio to keep in the capture file; capture (and a live
    /// session) stops when this much audio has been collected.
    #[arg(long)]
    pub stream_capture_duration: Option<f32>,

    /// List capture devices and exit.
    #[arg(long)]
    pub list_devices: bool,

    /// WAV files (or directories of WAV files) to transcribe.
    pub files: Vec<PathBuf>,
}
