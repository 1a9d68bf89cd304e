//! The streaming decode loop.
//!
//! One invocation owns one source, one decode session and one stabilizer,
//! and runs strictly sequentially: pull a window, feed it, ask for an
//! incremental transcript, render, repeat.  There is no overlap between
//! acquisition and decoding, so output latency is bounded by one window's
//! capture time plus one decode.
//!
//! The loop ends when the source is exhausted (files), when the optional
//! debug-capture buffer reaches its configured duration, or when the
//! device reports a read error.  All endings drain the same way: one
//! final decode, final render, capture flushed to disk.  A read error is
//! still reported to the caller after the drain so the process exits
//! non-zero.

use std::io::Write;

use crate::audio::{self, AudioBuffer, AudioSource, LiveCapture};
use crate::config::{CaptureConfig, Config};
use crate::pipeline::PipelineError;
use crate::stt::{DecodeResult, SpeechEngine, ENGINE_SAMPLE_RATE};
use crate::transcript::{flatten, Stabilizer};

// ---------------------------------------------------------------------------
// CaptureBuffer
// ---------------------------------------------------------------------------

/// Collects the audio fed to the decoder, up to a fixed sample budget,
/// for a debug WAV dump.
pub struct CaptureBuffer {
    samples: Vec<i16>,
    budget: usize,
    file: std::path::PathBuf,
}

impl CaptureBuffer {
    pub fn new(config: &CaptureConfig) -> Self {
        Self {
            samples: Vec::with_capacity(config.samples),
            budget: config.samples,
            file: config.file.clone(),
        }
    }

    /// Append a window, truncated at the budget.
    pub fn append(&mut self, window: &[i16]) {
        let room = self.budget - self.samples.len();
        self.samples.extend_from_slice(&window[..window.len().min(room)]);
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.budget
    }

    /// Write whatever was collected as a mono engine-rate WAV file.
    pub fn flush(self) -> Result<(), PipelineError> {
        log::info!(
            "writing {} captured samples to {}",
            self.samples.len(),
            self.file.display()
        );
        let buffer = AudioBuffer::from_samples(ENGINE_SAMPLE_RATE, 1, self.samples);
        audio::wav::save(&self.file, &buffer)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// run_stream
// ---------------------------------------------------------------------------

/// Drive `source` through `engine` until it ends, rendering incremental
/// transcripts via `stabilizer`.  Returns the final decode result.
pub fn run_stream<W: Write>(
    source: &mut dyn AudioSource,
    engine: &dyn SpeechEngine,
    stabilizer: &mut Stabilizer<W>,
    window_size: usize,
    candidates: usize,
    capture: Option<&CaptureConfig>,
) -> Result<DecodeResult, PipelineError> {
    let mut session = engine.session()?;
    let mut window = vec![0i16; window_size];
    let mut capture_buf = capture.map(CaptureBuffer::new);
    let mut read_error = None;

    loop {
        let pulled = match source.pull(&mut window) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                // Treated as an intentional stop (e.g. the device went
                // away on user interrupt); drain before reporting it.
                log::warn!("capture ended: {e}");
                read_error = Some(e);
                break;
            }
        };

        session.feed(&window[..pulled]);
        if let Some(cap) = &mut capture_buf {
            cap.append(&window[..pulled]);
            if cap.is_full() {
                break;
            }
        }

        let partial = session.decode_incremental()?;
        stabilizer.push(&flatten(&partial))?;

        if pulled < window.len() {
            break;
        }
    }

    let result = session.decode_final(candidates)?;
    stabilizer.finish(&flatten(result.best()))?;

    if let Some(cap) = capture_buf {
        cap.flush()?;
    }
    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(result),
    }
}

/// Open the configured live source and stream it to stdout until the
/// capture duration runs out or the device stops.
pub fn transcribe_live(config: &Config, engine: &dyn SpeechEngine) -> Result<(), PipelineError> {
    let mut capture = LiveCapture::open(&config.source, ENGINE_SAMPLE_RATE)?;
    let mut stabilizer = Stabilizer::for_stdout();
    log::debug!(
        "live stream: window {} samples, output {:?}",
        config.source_buffer_size,
        stabilizer.mode()
    );
    run_stream(
        &mut capture,
        engine,
        &mut stabilizer,
        config.source_buffer_size,
        1,
        config.capture.as_ref(),
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
