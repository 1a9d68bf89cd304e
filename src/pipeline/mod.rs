//! The decode pipelines: live/file streaming and whole-file batch.

pub mod batch;
pub mod runner;

use thiserror::Error;

use crate::audio::{SourceError, WavError};
use crate::stt::EngineError;

pub use batch::transcribe_files;
pub use runner::{run_stream, transcribe_live, CaptureBuffer};

/// Anything that can end a transcription run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Wav(#[from] WavError),

    #[error("writing output failed: {0}")]
    Output(#[from] std::io::Error),

    #[error("rendering JSON output failed: {0}")]
    Json(#[from] serde_json::Error),
}
