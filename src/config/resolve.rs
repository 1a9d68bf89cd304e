//! Flag-to-configuration resolution.
//!
//! Everything the pipeline needs is decided here, before any audio device
//! or model file is touched: the source, the model path, window sizes and
//! output shape.  A [`Config`] that comes out of [`resolve`] is valid;
//! the pipeline never re-checks these invariants.

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::SourceSpec;
use crate::config::{discovery, settings::Settings, AppPaths, Cli};
use crate::stt::{ENGINE_FRAME_SIZE, ENGINE_SAMPLE_RATE};

/// Default decode window: four engine frames (40 ms at 16 kHz).
pub const DEFAULT_SOURCE_BUFFER_SIZE: usize = ENGINE_FRAME_SIZE * 4;

/// Default candidate-transcript count for JSON output.
pub const DEFAULT_CANDIDATES: usize = 3;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// How batch results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Flattened text with silence-derived line breaks.
    Plain,
    /// Per-token text and timings.
    Extended,
    /// Word timings as JSON.
    Json,
}

/// File streaming requested via `--stream-size` / `--extended-stream-size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamChunk {
    /// Samples per chunk fed to the incremental decoder.
    pub size: usize,
    /// Keep token metadata in the final result.
    pub extended: bool,
}

/// Debug capture of the audio fed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    pub file: PathBuf,
    /// Capture stops (and a live session ends) after this many samples.
    pub samples: usize,
}

/// The resolved, validated configuration the pipeline runs on.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: SourceSpec,
    pub model_path: PathBuf,
    /// ISO-639-1 decode language; `None` lets the engine detect it.
    pub decode_language: Option<String>,
    /// Samples per live decode window; positive multiple of
    /// [`ENGINE_FRAME_SIZE`].
    pub source_buffer_size: usize,
    /// When set, batch files run through the streaming loop.
    pub stream_chunk: Option<StreamChunk>,
    pub output: OutputFormat,
    /// Candidate transcripts requested from final decodes.
    pub candidates: usize,
    pub show_times: bool,
    pub capture: Option<CaptureConfig>,
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    // Field is deliberately not called `source`: thiserror reserves that
    // name for the error cause.
    #[error("--source {name} cannot be combined with file arguments")]
    SourceWithFiles { name: String },

    #[error("--source file requires at least one file argument")]
    NoFiles,

    #[error(
        "{flag} value {size} is not a positive multiple of the engine \
         frame size ({frame} samples)"
    )]
    BadWindowSize {
        flag: &'static str,
        size: usize,
        frame: usize,
    },

    #[error("--stream-capture-file requires --stream-capture-duration greater than zero")]
    CaptureDurationMissing,

    #[error("model file not found: {}", .0.display())]
    ModelUnreadable(PathBuf),

    #[error(
        "no model found for language '{language}' under {}; install one or \
         pass --model",
        .searched.display()
    )]
    ModelNotFound {
        language: String,
        searched: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

/// Combine CLI flags with `settings.toml` defaults into a [`Config`].
pub fn resolve(cli: &Cli, settings: &Settings) -> Result<Config, ConfigError> {
    let source = resolve_source(cli)?;

    let source_buffer_size = cli
        .source_buffer_size
        .or(settings.source_buffer_size)
        .unwrap_or(DEFAULT_SOURCE_BUFFER_SIZE);
    check_window("--source-buffer-size", source_buffer_size)?;

    let stream_chunk = resolve_stream_chunk(cli)?;

    let output = if cli.extended_metadata {
        OutputFormat::Extended
    } else if cli.json_output {
        OutputFormat::Json
    } else {
        OutputFormat::Plain
    };

    let candidates = cli
        .json_candidate_transcripts
        .or(settings.json_candidate_transcripts)
        .unwrap_or(DEFAULT_CANDIDATES)
        .max(1);

    let capture = resolve_capture(cli)?;

    let language = cli
        .language
        .clone()
        .or_else(|| settings.language.clone())
        .unwrap_or_else(language_from_env);
    let decode_language = match discovery::primary_tag(&language) {
        "auto" | "" => None,
        tag => Some(tag.to_string()),
    };

    let model_path = resolve_model(cli, settings, &language)?;

    Ok(Config {
        source,
        model_path,
        decode_language,
        source_buffer_size,
        stream_chunk,
        output,
        candidates,
        show_times: cli.show_times,
        capture,
    })
}

/// `--source` / file-argument consistency rules.
fn resolve_source(cli: &Cli) -> Result<SourceSpec, ConfigError> {
    let live = |spec: SourceSpec, name: &str| {
        if cli.files.is_empty() {
            Ok(spec)
        } else {
            Err(ConfigError::SourceWithFiles {
                name: name.to_string(),
            })
        }
    };

    match cli.source.as_deref() {
        None if cli.files.is_empty() => Ok(SourceSpec::Microphone),
        None => Ok(SourceSpec::FileList(cli.files.clone())),
        Some("mic") => live(SourceSpec::Microphone, "mic"),
        Some("system") => live(SourceSpec::SystemMonitor, "system"),
        Some("file") => {
            if cli.files.is_empty() {
                Err(ConfigError::NoFiles)
            } else {
                Ok(SourceSpec::FileList(cli.files.clone()))
            }
        }
        Some(device) => live(SourceSpec::NamedDevice(device.to_string()), device),
    }
}

fn resolve_stream_chunk(cli: &Cli) -> Result<Option<StreamChunk>, ConfigError> {
    if cli.extended_stream_size > 0 {
        check_window("--extended-stream-size", cli.extended_stream_size)?;
        return Ok(Some(StreamChunk {
            size: cli.extended_stream_size,
            extended: true,
        }));
    }
    if cli.stream_size > 0 {
        check_window("--stream-size", cli.stream_size)?;
        return Ok(Some(StreamChunk {
            size: cli.stream_size,
            extended: false,
        }));
    }
    Ok(None)
}

fn resolve_capture(cli: &Cli) -> Result<Option<CaptureConfig>, ConfigError> {
    match (&cli.stream_capture_file, cli.stream_capture_duration) {
        (Some(file), Some(secs)) if secs > 0.0 => Ok(Some(CaptureConfig {
            file: file.clone(),
            samples: (secs * ENGINE_SAMPLE_RATE as f32) as usize,
        })),
        (Some(_), _) => Err(ConfigError::CaptureDurationMissing),
        (None, Some(_)) => {
            log::warn!("--stream-capture-duration has no effect without --stream-capture-file");
            Ok(None)
        }
        (None, None) => Ok(None),
    }
}

fn resolve_model(
    cli: &Cli,
    settings: &Settings,
    language: &str,
) -> Result<PathBuf, ConfigError> {
    if let Some(path) = cli.model.clone().or_else(|| settings.model.clone()) {
        return if path.is_file() {
            Ok(path)
        } else {
            Err(ConfigError::ModelUnreadable(path))
        };
    }

    let languages_dir = cli
        .languages_dir
        .clone()
        .or_else(|| settings.languages_dir.clone())
        .unwrap_or_else(|| AppPaths::new().languages_dir);

    discovery::find_model(&languages_dir, language).ok_or(ConfigError::ModelNotFound {
        language: language.to_string(),
        searched: languages_dir,
    })
}

fn check_window(flag: &'static str, size: usize) -> Result<(), ConfigError> {
    if size == 0 || size % ENGINE_FRAME_SIZE != 0 {
        return Err(ConfigError::BadWindowSize {
            flag,
            size,
            frame: ENGINE_FRAME_SIZE,
        });
    }
    Ok(())
}

/// `$LANG` with the encoding suffix stripped: `en_US.UTF-8` → `en_US`.
fn language_from_env() -> String {
    std::env::var("LANG")
        .ok()
        .and_then(|lang| {
            let tag = lang.split('.').next().unwrap_or("").to_string();
            if tag.is_empty() || tag == "C" || tag == "POSIX" {
                None
            } else {
                Some(tag)
            }
        })
        .unwrap_or_else(|| "en".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// A Cli with an explicit model file, so resolution never touches the
    /// environment or the real filesystem layout.
    fn cli_with_model(dir: &std::path::Path) -> Cli {
        let model = dir.join("model.bin");
        std::fs::write(&model, b"").unwrap();
        Cli {
            model: Some(model),
            language: Some("en".into()),
            ..Default::default()
        }
    }

    fn resolve_ok(cli: &Cli) -> Config {
        resolve(cli, &Settings::default()).expect("config resolves")
    }

    // ---- source rules ------------------------------------------------------

    #[test]
    fn no_source_no_files_defaults_to_mic() {
        let dir = tempdir().unwrap();
        let cli = cli_with_model(dir.path());
        assert_eq!(resolve_ok(&cli).source, SourceSpec::Microphone);
    }

    #[test]
    fn no_source_with_files_defaults_to_file_list() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.files = vec!["a.wav".into()];
        assert_eq!(
            resolve_ok(&cli).source,
            SourceSpec::FileList(vec!["a.wav".into()])
        );
    }

    #[test]
    fn live_source_with_files_is_an_error() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.source = Some("mic".into());
        cli.files = vec!["a.wav".into()];
        let err = resolve(&cli, &Settings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::SourceWithFiles { .. }));
        assert!(err.to_string().contains("--source mic"));
        // The conflict is a configuration error, not a wrapped cause.
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn file_source_without_files_is_an_error() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.source = Some("file".into());
        let err = resolve(&cli, &Settings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoFiles));
    }

    #[test]
    fn unknown_source_becomes_named_device() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.source = Some("hw:CARD=Usb".into());
        assert_eq!(
            resolve_ok(&cli).source,
            SourceSpec::NamedDevice("hw:CARD=Usb".into())
        );
    }

    #[test]
    fn system_source_resolves_to_monitor() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.source = Some("system".into());
        assert_eq!(resolve_ok(&cli).source, SourceSpec::SystemMonitor);
    }

    // ---- window sizes ------------------------------------------------------

    #[test]
    fn default_buffer_size_is_four_frames() {
        let dir = tempdir().unwrap();
        let cli = cli_with_model(dir.path());
        assert_eq!(resolve_ok(&cli).source_buffer_size, 640);
    }

    #[test]
    fn buffer_size_must_be_frame_multiple() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.source_buffer_size = Some(500);
        let err = resolve(&cli, &Settings::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::BadWindowSize { size: 500, .. }
        ));
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.source_buffer_size = Some(0);
        assert!(resolve(&cli, &Settings::default()).is_err());
    }

    #[test]
    fn extended_stream_size_takes_precedence() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.stream_size = 320;
        cli.extended_stream_size = 480;
        let chunk = resolve_ok(&cli).stream_chunk.unwrap();
        assert_eq!(chunk.size, 480);
        assert!(chunk.extended);
    }

    #[test]
    fn stream_size_must_be_frame_multiple_too() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.stream_size = 100;
        assert!(resolve(&cli, &Settings::default()).is_err());
    }

    // ---- capture -----------------------------------------------------------

    #[test]
    fn capture_file_requires_duration() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.stream_capture_file = Some("/tmp/cap.wav".into());
        let err = resolve(&cli, &Settings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::CaptureDurationMissing));
    }

    #[test]
    fn capture_duration_converts_to_samples() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.stream_capture_file = Some("/tmp/cap.wav".into());
        cli.stream_capture_duration = Some(2.5);
        let capture = resolve_ok(&cli).capture.unwrap();
        assert_eq!(capture.samples, 40_000);
    }

    // ---- output / model ----------------------------------------------------

    #[test]
    fn extended_beats_json() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.json_output = true;
        cli.extended_metadata = true;
        assert_eq!(resolve_ok(&cli).output, OutputFormat::Extended);
    }

    #[test]
    fn missing_explicit_model_is_an_error() {
        let dir = tempdir().unwrap();
        let cli = Cli {
            model: Some(dir.path().join("absent.bin")),
            language: Some("en".into()),
            ..Default::default()
        };
        let err = resolve(&cli, &Settings::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ModelUnreadable(_)));
    }

    #[test]
    fn model_discovered_from_languages_dir() {
        let root = tempdir().unwrap();
        let lang_dir = root.path().join("models/en");
        std::fs::create_dir_all(&lang_dir).unwrap();
        std::fs::write(lang_dir.join("tiny.bin"), b"").unwrap();

        let cli = Cli {
            language: Some("en".into()),
            languages_dir: Some(root.path().join("models")),
            ..Default::default()
        };
        let config = resolve_ok(&cli);
        assert!(config.model_path.ends_with("en/tiny.bin"));
    }

    #[test]
    fn discovery_failure_names_language_and_dir() {
        let root = tempdir().unwrap();
        let cli = Cli {
            language: Some("xx".into()),
            languages_dir: Some(root.path().to_path_buf()),
            ..Default::default()
        };
        let err = resolve(&cli, &Settings::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("xx"));
        assert!(msg.contains("--model"));
    }

    #[test]
    fn auto_language_disables_decode_language() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.language = Some("auto".into());
        assert!(resolve_ok(&cli).decode_language.is_none());
    }

    #[test]
    fn regional_language_keeps_primary_tag_for_decode() {
        let dir = tempdir().unwrap();
        let mut cli = cli_with_model(dir.path());
        cli.language = Some("de_DE".into());
        assert_eq!(resolve_ok(&cli).decode_language.as_deref(), Some("de"));
    }
}
