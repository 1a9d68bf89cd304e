//! Persistent defaults, loaded from `settings.toml`.
//!
//! The settings file supplies defaults for the options a user would
//! otherwise repeat on every invocation; every field is optional and any
//! command-line flag overrides it.  A missing file is not an error.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::AppPaths;

/// User defaults, serialised as `settings.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Default transcription language (e.g. `"en"`, `"de_DE"`, `"auto"`).
    pub language: Option<String>,
    /// Default directory holding per-language model subdirectories.
    pub languages_dir: Option<PathBuf>,
    /// Default model file, skipping discovery.
    pub model: Option<PathBuf>,
    /// Default samples per decode window.
    pub source_buffer_size: Option<usize>,
    /// Default candidate-transcript count for JSON output.
    pub json_candidate_transcripts: Option<usize>,
}

impl Settings {
    /// Load settings from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(Settings::default())` when the file does not exist so
    /// callers never need to special-case a missing file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let settings = Settings::load_from(&dir.path().join("nope.toml")).expect("load");
        assert!(settings.language.is_none());
        assert!(settings.model.is_none());
        assert!(settings.source_buffer_size.is_none());
    }

    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = Settings {
            language: Some("de".into()),
            languages_dir: Some("/opt/models".into()),
            model: None,
            source_buffer_size: Some(1_600),
            json_candidate_transcripts: Some(5),
        };
        original.save_to(&path).expect("save");

        let loaded = Settings::load_from(&path).expect("load");
        assert_eq!(loaded.language.as_deref(), Some("de"));
        assert_eq!(loaded.languages_dir, Some("/opt/models".into()));
        assert_eq!(loaded.source_buffer_size, Some(1_600));
        assert_eq!(loaded.json_candidate_transcripts, Some(5));
    }

    #[test]
    fn partial_file_fills_remaining_fields_with_none() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "language = \"en\"\n").expect("write");

        let loaded = Settings::load_from(&path).expect("load");
        assert_eq!(loaded.language.as_deref(), Some("en"));
        assert!(loaded.languages_dir.is_none());
        assert!(loaded.json_candidate_transcripts.is_none());
    }
}
