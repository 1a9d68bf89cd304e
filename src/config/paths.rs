//! Cross-platform application paths using the `dirs` crate.
//!
//! Layout:
//!
//! Config dir (settings):
//!   Windows: %APPDATA%\voxcat\
//!   macOS:   ~/Library/Application Support/voxcat/
//!   Linux:   ~/.config/voxcat/
//!
//! Data dir (models, one subdirectory per language):
//!   Windows: %LOCALAPPDATA%\voxcat\
//!   macOS:   ~/Library/Application Support/voxcat/
//!   Linux:   ~/.local/share/voxcat/

use std::path::PathBuf;

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.toml`.
    pub config_dir: PathBuf,
    /// Full path to `settings.toml`.
    pub settings_file: PathBuf,
    /// Directory holding per-language model subdirectories
    /// (`<languages_dir>/en/model.bin`).
    pub languages_dir: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "voxcat";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);

        let settings_file = config_dir.join("settings.toml");
        let languages_dir = data_dir.join("models");

        Self {
            config_dir,
            settings_file,
            languages_dir,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
