//! Configuration: CLI flags, persistent settings and their resolution
//! into the validated [`Config`] the pipeline runs on.

pub mod cli;
pub mod discovery;
pub mod paths;
pub mod resolve;
pub mod settings;

pub use cli::Cli;
pub use paths::AppPaths;
pub use resolve::{
    resolve, CaptureConfig, Config, ConfigError, OutputFormat, StreamChunk,
    DEFAULT_CANDIDATES, DEFAULT_SOURCE_BUFFER_SIZE,
};
pub use settings::Settings;
