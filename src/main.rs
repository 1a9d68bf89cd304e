use anyhow::Result;
use clap::Parser;

use voxcat::audio::{self, SourceSpec};
use voxcat::config::{self, Cli, Settings};
use voxcat::pipeline;
use voxcat::stt::WhisperEngine;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run() {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_devices {
        for name in audio::list_input_devices() {
            println!("{name}");
        }
        return Ok(());
    }

    let settings = Settings::load()?;
    let config = config::resolve(&cli, &settings)?;

    let engine = WhisperEngine::load(&config.model_path, config.decode_language.clone())?;

    match &config.source {
        SourceSpec::FileList(paths) => pipeline::transcribe_files(&config, &engine, paths)?,
        _ => pipeline::transcribe_live(&config, &engine)?,
    }
    Ok(())
}
