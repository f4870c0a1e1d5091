//! Command-line driver
//!
//! Reads a G-code file, resolves the settings (settings file, or profile via
//! modeline, `--profile` or the default), annotates every layer and writes
//! the result to a file or standard output.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};

use crate::config::Config;
use crate::layers::{join_layers, split_layers};
use crate::pipeline::{Annotator, RunStats};
use crate::profile::{load_settings_file, ProfileManager};
use crate::settings::Settings;

/// Entry point of the `gcode-extrude` binary
pub fn run() -> Result<()> {
    let config = Config::from_args_and_env()?;
    init_logging(&config.log_level);
    execute(&config)
}

fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Carry out the command described by `config`
pub fn execute(config: &Config) -> Result<()> {
    let mut manager = ProfileManager::new(config);

    if config.list_profiles {
        manager.load_all()?;
        let mut stdout = io::stdout().lock();
        for name in manager.list_profile_names() {
            let description = manager
                .get_profile(name)
                .and_then(|loaded| loaded.profile.description.as_deref())
                .unwrap_or("");
            writeln!(stdout, "{name}\t{description}")?;
        }
        return Ok(());
    }

    let input = config.input.as_ref().context("No input file given")?;
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read G-code file: {}", input.display()))?;

    let (annotated, stats) = annotate(config, &mut manager, &content)
        .with_context(|| format!("Failed to annotate {}", input.display()))?;

    match &config.output {
        Some(path) => fs::write(path, annotated)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?,
        None => io::stdout()
            .lock()
            .write_all(annotated.as_bytes())
            .context("Failed to write to standard output")?,
    }

    log::info!("Annotated {}: {stats}", input.display());
    Ok(())
}

/// Annotate `content` with the settings `config` selects
pub fn annotate(
    config: &Config,
    manager: &mut ProfileManager,
    content: &str,
) -> Result<(String, RunStats)> {
    let mut settings = resolve_settings(config, manager, content)?;
    config.apply_overrides(&mut settings);

    let configuration = settings.compile().context("Invalid extruder settings")?;
    log::info!("Using {} strategy", configuration.mode_name());

    let layers = split_layers(content);
    let mut annotator = Annotator::new(configuration);
    let output = annotator.process(layers.as_slice())?;

    Ok((join_layers(&output), *annotator.stats()))
}

fn resolve_settings(
    config: &Config,
    manager: &mut ProfileManager,
    content: &str,
) -> Result<Settings> {
    if let Some(path) = &config.settings_file {
        log::info!("Using settings file {}", path.display());
        return load_settings_file(path);
    }

    manager.load_all()?;
    let (loaded, selection) = manager.effective_profile(content)?;
    log::info!(
        "Using profile '{}' ({selection:?}){}",
        loaded.profile.name,
        loaded
            .source_path
            .as_ref()
            .map(|path| format!(" from {}", path.display()))
            .unwrap_or_default()
    );
    Ok(loaded.profile.settings.clone())
}
