//! Configuration management for the annotator command line.
//!
//! Handles:
//! - Command-line argument parsing
//! - Profile directory configuration
//! - Overrides applied on top of the selected settings

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::profile::ProfilePriority;
use crate::settings::{Settings, StrategySettings};

/// Command-line arguments for the annotator
#[derive(Debug, Parser)]
#[command(name = "gcode-extrude")]
#[command(about = "Annotate slicer G-code with external extruder pin toggles and dwells")]
#[command(version)]
pub struct Args {
    /// G-code file to annotate
    #[arg(required_unless_present = "list_profiles")]
    pub input: Option<PathBuf>,

    /// Output file; standard output when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Explicitly specify the extruder profile to use
    #[arg(long, help = "Extruder profile to use (e.g., 'bit-expression', 'state-change')")]
    pub profile: Option<String>,

    /// Settings file that bypasses profile lookup
    #[arg(long, help = "Settings file (.toml, or .json in the slicer plugin format)")]
    pub settings: Option<PathBuf>,

    /// Custom profile directory to search for profile files
    #[arg(long, help = "Directory containing profile TOML files")]
    pub profile_dir: Option<PathBuf>,

    /// Override the maximum extrusion rate (mm/s) of the bit-expression strategy
    #[arg(long)]
    pub max_rate: Option<f64>,

    /// Do not insert dwell instructions
    #[arg(long)]
    pub no_dwell: bool,

    /// List the available profiles and exit
    #[arg(long)]
    pub list_profiles: bool,

    /// Log level
    #[arg(
        long,
        default_value = "info",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Profile name explicitly set via command line
    pub cli_profile: Option<String>,
    pub settings_file: Option<PathBuf>,
    /// Profile directories to search, lowest priority first
    pub profile_dirs: Vec<(PathBuf, ProfilePriority)>,
    pub max_rate: Option<f64>,
    pub no_dwell: bool,
    pub list_profiles: bool,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let mut profile_dirs = Vec::new();

        // User global directory: ~/.config/gcode-extrude/profiles/
        if let Some(config_dir) = dirs::config_dir() {
            profile_dirs.push((
                config_dir.join("gcode-extrude").join("profiles"),
                ProfilePriority::UserGlobal,
            ));
        }

        // Current workspace directory: ./.gcode-extrude/profiles/
        let workspace_dir = std::env::current_dir()?
            .join(".gcode-extrude")
            .join("profiles");
        profile_dirs.push((workspace_dir, ProfilePriority::Workspace));

        if let Some(custom_dir) = args.profile_dir {
            profile_dirs.push((custom_dir, ProfilePriority::Custom));
        }

        Ok(Config {
            input: args.input,
            output: args.output,
            cli_profile: args.profile,
            settings_file: args.settings,
            profile_dirs,
            max_rate: args.max_rate,
            no_dwell: args.no_dwell,
            list_profiles: args.list_profiles,
            log_level: args.log_level,
        })
    }

    /// Apply command-line overrides to the selected settings
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if self.no_dwell {
            settings.dwell = false;
        }

        if let Some(rate) = self.max_rate {
            match &mut settings.strategy {
                StrategySettings::BitExpression(bits) => bits.maximum_extrusion_rate = rate,
                StrategySettings::StateChange(_) => {
                    log::warn!("--max-rate has no effect on the state-change strategy")
                }
            }
        }
    }
}
