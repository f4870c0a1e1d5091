//! External Extruder Annotator
//!
//! Annotates slicer G-code so that an external extruder driven by digital
//! output pins follows the print head.
//!
//! This library provides:
//! - Reversible G-code line parsing and axis extraction
//! - Kinematic state tracking (extrusion mode, positions, feed rates)
//! - A sandboxed pin expression language
//! - Bit-expression and state-change annotation strategies
//! - Profile and settings management

pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod layers;
pub mod motion;
pub mod parser;
pub mod pins;
pub mod pipeline;
pub mod profile;
pub mod settings;
pub mod strategy;

// Re-exports for clean public API
pub use config::Config;
pub use error::{ConfigError, LineError, TransformError};
pub use parser::{parse_line, ParsedLine};
pub use pipeline::{transform, Annotator, RunStats};
pub use profile::{Profile, ProfileManager};
pub use settings::{Configuration, Settings};
