//! Annotation settings
//!
//! [`Settings`] is the user-facing, deserializable form (TOML profiles, or
//! JSON converted from the slicer plugin's key/value format). Compiling it
//! validates every field and parses the pin expressions, producing the
//! immutable [`Configuration`] a run is driven by.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::expr::{Env, PinExpression};
use crate::parser::normalize_code;
use crate::pins::PIN_COUNT;

pub const DEFAULT_COMMAND_CODES: &str = "G0 G1 G2 G3 G28";
pub const DEFAULT_MAXIMUM_EXTRUSION_RATE: f64 = 75.0;
pub const DEFAULT_STATIONARY_RATE: f64 = 15.0;

/// Default pin expressions: quantize the rate into 0..=14 and test one bit each
pub const DEFAULT_PIN_EXPRESSIONS: [&str; PIN_COUNT] = [
    "bool(int(round(min(max(0,(extrusion_rate/maximum_extrusion_rate)*14),14)))&0b0001)",
    "bool(int(round(min(max(0,(extrusion_rate/maximum_extrusion_rate)*14),14)))&0b0010)",
    "bool(int(round(min(max(0,(extrusion_rate/maximum_extrusion_rate)*14),14)))&0b0100)",
    "bool(int(round(min(max(0,(extrusion_rate/maximum_extrusion_rate)*14),14)))&0b1000)",
];

/// A whitespace separated string or a list of strings
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WordList {
    Words(String),
    List(Vec<String>),
}

impl WordList {
    pub fn words(&self) -> Vec<&str> {
        match self {
            WordList::Words(s) => s.split_whitespace().collect(),
            WordList::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl From<&str> for WordList {
    fn from(s: &str) -> Self {
        WordList::Words(s.to_string())
    }
}

/// Complete settings for one run
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Command codes whose lines are annotated
    pub command_codes: WordList,
    /// Emit G4 dwells for stationary extrusion and retractions
    pub dwell: bool,
    /// Attach the bit pattern comment to pin lines
    pub diagnostics: bool,
    /// Drop the E word from annotated lines
    pub remove_extrusion_axis: bool,
    /// Prepend a comment block listing these settings
    pub summary: bool,
    pub header: String,
    pub footer: String,
    pub strategy: StrategySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_codes: WordList::from(DEFAULT_COMMAND_CODES),
            dwell: true,
            diagnostics: true,
            remove_extrusion_axis: false,
            summary: false,
            header: "M63 P0 M63 P1 M63 P2 M63 P3; Stop Extruder Header".to_string(),
            footer: "M63 P0 M63 P1 M63 P2 M63 P3; Stop Extruder Footer".to_string(),
            strategy: StrategySettings::default(),
        }
    }
}

/// Which annotation strategy to run, with its own options
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum StrategySettings {
    BitExpression(BitExpressionSettings),
    StateChange(StateChangeSettings),
}

impl Default for StrategySettings {
    fn default() -> Self {
        StrategySettings::BitExpression(BitExpressionSettings::default())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BitExpressionSettings {
    /// Extrusion rate (mm/s) at which the pins encode full speed
    pub maximum_extrusion_rate: f64,
    /// One expression per pin, pin 0 first
    pub pins: [String; PIN_COUNT],
}

impl Default for BitExpressionSettings {
    fn default() -> Self {
        Self {
            maximum_extrusion_rate: DEFAULT_MAXIMUM_EXTRUSION_RATE,
            pins: DEFAULT_PIN_EXPRESSIONS.map(str::to_string),
        }
    }
}

/// When the state-change strategy inserts its snippets
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    EveryLine,
    #[default]
    OnChange,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StateChangeSettings {
    pub extruder_change: bool,
    pub forward: String,
    pub stopped: String,
    pub backwards: String,
    pub gantry_change: bool,
    pub gantry_moving: String,
    pub gantry_stopped: String,
    /// Axis words that count as gantry movement
    pub axes: WordList,
    /// Extrusion rate (mm/s) used to size dwells while the gantry is still
    pub stationary_rate: f64,
    pub frequency: Frequency,
}

impl Default for StateChangeSettings {
    fn default() -> Self {
        Self {
            extruder_change: true,
            forward: "M62 P1 M62 P0; Start Extruder".to_string(),
            stopped: "M63 P0; Stop Extruder".to_string(),
            backwards: "M63 P1 M62 P0; Start Retracting".to_string(),
            gantry_change: true,
            gantry_moving: "M62 P2; Gantry Moving".to_string(),
            gantry_stopped: "M63 P2; Gantry Stopped".to_string(),
            axes: WordList::from("X Y Z A B C"),
            stationary_rate: DEFAULT_STATIONARY_RATE,
            frequency: Frequency::OnChange,
        }
    }
}

/// Validated, immutable settings for a run
#[derive(Debug, Clone)]
pub struct Configuration {
    pub command_codes: BTreeSet<String>,
    pub dwell: bool,
    pub diagnostics: bool,
    pub remove_extrusion_axis: bool,
    pub summary: bool,
    pub header: String,
    pub footer: String,
    pub strategy: StrategyConfig,
}

#[derive(Debug, Clone)]
pub enum StrategyConfig {
    BitExpression(BitExpressionConfig),
    StateChange(StateChangeConfig),
}

#[derive(Debug, Clone)]
pub struct BitExpressionConfig {
    pub maximum_extrusion_rate: f64,
    pub pins: [PinExpression; PIN_COUNT],
}

#[derive(Debug, Clone)]
pub struct StateChangeConfig {
    pub extruder_change: bool,
    pub forward: String,
    pub stopped: String,
    pub backwards: String,
    pub gantry_change: bool,
    pub gantry_moving: String,
    pub gantry_stopped: String,
    pub axes: Vec<String>,
    pub stationary_rate: f64,
    pub frequency: Frequency,
}

impl Settings {
    /// Validate and compile into a [`Configuration`]
    pub fn compile(&self) -> Result<Configuration, ConfigError> {
        let command_codes = self
            .command_codes
            .words()
            .into_iter()
            .map(|word| {
                normalize_code(word)
                    .ok_or_else(|| ConfigError::InvalidCommandCode(word.to_string()))
            })
            .collect::<Result<BTreeSet<_>, _>>()?;
        if command_codes.is_empty() {
            return Err(ConfigError::NoCommandCodes);
        }

        let strategy = match &self.strategy {
            StrategySettings::BitExpression(bits) => {
                StrategyConfig::BitExpression(bits.compile()?)
            }
            StrategySettings::StateChange(state) => StrategyConfig::StateChange(state.compile()?),
        };

        Ok(Configuration {
            command_codes,
            dwell: self.dwell,
            diagnostics: self.diagnostics,
            remove_extrusion_axis: self.remove_extrusion_axis,
            summary: self.summary,
            header: self.header.clone(),
            footer: self.footer.clone(),
            strategy,
        })
    }
}

impl BitExpressionSettings {
    pub(crate) fn compile(&self) -> Result<BitExpressionConfig, ConfigError> {
        let max = self.maximum_extrusion_rate;
        if !(max.is_finite() && max > 0.0) {
            return Err(ConfigError::InvalidMaximumRate(max));
        }

        let compile = |pin: usize, source: &str| -> Result<PinExpression, ConfigError> {
            let expression = PinExpression::compile(source).map_err(|source_err| {
                ConfigError::Expression {
                    pin,
                    expression: source.to_string(),
                    source: source_err,
                }
            })?;

            // Probe once at full rate so type errors surface before the first line
            let probe = Env {
                extrusion_rate: max,
                maximum_extrusion_rate: max,
            };
            expression
                .evaluate(&probe)
                .map_err(|eval_err| ConfigError::ExpressionProbe {
                    pin,
                    expression: source.to_string(),
                    source: eval_err,
                })?;
            Ok(expression)
        };

        let [p0, p1, p2, p3] = &self.pins;
        Ok(BitExpressionConfig {
            maximum_extrusion_rate: max,
            pins: [
                compile(0, p0)?,
                compile(1, p1)?,
                compile(2, p2)?,
                compile(3, p3)?,
            ],
        })
    }
}

impl StateChangeSettings {
    pub(crate) fn compile(&self) -> Result<StateChangeConfig, ConfigError> {
        let rate = self.stationary_rate;
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ConfigError::InvalidStationaryRate(rate));
        }

        Ok(StateChangeConfig {
            extruder_change: self.extruder_change,
            forward: self.forward.clone(),
            stopped: self.stopped.clone(),
            backwards: self.backwards.clone(),
            gantry_change: self.gantry_change,
            gantry_moving: self.gantry_moving.clone(),
            gantry_stopped: self.gantry_stopped.clone(),
            axes: self.axes.words().into_iter().map(str::to_string).collect(),
            stationary_rate: rate,
            frequency: self.frequency,
        })
    }
}

impl Configuration {
    pub fn mode_name(&self) -> &'static str {
        match self.strategy {
            StrategyConfig::BitExpression(_) => "bit-expression",
            StrategyConfig::StateChange(_) => "state-change",
        }
    }

    /// Comment block describing the active settings, one `;` line each
    pub fn summary_block(&self) -> String {
        let mut out = String::new();
        let codes: Vec<&str> = self.command_codes.iter().map(String::as_str).collect();

        let _ = writeln!(out, ";GCode edited with gcode-extrude {}", env!("CARGO_PKG_VERSION"));
        let _ = writeln!(out, ";   mode: {}", self.mode_name());
        match &self.strategy {
            StrategyConfig::BitExpression(bits) => {
                let _ = writeln!(
                    out,
                    ";   maximum_extrusion_rate: {}",
                    bits.maximum_extrusion_rate
                );
                for (pin, expression) in bits.pins.iter().enumerate() {
                    let _ = writeln!(out, ";   pin {pin}: {}", expression.source());
                }
            }
            StrategyConfig::StateChange(state) => {
                let _ = writeln!(out, ";   forward: {}", state.forward);
                let _ = writeln!(out, ";   stopped: {}", state.stopped);
                let _ = writeln!(out, ";   backwards: {}", state.backwards);
                let _ = writeln!(out, ";   gantry_moving: {}", state.gantry_moving);
                let _ = writeln!(out, ";   gantry_stopped: {}", state.gantry_stopped);
                let _ = writeln!(out, ";   axes: {}", state.axes.join(" "));
                let _ = writeln!(out, ";   stationary_rate: {}", state.stationary_rate);
                let _ = writeln!(out, ";   frequency: {:?}", state.frequency);
            }
        }
        let _ = writeln!(out, ";   dwell: {}", self.dwell);
        let _ = writeln!(out, ";   remove_extrusion_axis: {}", self.remove_extrusion_axis);
        let _ = writeln!(out, ";   command_codes: {}", codes.join(" "));
        let _ = writeln!(out, ";   header: {}", self.header);
        let _ = writeln!(out, ";   footer: {}", self.footer);
        out
    }
}
