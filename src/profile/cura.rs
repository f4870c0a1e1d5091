//! Slicer plugin settings
//!
//! The Cura post-processing scripts store their options as a flat JSON object
//! of upper-case keys. Both script variants are understood; the presence of a
//! per-pin expression key selects the bit-expression strategy.

use serde::Deserialize;

use crate::settings::{
    BitExpressionSettings, Frequency, Settings, StateChangeSettings, StrategySettings, WordList,
};

/// Flat key/value settings as exported by the slicer plugin
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CuraSettings {
    #[serde(rename = "EXRD_FORWARD_MAX")]
    pub forward_max: Option<f64>,
    #[serde(rename = "EXRD_FORWARD_b0")]
    pub forward_b0: Option<String>,
    #[serde(rename = "EXRD_FORWARD_b1")]
    pub forward_b1: Option<String>,
    #[serde(rename = "EXRD_FORWARD_b2")]
    pub forward_b2: Option<String>,
    #[serde(rename = "EXRD_FORWARD_b3")]
    pub forward_b3: Option<String>,

    #[serde(rename = "EXRD_")]
    pub extruder_change: Option<bool>,
    #[serde(rename = "EXRD_FORWARD")]
    pub forward: Option<String>,
    #[serde(rename = "EXRD_STOPPED")]
    pub stopped: Option<String>,
    #[serde(rename = "EXRD_BACKWARDS")]
    pub backwards: Option<String>,
    #[serde(rename = "GANT_")]
    pub gantry_change: Option<bool>,
    #[serde(rename = "GANT_MOVING")]
    pub gantry_moving: Option<String>,
    #[serde(rename = "GANT_STOPPED")]
    pub gantry_stopped: Option<String>,
    #[serde(rename = "AXES")]
    pub axes: Option<String>,
    #[serde(rename = "DWELL_EXTR_SPEED")]
    pub dwell_extrusion_speed: Option<f64>,
    #[serde(rename = "REMOVE_E")]
    pub remove_e: Option<bool>,
    #[serde(rename = "GCODE_FREQ")]
    pub frequency: Option<CuraFrequency>,

    #[serde(rename = "DWELL")]
    pub dwell: Option<bool>,
    #[serde(rename = "CODES")]
    pub codes: Option<String>,
    #[serde(rename = "HEADER")]
    pub header: Option<String>,
    #[serde(rename = "FOOTER")]
    pub footer: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum CuraFrequency {
    #[serde(rename = "EVERYLINE")]
    EveryLine,
    #[serde(rename = "ONCHANGE")]
    OnChange,
}

impl From<CuraFrequency> for Frequency {
    fn from(frequency: CuraFrequency) -> Self {
        match frequency {
            CuraFrequency::EveryLine => Frequency::EveryLine,
            CuraFrequency::OnChange => Frequency::OnChange,
        }
    }
}

/// Header and footer of the flag-based plugin
const STATE_CHANGE_HEADER: &str = "M63 P0 M63 P1 M63 P2 ;Turn all pins off";

impl CuraSettings {
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Whether any per-pin expression key is present
    pub fn is_bit_expression(&self) -> bool {
        [
            &self.forward_b0,
            &self.forward_b1,
            &self.forward_b2,
            &self.forward_b3,
        ]
        .iter()
        .any(|pin| pin.is_some())
    }

    /// Convert to [`Settings`], filling absent keys with the plugin's defaults
    pub fn into_settings(self) -> Settings {
        let base = Settings::default();

        if self.is_bit_expression() {
            let defaults = BitExpressionSettings::default();
            let [d0, d1, d2, d3] = defaults.pins;
            let strategy = BitExpressionSettings {
                maximum_extrusion_rate: self
                    .forward_max
                    .unwrap_or(defaults.maximum_extrusion_rate),
                pins: [
                    self.forward_b0.unwrap_or(d0),
                    self.forward_b1.unwrap_or(d1),
                    self.forward_b2.unwrap_or(d2),
                    self.forward_b3.unwrap_or(d3),
                ],
            };

            return Settings {
                command_codes: self.codes.map(WordList::Words).unwrap_or(base.command_codes),
                dwell: self.dwell.unwrap_or(true),
                remove_extrusion_axis: self.remove_e.unwrap_or(false),
                header: self.header.unwrap_or(base.header),
                footer: self.footer.unwrap_or(base.footer),
                strategy: StrategySettings::BitExpression(strategy),
                ..base
            };
        }

        let defaults = StateChangeSettings::default();
        let strategy = StateChangeSettings {
            extruder_change: self.extruder_change.unwrap_or(defaults.extruder_change),
            forward: self.forward.unwrap_or(defaults.forward),
            stopped: self.stopped.unwrap_or(defaults.stopped),
            backwards: self.backwards.unwrap_or(defaults.backwards),
            gantry_change: self.gantry_change.unwrap_or(defaults.gantry_change),
            gantry_moving: self.gantry_moving.unwrap_or(defaults.gantry_moving),
            gantry_stopped: self.gantry_stopped.unwrap_or(defaults.gantry_stopped),
            axes: self.axes.map(WordList::Words).unwrap_or(defaults.axes),
            stationary_rate: self
                .dwell_extrusion_speed
                .unwrap_or(defaults.stationary_rate),
            frequency: self.frequency.map(Frequency::from).unwrap_or(defaults.frequency),
        };

        Settings {
            command_codes: self.codes.map(WordList::Words).unwrap_or(base.command_codes),
            dwell: self.dwell.unwrap_or(false),
            remove_extrusion_axis: self.remove_e.unwrap_or(false),
            header: self
                .header
                .unwrap_or_else(|| STATE_CHANGE_HEADER.to_string()),
            footer: self
                .footer
                .unwrap_or_else(|| STATE_CHANGE_HEADER.to_string()),
            strategy: StrategySettings::StateChange(strategy),
            ..base
        }
    }
}

impl From<CuraSettings> for Settings {
    fn from(cura: CuraSettings) -> Self {
        cura.into_settings()
    }
}
