//! Flag-based strategy
//!
//! Tracks two coarse states, extruder direction and gantry motion, and
//! inserts a configured snippet whenever one of them changes (or on every
//! line). While the gantry stands still the extruder gets a dwell sized by
//! the stationary extrusion rate.

use crate::error::LineError;
use crate::motion::Kinematics;
use crate::parser::ParsedLine;
use crate::pins::dwell_line;
use crate::settings::{Frequency, StateChangeConfig};
use crate::strategy::{Annotation, AnnotationStrategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtruderState {
    Forward,
    Stopped,
    Backwards,
}

impl ExtruderState {
    fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            ExtruderState::Forward
        } else if delta < 0.0 {
            ExtruderState::Backwards
        } else {
            ExtruderState::Stopped
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GantryState {
    Moving,
    Stopped,
}

#[derive(Debug)]
pub struct StateChangeStrategy {
    config: StateChangeConfig,
    dwell: bool,
    extruder: ExtruderState,
    gantry: GantryState,
}

impl StateChangeStrategy {
    pub fn new(config: StateChangeConfig, dwell: bool) -> Self {
        Self {
            config,
            dwell,
            extruder: ExtruderState::Stopped,
            gantry: GantryState::Stopped,
        }
    }

    pub fn extruder(&self) -> ExtruderState {
        self.extruder
    }

    pub fn gantry(&self) -> GantryState {
        self.gantry
    }

    fn extruder_snippet(&self, state: ExtruderState) -> &str {
        match state {
            ExtruderState::Forward => &self.config.forward,
            ExtruderState::Stopped => &self.config.stopped,
            ExtruderState::Backwards => &self.config.backwards,
        }
    }

    fn gantry_snippet(&self, state: GantryState) -> &str {
        match state {
            GantryState::Moving => &self.config.gantry_moving,
            GantryState::Stopped => &self.config.gantry_stopped,
        }
    }

    fn gantry_state(&self, body: &str) -> GantryState {
        if self.config.axes.iter().any(|axis| body.contains(axis.as_str())) {
            GantryState::Moving
        } else {
            GantryState::Stopped
        }
    }
}

impl AnnotationStrategy for StateChangeStrategy {
    fn name(&self) -> &'static str {
        "state-change"
    }

    fn annotate(
        &mut self,
        line: &ParsedLine<'_>,
        motion: &Kinematics,
    ) -> Result<Annotation, LineError> {
        let extruder = ExtruderState::from_delta(motion.extrusion_delta);
        let gantry = self.gantry_state(line.body);
        let every_line = self.config.frequency == Frequency::EveryLine;

        let mut annotation = Annotation::default();

        if self.config.gantry_change && (every_line || gantry != self.gantry) {
            annotation.before.push(self.gantry_snippet(gantry).to_string());
            log::debug!("{} -> gantry {gantry:?}", motion.code);
        }
        if self.config.extruder_change && (every_line || extruder != self.extruder) {
            annotation.before.push(self.extruder_snippet(extruder).to_string());
            log::debug!("{} -> extruder {extruder:?}", motion.code);
        }

        let seconds = motion.extrusion_delta.abs() / self.config.stationary_rate;
        if self.dwell
            && extruder != ExtruderState::Stopped
            && gantry == GantryState::Stopped
            && seconds > 0.0
        {
            annotation.before.push(dwell_line(seconds, "Robot Dwell"));
            annotation.dwells = 1;
        }

        self.extruder = extruder;
        self.gantry = gantry;
        Ok(annotation)
    }
}
