//! Kinematic state tracking
//!
//! [`MotionState`] follows the toolpath line by line: extrusion mode, the
//! last position seen on each axis, and the last feed rate of rapid and
//! linear moves. Each eligible line yields a [`Kinematics`] snapshot with the
//! per-line deltas from which the extrusion rate is derived.

use std::collections::BTreeSet;

use crate::error::LineError;
use crate::parser::{axis_value, has_axis, ParsedLine};

/// Whether E values are running totals or per-move amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtrusionMode {
    Absolute,
    #[default]
    Relative,
}

/// Which stored feed rate a move uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Rapid,
    Linear,
}

impl MoveKind {
    /// G1, G2 and G3 are feed moves; every other eligible code is rapid
    pub fn of(code: &str) -> Self {
        match code {
            "G1" | "G2" | "G3" => MoveKind::Linear,
            _ => MoveKind::Rapid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub e: f64,
}

/// Run-lifetime motion state
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MotionState {
    pub extrusion_mode: ExtrusionMode,
    /// Most recent literal read per axis
    pub last: Position,
    /// mm/s
    pub rapid_feed_rate: f64,
    /// mm/s
    pub linear_feed_rate: f64,
}

/// What a line did to the motion state
#[derive(Debug, Clone, PartialEq)]
pub enum MotionEvent {
    /// Not a move the tracker handles; the line passes through untouched
    Ignored,
    /// M82 / M83
    ExtrusionModeChanged(ExtrusionMode),
    /// G92
    PositionReset,
    /// An eligible move
    Move(Kinematics),
}

/// Per-line kinematic snapshot of an eligible move
#[derive(Debug, Clone, PartialEq)]
pub struct Kinematics {
    pub code: String,
    pub kind: MoveKind,
    /// Signed extrusion amount of this line
    pub extrusion_delta: f64,
    /// Euclidean XYZ travel of this line
    pub displacement: f64,
    /// Feed rate (mm/s) in effect for this move
    pub feed_rate: f64,
}

/// Direction and speed of extrusion for one line
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extrusion {
    /// No extrusion
    Idle,
    /// Negative extrusion of `amount` mm (positive number)
    Retract { amount: f64 },
    /// Positive extrusion without travel
    Stationary { amount: f64 },
    /// Positive extrusion while moving, at `rate` mm/s
    Flow { rate: f64 },
}

impl Kinematics {
    /// Classify this line's extrusion
    ///
    /// Fails when material is extruded over a move whose feed rate is zero.
    pub fn extrusion(&self) -> Result<Extrusion, LineError> {
        let delta = self.extrusion_delta;
        if delta == 0.0 {
            return Ok(Extrusion::Idle);
        }
        if delta < 0.0 {
            return Ok(Extrusion::Retract { amount: -delta });
        }
        if self.displacement == 0.0 {
            return Ok(Extrusion::Stationary { amount: delta });
        }
        if self.feed_rate == 0.0 {
            return Err(LineError::ZeroFeedRate {
                code: self.code.clone(),
                displacement: self.displacement,
            });
        }

        let elapsed = self.displacement / self.feed_rate;
        Ok(Extrusion::Flow {
            rate: delta / elapsed,
        })
    }
}

impl MotionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the state by one line
    ///
    /// Lines whose code is not in `command_codes` only affect the state when
    /// they are M82, M83 or G92.
    pub fn advance(
        &mut self,
        line: &ParsedLine<'_>,
        command_codes: &BTreeSet<String>,
    ) -> Result<MotionEvent, LineError> {
        let Some(code) = line.code() else {
            return Ok(MotionEvent::Ignored);
        };
        let body = line.body;

        match code.as_str() {
            "G92" => {
                self.reset_position(body);
                return Ok(MotionEvent::PositionReset);
            }
            "M82" => {
                self.extrusion_mode = ExtrusionMode::Absolute;
                return Ok(MotionEvent::ExtrusionModeChanged(ExtrusionMode::Absolute));
            }
            "M83" => {
                self.extrusion_mode = ExtrusionMode::Relative;
                return Ok(MotionEvent::ExtrusionModeChanged(ExtrusionMode::Relative));
            }
            _ => {}
        }

        if !command_codes.contains(&code) {
            return Ok(MotionEvent::Ignored);
        }

        let kind = MoveKind::of(&code);
        if let Some(feed) = axis_value(body, 'F')? {
            let per_second = feed / 60.0;
            match kind {
                MoveKind::Linear => self.linear_feed_rate = per_second,
                MoveKind::Rapid => self.rapid_feed_rate = per_second,
            }
        }

        let dx = step(&mut self.last.x, axis_value(body, 'X')?);
        let dy = step(&mut self.last.y, axis_value(body, 'Y')?);
        let dz = step(&mut self.last.z, axis_value(body, 'Z')?);

        let extrusion_delta = match axis_value(body, 'E')? {
            Some(e) => {
                let previous = std::mem::replace(&mut self.last.e, e);
                match self.extrusion_mode {
                    ExtrusionMode::Absolute => e - previous,
                    ExtrusionMode::Relative => e,
                }
            }
            None => 0.0,
        };

        let feed_rate = match kind {
            MoveKind::Linear => self.linear_feed_rate,
            MoveKind::Rapid => self.rapid_feed_rate,
        };

        Ok(MotionEvent::Move(Kinematics {
            code,
            kind,
            extrusion_delta,
            displacement: (dx * dx + dy * dy + dz * dz).sqrt(),
            feed_rate,
        }))
    }

    /// G92: zero each mentioned axis, whatever value follows it
    fn reset_position(&mut self, body: &str) {
        let axes: [(char, &mut f64); 4] = [
            ('E', &mut self.last.e),
            ('X', &mut self.last.x),
            ('Y', &mut self.last.y),
            ('Z', &mut self.last.z),
        ];

        for (letter, slot) in axes {
            if has_axis(body, letter) {
                *slot = 0.0;
            }
        }
    }
}

/// Record a new literal for one axis and return the travel along it
fn step(last: &mut f64, value: Option<f64>) -> f64 {
    match value {
        Some(v) => v - std::mem::replace(last, v),
        None => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn advance(state: &mut MotionState, raw: &str) -> MotionEvent {
        state
            .advance(&ParsedLine::parse(raw), &codes(&["G0", "G1"]))
            .unwrap()
    }

    fn kinematics(state: &mut MotionState, raw: &str) -> Kinematics {
        match advance(state, raw) {
            MotionEvent::Move(k) => k,
            other => panic!("expected a move, got {other:?}"),
        }
    }

    #[test]
    fn test_linear_move_with_feed() {
        let mut state = MotionState::new();
        let k = kinematics(&mut state, "G1 X10 Y0 F600 E5\n");

        assert_eq!(k.displacement, 10.0);
        assert_eq!(k.feed_rate, 10.0);
        assert_eq!(k.extrusion_delta, 5.0);
        assert_eq!(k.extrusion().unwrap(), Extrusion::Flow { rate: 5.0 });
    }

    #[test]
    fn test_feed_rates_are_tracked_per_move_kind() {
        let mut state = MotionState::new();
        advance(&mut state, "G0 F6000 X1\n");
        advance(&mut state, "G1 F1200 X2\n");

        assert_eq!(state.rapid_feed_rate, 100.0);
        assert_eq!(state.linear_feed_rate, 20.0);

        let k = kinematics(&mut state, "G0 X5\n");
        assert_eq!(k.feed_rate, 100.0);
        let k = kinematics(&mut state, "G1 X6 E1\n");
        assert_eq!(k.feed_rate, 20.0);
    }

    #[test]
    fn test_absent_axes_do_not_move() {
        let mut state = MotionState::new();
        advance(&mut state, "G1 X3 Y4 F60\n");
        let k = kinematics(&mut state, "G1 Z0.2\n");
        assert_eq!(k.displacement, 0.2);
        assert_eq!(state.last.x, 3.0);
        assert_eq!(state.last.y, 4.0);
    }

    #[test]
    fn test_absolute_extrusion_uses_previous_literal() {
        let mut state = MotionState::new();
        advance(&mut state, "M82\n");
        assert_eq!(state.extrusion_mode, ExtrusionMode::Absolute);

        assert_eq!(kinematics(&mut state, "G1 X1 E2 F60\n").extrusion_delta, 2.0);
        assert_eq!(kinematics(&mut state, "G1 X2 E5\n").extrusion_delta, 3.0);
        assert_eq!(kinematics(&mut state, "G1 E4\n").extrusion_delta, -1.0);
        assert_eq!(state.last.e, 4.0);
    }

    #[test]
    fn test_relative_extrusion_stores_literal() {
        let mut state = MotionState::new();
        advance(&mut state, "M83\n");
        assert_eq!(kinematics(&mut state, "G1 X1 E0.5 F60\n").extrusion_delta, 0.5);
        assert_eq!(kinematics(&mut state, "G1 X2 E0.5\n").extrusion_delta, 0.5);
        assert_eq!(state.last.e, 0.5);
    }

    #[test]
    fn test_g92_resets_mentioned_axes() {
        let mut state = MotionState::new();
        advance(&mut state, "M82\n");
        advance(&mut state, "G1 X10 Y10 E20 F60\n");

        assert_eq!(advance(&mut state, "G92 E0\n"), MotionEvent::PositionReset);
        assert_eq!(state.last.e, 0.0);
        assert_eq!(state.last.x, 10.0);

        assert_eq!(kinematics(&mut state, "G1 X11 E0.5\n").extrusion_delta, 0.5);
    }

    #[test]
    fn test_g92_zeroes_regardless_of_value() {
        let mut state = MotionState::new();
        advance(&mut state, "M82
");
        advance(&mut state, "G1 X4 E3 F600
");

        assert_eq!(advance(&mut state, "G92 X5 E5
"), MotionEvent::PositionReset);
        assert_eq!(state.last.x, 0.0);
        assert_eq!(state.last.e, 0.0);

        let k = kinematics(&mut state, "G1 X10 E5
");
        assert_eq!(k.extrusion_delta, 5.0);
        assert_eq!(k.displacement, 10.0);

        // a malformed value is not parsed at all
        assert_eq!(advance(&mut state, "G92 Eoops
"), MotionEvent::PositionReset);
        assert_eq!(state.last.e, 0.0);
        assert_eq!(state.last.x, 10.0);
    }

    #[test]
    fn test_ineligible_lines_are_ignored() {
        let mut state = MotionState::new();
        assert_eq!(advance(&mut state, "G28 X0\n"), MotionEvent::Ignored);
        assert_eq!(advance(&mut state, "; G1 X5\n"), MotionEvent::Ignored);
        assert_eq!(advance(&mut state, "M104 S200\n"), MotionEvent::Ignored);
        assert_eq!(state, MotionState::new());
    }

    #[test]
    fn test_extrusion_classification() {
        let k = |delta: f64, displacement: f64, feed_rate: f64| Kinematics {
            code: "G1".to_string(),
            kind: MoveKind::Linear,
            extrusion_delta: delta,
            displacement,
            feed_rate,
        };

        assert_eq!(k(0.0, 5.0, 0.0).extrusion().unwrap(), Extrusion::Idle);
        assert_eq!(
            k(-2.0, 0.0, 0.0).extrusion().unwrap(),
            Extrusion::Retract { amount: 2.0 }
        );
        assert_eq!(
            k(1.5, 0.0, 0.0).extrusion().unwrap(),
            Extrusion::Stationary { amount: 1.5 }
        );
        assert!(matches!(
            k(1.0, 3.0, 0.0).extrusion(),
            Err(LineError::ZeroFeedRate { .. })
        ));
    }

    #[test]
    fn test_malformed_axis_is_a_parse_error() {
        let mut state = MotionState::new();
        let result = state.advance(&ParsedLine::parse("G1 X1Y2\n"), &codes(&["G1"]));
        assert!(matches!(result, Err(LineError::Parse(_))));
    }
}
