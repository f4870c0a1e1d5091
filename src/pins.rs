//! Digital output pins and the instructions that drive them
//!
//! Pins are switched with `M62 P<n>` (on) and `M63 P<n>` (off). Only pins
//! whose level differs from the last emitted state produce an instruction.

use std::fmt;

/// Number of output pins driven by the bit-expression strategy
pub const PIN_COUNT: usize = 4;

/// Instruction that sets a digital output high
pub const PIN_ON: &str = "M62";
/// Instruction that sets a digital output low
pub const PIN_OFF: &str = "M63";
/// Dwell instruction; the argument is in seconds
pub const DWELL: &str = "G4";

/// Levels of all output pins, pin 0 first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PinState(pub [bool; PIN_COUNT]);

impl PinState {
    pub const LOW: PinState = PinState([false; PIN_COUNT]);
    pub const HIGH: PinState = PinState([true; PIN_COUNT]);

    pub fn level(&self, pin: usize) -> bool {
        self.0[pin]
    }

    /// Pins whose level differs from `previous`, in pin order
    pub fn toggles_from(&self, previous: &PinState) -> Vec<PinToggle> {
        self.0
            .iter()
            .zip(previous.0.iter())
            .enumerate()
            .filter(|(_, (new, old))| new != old)
            .map(|(pin, (&level, _))| PinToggle { pin, level })
            .collect()
    }
}

/// Bit pattern, highest pin first: `0b1010`
impl fmt::Display for PinState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b")?;
        for level in self.0.iter().rev() {
            write!(f, "{}", u8::from(*level))?;
        }
        Ok(())
    }
}

/// A single pin switching to a new level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinToggle {
    pub pin: usize,
    pub level: bool,
}

impl fmt::Display for PinToggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = if self.level { PIN_ON } else { PIN_OFF };
        write!(f, "{code} P{}", self.pin)
    }
}

/// The pin line: toggles followed by an optional diagnostic comment
///
/// Returns `None` when there is nothing to write.
pub fn pin_line(toggles: &[PinToggle], diagnostic: Option<&str>) -> Option<String> {
    let instructions = toggles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");

    match (instructions.is_empty(), diagnostic) {
        (true, None) => None,
        (true, Some(comment)) => Some(format!(";{comment}")),
        (false, None) => Some(instructions),
        (false, Some(comment)) => Some(format!("{instructions} ;{comment}")),
    }
}

/// A dwell instruction with fixed four-decimal precision
pub fn dwell_line(seconds: f64, comment: &str) -> String {
    format!("{DWELL} P{seconds:.4} ;{comment}")
}
