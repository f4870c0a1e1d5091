//! Rate-quantizing pin strategy
//!
//! Each pin expression maps the instantaneous extrusion rate to a level.
//! Retractions drive every pin high, idle moves drive every pin low. Only
//! pins whose level changed are written.

use crate::error::LineError;
use crate::expr::Env;
use crate::motion::{Extrusion, Kinematics};
use crate::parser::ParsedLine;
use crate::pins::{dwell_line, pin_line, PinState, PIN_COUNT};
use crate::settings::BitExpressionConfig;
use crate::strategy::{Annotation, AnnotationStrategy};

#[derive(Debug)]
pub struct BitExpressionStrategy {
    config: BitExpressionConfig,
    dwell: bool,
    diagnostics: bool,
    /// Last emitted levels
    pins: PinState,
}

/// Outcome of classifying one move
struct Decision {
    pins: PinState,
    /// Rate shown in the diagnostic comment
    rate: f64,
    /// Seconds to pause, zero for none
    dwell: f64,
    /// Whether the pin expressions were consulted
    evaluated: bool,
}

impl BitExpressionStrategy {
    pub fn new(config: BitExpressionConfig, dwell: bool, diagnostics: bool) -> Self {
        Self {
            config,
            dwell,
            diagnostics,
            pins: PinState::LOW,
        }
    }

    pub fn pins(&self) -> PinState {
        self.pins
    }

    fn decide(&self, motion: &Kinematics) -> Result<Decision, LineError> {
        let max = self.config.maximum_extrusion_rate;

        let decision = match motion.extrusion()? {
            Extrusion::Idle => Decision {
                pins: PinState::LOW,
                rate: 0.0,
                dwell: 0.0,
                evaluated: false,
            },
            Extrusion::Retract { amount } => Decision {
                pins: PinState::HIGH,
                rate: 0.0,
                dwell: amount / max,
                evaluated: false,
            },
            Extrusion::Stationary { amount } => Decision {
                pins: self.evaluate(max)?,
                rate: max,
                dwell: amount / max,
                evaluated: true,
            },
            Extrusion::Flow { rate } => Decision {
                pins: self.evaluate(rate)?,
                rate,
                dwell: 0.0,
                evaluated: true,
            },
        };
        Ok(decision)
    }

    fn evaluate(&self, rate: f64) -> Result<PinState, LineError> {
        let env = Env {
            extrusion_rate: rate,
            maximum_extrusion_rate: self.config.maximum_extrusion_rate,
        };

        let mut levels = [false; PIN_COUNT];
        for (pin, expression) in self.config.pins.iter().enumerate() {
            levels[pin] = expression
                .evaluate(&env)
                .map_err(|source| LineError::Evaluation { pin, source })?;
        }
        Ok(PinState(levels))
    }
}

impl AnnotationStrategy for BitExpressionStrategy {
    fn name(&self) -> &'static str {
        "bit-expression"
    }

    fn annotate(
        &mut self,
        _line: &ParsedLine<'_>,
        motion: &Kinematics,
    ) -> Result<Annotation, LineError> {
        let decision = self.decide(motion)?;
        let max = self.config.maximum_extrusion_rate;
        let toggles = decision.pins.toggles_from(&self.pins);
        self.pins = decision.pins;

        let mut annotation = Annotation::default();

        let comment = (self.diagnostics && (decision.evaluated || !toggles.is_empty())).then(|| {
            format!(
                "{} = {:.4}mm/s out of max {}mm/s",
                decision.pins, decision.rate, max
            )
        });
        if let Some(line) = pin_line(&toggles, comment.as_deref()) {
            log::debug!("{} -> {line}", motion.code);
            annotation.before.push(line);
        }
        annotation.toggles = toggles.len();

        if self.dwell && decision.dwell > 0.0 {
            annotation.after.push(dwell_line(
                decision.dwell,
                &format!(
                    "Robot Dwell - extrude {}mm at {}mm/s",
                    motion.extrusion_delta, max
                ),
            ));
            annotation.dwells = 1;
            log::debug!("{} dwell {:.4}s", motion.code, decision.dwell);
        }

        Ok(annotation)
    }
}
