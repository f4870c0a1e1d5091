//! Annotation strategies
//!
//! The pipeline tokenizes each line and advances the motion state; a strategy
//! only decides which instructions to inject around an eligible move.

pub mod bit_expression;
pub mod state_change;

pub use bit_expression::BitExpressionStrategy;
pub use state_change::StateChangeStrategy;

use crate::error::LineError;
use crate::motion::Kinematics;
use crate::parser::ParsedLine;
use crate::settings::{Configuration, StrategyConfig};

/// Instructions injected around one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    /// Lines placed in front of the body
    pub before: Vec<String>,
    /// Lines placed after the body, ahead of the original comment
    pub after: Vec<String>,
    /// Pin toggles contained in `before`
    pub toggles: usize,
    /// Dwell instructions contained in `before` and `after`
    pub dwells: usize,
}

impl Annotation {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Decides what to inject for each eligible move
pub trait AnnotationStrategy {
    /// Short name used in logs and summaries
    fn name(&self) -> &'static str;

    fn annotate(
        &mut self,
        line: &ParsedLine<'_>,
        motion: &Kinematics,
    ) -> Result<Annotation, LineError>;
}

/// Build the strategy selected by the configuration
pub fn from_config(config: &Configuration) -> Box<dyn AnnotationStrategy> {
    match &config.strategy {
        StrategyConfig::BitExpression(bits) => Box::new(BitExpressionStrategy::new(
            bits.clone(),
            config.dwell,
            config.diagnostics,
        )),
        StrategyConfig::StateChange(state) => {
            Box::new(StateChangeStrategy::new(state.clone(), config.dwell))
        }
    }
}
