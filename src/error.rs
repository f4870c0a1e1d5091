//! Error types for the annotation engine
//!
//! Every failure is fatal to a run. Per-line failures are wrapped into a
//! [`TransformError`] carrying the position and raw text of the offending line.

use thiserror::Error;

/// An axis or feed letter was found but no usable number followed it
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// The text after the letter is not a number
    #[error("'{letter}' is not followed by a number (found {found:?})")]
    MalformedNumber { letter: char, found: String },

    /// The number parsed but is NaN or infinite
    #[error("'{letter}' value {found:?} is not finite")]
    NonFinite { letter: char, found: String },
}

/// Syntax errors in a pin expression, reported when the expression is compiled
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    #[error("unexpected character {ch:?} at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("invalid number literal {0:?}")]
    InvalidLiteral(String),

    #[error("unexpected {found} at offset {offset}")]
    UnexpectedToken { found: String, offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("{function}() takes {expected} argument(s), got {found}")]
    Arity {
        function: &'static str,
        expected: &'static str,
        found: usize,
    },
}

/// Failures while evaluating a compiled pin expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("unsupported operand for '{op}': {operand}")]
    Type { op: &'static str, operand: String },

    #[error("integer overflow in '{op}'")]
    Overflow { op: &'static str },

    #[error("'{op}' produced a non-finite result")]
    NonFinite { op: &'static str },
}

/// Invalid annotation settings, detected before any line is processed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("maximum extrusion rate must be positive and finite, got {0}")]
    InvalidMaximumRate(f64),

    #[error("stationary extrusion rate must be positive and finite, got {0}")]
    InvalidStationaryRate(f64),

    #[error("no command codes configured")]
    NoCommandCodes,

    #[error("invalid command code {0:?}")]
    InvalidCommandCode(String),

    #[error("pin {pin} expression {expression:?}: {source}")]
    Expression {
        pin: usize,
        expression: String,
        #[source]
        source: ExprError,
    },

    #[error("pin {pin} expression {expression:?} cannot be evaluated: {source}")]
    ExpressionProbe {
        pin: usize,
        expression: String,
        #[source]
        source: EvalError,
    },
}

/// A failure while annotating a single line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("pin {pin} expression failed: {source}")]
    Evaluation {
        pin: usize,
        #[source]
        source: EvalError,
    },

    #[error("{code} moves {displacement} mm with a zero feed rate")]
    ZeroFeedRate { code: String, displacement: f64 },
}

/// A line error located in the input stream
#[derive(Error, Debug, Clone, PartialEq)]
#[error("layer {layer}, line {line}: {source} in {text:?}")]
pub struct TransformError {
    /// Zero-based layer index
    pub layer: usize,
    /// One-based line number counted across the whole run
    pub line: usize,
    /// Raw text of the failing line
    pub text: String,
    #[source]
    pub source: LineError,
}
