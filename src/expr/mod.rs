//! Pin expression language
//!
//! A small sandboxed interpreter for the per-pin expressions. Expressions are
//! parsed once, when settings are compiled, and evaluated per line against
//! the extrusion rate and the configured maximum rate.
//!
//! ```text
//! bool(int(round(min(max(0, (extrusion_rate / maximum_extrusion_rate) * 14), 14))) & 0b0001)
//! ```

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::{BinaryOp, Expr, Function, UnaryOp, Variable};
pub use eval::Env;
pub use value::Value;

use crate::error::{EvalError, ExprError};

/// A compiled pin expression together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct PinExpression {
    source: String,
    tree: Expr,
}

impl PinExpression {
    pub fn compile(source: &str) -> Result<Self, ExprError> {
        Ok(Self {
            source: source.to_string(),
            tree: parser::parse(source)?,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tree(&self) -> &Expr {
        &self.tree
    }

    /// Evaluate and coerce the result to a pin level
    pub fn evaluate(&self, env: &Env) -> Result<bool, EvalError> {
        self.tree.eval(env).map(Value::truthy)
    }
}
