//! Tree-walking evaluator

use std::cmp::Ordering;

use crate::error::EvalError;
use crate::expr::ast::{BinaryOp, Expr, Function, UnaryOp, Variable};
use crate::expr::value::{self, Value};

/// The variables visible to a pin expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Env {
    /// Instantaneous extrusion rate in mm/s
    pub extrusion_rate: f64,
    /// Configured maximum extrusion rate in mm/s
    pub maximum_extrusion_rate: f64,
}

impl Env {
    fn get(&self, variable: Variable) -> Value {
        match variable {
            Variable::ExtrusionRate => Value::Float(self.extrusion_rate),
            Variable::MaximumExtrusionRate => Value::Float(self.maximum_extrusion_rate),
        }
    }
}

impl Expr {
    pub fn eval(&self, env: &Env) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Variable(variable) => Ok(env.get(*variable)),
            Expr::Unary { op, operand } => unary(*op, operand.eval(env)?),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.eval(env)?;
                match op {
                    BinaryOp::And if !lhs.truthy() => Ok(lhs),
                    BinaryOp::Or if lhs.truthy() => Ok(lhs),
                    _ => value::binary(*op, lhs, rhs.eval(env)?),
                }
            }
            Expr::Call { function, args } => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(env))
                    .collect::<Result<Vec<_>, _>>()?;
                call(*function, &values)
            }
        }
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!operand.truthy())),
        UnaryOp::Pos => Ok(match operand {
            Value::Bool(b) => Value::Int(i64::from(b)),
            other => other,
        }),
        UnaryOp::Neg => match operand {
            Value::Float(f) => Ok(Value::Float(-f)),
            other => other
                .as_int()
                .and_then(i64::checked_neg)
                .map(Value::Int)
                .ok_or(EvalError::Overflow { op: "-" }),
        },
    }
}

fn call(function: Function, args: &[Value]) -> Result<Value, EvalError> {
    let name = function.name();
    let Some((&first, rest)) = args.split_first() else {
        return Err(EvalError::Type {
            op: name,
            operand: "no arguments".to_string(),
        });
    };

    match function {
        Function::Min | Function::Max => {
            let mut best = first;
            for &candidate in rest {
                let ordering = candidate.compare(best);
                let better = match function {
                    Function::Min => ordering == Some(Ordering::Less),
                    _ => ordering == Some(Ordering::Greater),
                };
                if better {
                    best = candidate;
                }
            }
            Ok(best)
        }
        Function::Round => match first {
            Value::Float(f) => value::float_to_int(f.round_ties_even(), name),
            other => Ok(Value::Int(other.as_int().unwrap_or_default())),
        },
        Function::Int => match first {
            Value::Float(f) => value::float_to_int(f.trunc(), name),
            other => Ok(Value::Int(other.as_int().unwrap_or_default())),
        },
        Function::Float => Ok(Value::Float(first.as_f64())),
        Function::Bool => Ok(Value::Bool(first.truthy())),
        Function::Abs => match first {
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => other
                .as_int()
                .and_then(i64::checked_abs)
                .map(Value::Int)
                .ok_or(EvalError::Overflow { op: "abs" }),
        },
    }
}
