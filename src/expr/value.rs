//! Runtime values and operator semantics
//!
//! Numbers follow the familiar scripting rules the default pin expressions
//! were written against: booleans act as 0/1 integers, `/` always yields a
//! float, `//` and `%` floor toward negative infinity, and `round` rounds
//! half to even.

use std::cmp::Ordering;

use crate::error::EvalError;
use crate::expr::ast::BinaryOp;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn truthy(self) -> bool {
        match self {
            Value::Bool(b) => b,
            Value::Int(n) => n != 0,
            Value::Float(f) => f != 0.0,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::Int(n) => n as f64,
            Value::Float(f) => f,
        }
    }

    /// Integer view of booleans and integers; floats have none
    pub fn as_int(self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(b)),
            Value::Int(n) => Some(n),
            Value::Float(_) => None,
        }
    }

    pub fn type_name(self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
        }
    }

    /// Numeric ordering; integers compare exactly
    pub fn compare(self, other: Value) -> Option<Ordering> {
        match (self.as_int(), other.as_int()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => self.as_f64().partial_cmp(&other.as_f64()),
        }
    }
}

/// Checked float result
pub fn finite(value: f64, op: &'static str) -> Result<Value, EvalError> {
    if value.is_finite() {
        Ok(Value::Float(value))
    } else {
        Err(EvalError::NonFinite { op })
    }
}

/// Convert a float to an integer value, rejecting NaN, infinities and overflow
pub fn float_to_int(value: f64, op: &'static str) -> Result<Value, EvalError> {
    if !value.is_finite() {
        return Err(EvalError::NonFinite { op });
    }
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(EvalError::Overflow { op });
    }
    Ok(Value::Int(value as i64))
}

/// Apply a non short-circuiting binary operator
pub fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    let sym = op.symbol();
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => {
            if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
                let result = match op {
                    BinaryOp::Add => a.checked_add(b),
                    BinaryOp::Sub => a.checked_sub(b),
                    _ => a.checked_mul(b),
                };
                return result.map(Value::Int).ok_or(EvalError::Overflow { op: sym });
            }
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                _ => a * b,
            };
            finite(result, sym)
        }
        BinaryOp::Div => {
            let divisor = rhs.as_f64();
            if divisor == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            finite(lhs.as_f64() / divisor, sym)
        }
        BinaryOp::FloorDiv | BinaryOp::Mod => {
            if let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) {
                if b == 0 {
                    return Err(EvalError::DivisionByZero);
                }
                let overflow = EvalError::Overflow { op: sym };
                let rem = a.checked_rem(b).ok_or(overflow.clone())?;
                let adjust = rem != 0 && ((rem < 0) != (b < 0));
                return if op == BinaryOp::Mod {
                    Ok(Value::Int(if adjust { rem + b } else { rem }))
                } else {
                    let quotient = a.checked_div(b).ok_or(overflow)?;
                    Ok(Value::Int(if adjust { quotient - 1 } else { quotient }))
                };
            }
            let (a, b) = (lhs.as_f64(), rhs.as_f64());
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            if op == BinaryOp::Mod {
                let rem = a % b;
                let adjust = rem != 0.0 && ((rem < 0.0) != (b < 0.0));
                finite(if adjust { rem + b } else { rem }, sym)
            } else {
                finite((a / b).floor(), sym)
            }
        }
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) else {
                let offender = if lhs.as_int().is_none() { lhs } else { rhs };
                return Err(EvalError::Type {
                    op: sym,
                    operand: offender.type_name().to_string(),
                });
            };
            let result = match op {
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                _ => a ^ b,
            };
            if matches!((lhs, rhs), (Value::Bool(_), Value::Bool(_))) {
                Ok(Value::Bool(result != 0))
            } else {
                Ok(Value::Int(result))
            }
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = lhs.compare(rhs);
            let result = match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
                (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
                (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Eq => Ok(Value::Bool(lhs.compare(rhs) == Some(Ordering::Equal))),
        BinaryOp::Ne => Ok(Value::Bool(lhs.compare(rhs) != Some(Ordering::Equal))),
        // Operand selection only; the tree walker skips evaluating `rhs` when it can
        BinaryOp::And => Ok(if lhs.truthy() { rhs } else { lhs }),
        BinaryOp::Or => Ok(if lhs.truthy() { lhs } else { rhs }),
    }
}
