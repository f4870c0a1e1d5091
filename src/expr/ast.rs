//! Expression tree
//!
//! Pure data representation of a compiled pin expression.

use crate::expr::value::Value;

/// A compiled expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(Variable),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        function: Function,
        args: Vec<Expr>,
    },
}

/// The two names an expression may read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variable {
    ExtrusionRate,
    MaximumExtrusionRate,
}

impl Variable {
    /// Resolve a variable name, including the slicer plugin's short names
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "extrusion_rate" | "EF" => Some(Self::ExtrusionRate),
            "maximum_extrusion_rate" | "MaxSpeed" => Some(Self::MaximumExtrusionRate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::Eq | BinaryOp::Ne
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

/// Built-in functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Min,
    Max,
    Round,
    Int,
    Float,
    Bool,
    Abs,
}

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "round" => Some(Self::Round),
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" => Some(Self::Bool),
            "abs" => Some(Self::Abs),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Min => "min",
            Function::Max => "max",
            Function::Round => "round",
            Function::Int => "int",
            Function::Float => "float",
            Function::Bool => "bool",
            Function::Abs => "abs",
        }
    }

    /// Accepted argument counts, as text for error messages
    pub fn arity(self) -> &'static str {
        match self {
            Function::Min | Function::Max => "at least 2",
            _ => "1",
        }
    }

    pub fn accepts(self, count: usize) -> bool {
        match self {
            Function::Min | Function::Max => count >= 2,
            _ => count == 1,
        }
    }
}
