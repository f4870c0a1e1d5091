//! Pratt parser for pin expressions
//!
//! Operator precedence, loosest first: `or`, `and`, `not`, comparisons,
//! `|`, `^`, `&`, `+ -`, `* / // %`, unary `- +`.

use crate::error::ExprError;
use crate::expr::ast::{BinaryOp, Expr, Function, UnaryOp, Variable};
use crate::expr::lexer::{tokenize, Tok};
use crate::expr::value::Value;

const NOT_BP: u8 = 5;
const UNARY_BP: u8 = 19;

/// Parse an expression into a tree, resolving every name
pub fn parse(input: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr_bp(0)?;

    if let Some((tok, offset)) = parser.tokens.get(parser.pos) {
        return Err(ExprError::UnexpectedToken {
            found: tok.describe(),
            offset: *offset,
        });
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<(Tok, usize)>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    fn next(&mut self) -> Option<(Tok, usize)> {
        let item = self.tokens.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn expect(&mut self, expected: Tok) -> Result<(), ExprError> {
        match self.next() {
            Some((tok, _)) if tok == expected => Ok(()),
            Some((tok, offset)) => Err(ExprError::UnexpectedToken {
                found: tok.describe(),
                offset,
            }),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expr_bp(&mut self, min_bp: u8) -> Result<Expr, ExprError> {
        let mut lhs = self.prefix()?;
        // right operand of the previous comparison at this level, for chains
        let mut chain: Option<Expr> = None;

        loop {
            let Some(op) = self.peek().and_then(infix_op) else {
                break;
            };
            let (l_bp, r_bp) = infix_binding_power(op);
            if l_bp < min_bp {
                break;
            }
            self.pos += 1;
            let rhs = self.expr_bp(r_bp)?;

            if !op.is_comparison() {
                chain = None;
                lhs = binary(op, lhs, rhs);
                continue;
            }

            // `a < b < c` means `a < b and b < c`
            lhs = match chain.take() {
                Some(middle) => binary(BinaryOp::And, lhs, binary(op, middle, rhs.clone())),
                None => binary(op, lhs, rhs.clone()),
            };
            chain = Some(rhs);
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, ExprError> {
        let Some((tok, offset)) = self.next() else {
            return Err(ExprError::UnexpectedEnd);
        };

        match tok {
            Tok::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            Tok::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Tok::Minus => self.unary(UnaryOp::Neg, UNARY_BP),
            Tok::Plus => self.unary(UnaryOp::Pos, UNARY_BP),
            Tok::LParen => {
                let inner = self.expr_bp(0)?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Tok::Ident(name) => match name.as_str() {
                "True" => Ok(Expr::Literal(Value::Bool(true))),
                "False" => Ok(Expr::Literal(Value::Bool(false))),
                "not" => self.unary(UnaryOp::Not, NOT_BP),
                "and" | "or" => Err(ExprError::UnexpectedToken {
                    found: format!("'{name}'"),
                    offset,
                }),
                _ if self.peek() == Some(&Tok::LParen) => self.call(&name),
                _ => Variable::from_name(&name)
                    .map(Expr::Variable)
                    .ok_or(ExprError::UnknownVariable(name)),
            },
            other => Err(ExprError::UnexpectedToken {
                found: other.describe(),
                offset,
            }),
        }
    }

    fn unary(&mut self, op: UnaryOp, bp: u8) -> Result<Expr, ExprError> {
        let operand = self.expr_bp(bp)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn call(&mut self, name: &str) -> Result<Expr, ExprError> {
        let function =
            Function::from_name(name).ok_or_else(|| ExprError::UnknownFunction(name.to_string()))?;
        self.expect(Tok::LParen)?;

        let mut args = Vec::new();
        if self.peek() == Some(&Tok::RParen) {
            self.pos += 1;
        } else {
            loop {
                args.push(self.expr_bp(0)?);
                match self.next() {
                    Some((Tok::Comma, _)) => continue,
                    Some((Tok::RParen, _)) => break,
                    Some((tok, offset)) => {
                        return Err(ExprError::UnexpectedToken {
                            found: tok.describe(),
                            offset,
                        });
                    }
                    None => return Err(ExprError::UnexpectedEnd),
                }
            }
        }

        if !function.accepts(args.len()) {
            return Err(ExprError::Arity {
                function: function.name(),
                expected: function.arity(),
                found: args.len(),
            });
        }
        Ok(Expr::Call { function, args })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

fn infix_op(tok: &Tok) -> Option<BinaryOp> {
    let op = match tok {
        Tok::Plus => BinaryOp::Add,
        Tok::Minus => BinaryOp::Sub,
        Tok::Star => BinaryOp::Mul,
        Tok::Slash => BinaryOp::Div,
        Tok::DoubleSlash => BinaryOp::FloorDiv,
        Tok::Percent => BinaryOp::Mod,
        Tok::Amp => BinaryOp::BitAnd,
        Tok::Pipe => BinaryOp::BitOr,
        Tok::Caret => BinaryOp::BitXor,
        Tok::Lt => BinaryOp::Lt,
        Tok::Le => BinaryOp::Le,
        Tok::Gt => BinaryOp::Gt,
        Tok::Ge => BinaryOp::Ge,
        Tok::EqEq => BinaryOp::Eq,
        Tok::NotEq => BinaryOp::Ne,
        Tok::Ident(name) if name == "and" => BinaryOp::And,
        Tok::Ident(name) if name == "or" => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}

fn infix_binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Or => (1, 2),
        BinaryOp::And => (3, 4),
        BinaryOp::Lt
        | BinaryOp::Le
        | BinaryOp::Gt
        | BinaryOp::Ge
        | BinaryOp::Eq
        | BinaryOp::Ne => (7, 8),
        BinaryOp::BitOr => (9, 10),
        BinaryOp::BitXor => (11, 12),
        BinaryOp::BitAnd => (13, 14),
        BinaryOp::Add | BinaryOp::Sub => (15, 16),
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod => (17, 18),
    }
}
