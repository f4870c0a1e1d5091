//! Expression tokenizer

use crate::error::ExprError;

/// A lexical token of the pin expression language
#[derive(Debug, Clone, PartialEq)]
pub enum Tok {
    Int(i64),
    Float(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    LParen,
    RParen,
    Comma,
}

impl Tok {
    /// Human readable form for error messages
    pub fn describe(&self) -> String {
        match self {
            Tok::Int(n) => format!("number {n}"),
            Tok::Float(n) => format!("number {n}"),
            Tok::Ident(name) => format!("'{name}'"),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Tok::Plus => "+",
            Tok::Minus => "-",
            Tok::Star => "*",
            Tok::Slash => "/",
            Tok::DoubleSlash => "//",
            Tok::Percent => "%",
            Tok::Amp => "&",
            Tok::Pipe => "|",
            Tok::Caret => "^",
            Tok::Lt => "<",
            Tok::Le => "<=",
            Tok::Gt => ">",
            Tok::Ge => ">=",
            Tok::EqEq => "==",
            Tok::NotEq => "!=",
            Tok::LParen => "(",
            Tok::RParen => ")",
            Tok::Comma => ",",
            Tok::Int(_) | Tok::Float(_) | Tok::Ident(_) => "",
        }
    }
}

/// Split an expression into tokens paired with their byte offsets
pub fn tokenize(input: &str) -> Result<Vec<(Tok, usize)>, ExprError> {
    let mut tokens = Vec::new();
    let bytes = input.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && next_is_digit(bytes, pos + 1)) {
            let (tok, end) = number(input, pos)?;
            tokens.push((tok, start));
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push((Tok::Ident(input[start..pos].to_string()), start));
            continue;
        }

        let next = bytes.get(pos + 1).map(|b| *b as char);
        let (tok, len) = match (c, next) {
            ('/', Some('/')) => (Tok::DoubleSlash, 2),
            ('<', Some('=')) => (Tok::Le, 2),
            ('>', Some('=')) => (Tok::Ge, 2),
            ('=', Some('=')) => (Tok::EqEq, 2),
            ('!', Some('=')) => (Tok::NotEq, 2),
            ('+', _) => (Tok::Plus, 1),
            ('-', _) => (Tok::Minus, 1),
            ('*', _) => (Tok::Star, 1),
            ('/', _) => (Tok::Slash, 1),
            ('%', _) => (Tok::Percent, 1),
            ('&', _) => (Tok::Amp, 1),
            ('|', _) => (Tok::Pipe, 1),
            ('^', _) => (Tok::Caret, 1),
            ('<', _) => (Tok::Lt, 1),
            ('>', _) => (Tok::Gt, 1),
            ('(', _) => (Tok::LParen, 1),
            (')', _) => (Tok::RParen, 1),
            (',', _) => (Tok::Comma, 1),
            _ => {
                let ch = input[pos..].chars().next().unwrap_or(c);
                return Err(ExprError::UnexpectedChar { ch, offset: pos });
            }
        };
        tokens.push((tok, start));
        pos += len;
    }

    Ok(tokens)
}

fn next_is_digit(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos).is_some_and(|b| b.is_ascii_digit())
}

/// Lex a numeric literal: decimal, float with exponent, or 0b/0o/0x integer
fn number(input: &str, start: usize) -> Result<(Tok, usize), ExprError> {
    let bytes = input.as_bytes();

    let radix = match (bytes[start], bytes.get(start + 1)) {
        (b'0', Some(b'b' | b'B')) => Some(2),
        (b'0', Some(b'o' | b'O')) => Some(8),
        (b'0', Some(b'x' | b'X')) => Some(16),
        _ => None,
    };

    if let Some(radix) = radix {
        let digits_start = start + 2;
        let mut end = digits_start;
        while end < bytes.len() && (bytes[end] as char).is_ascii_alphanumeric() {
            end += 1;
        }
        let literal = &input[start..end];
        let value = i64::from_str_radix(&input[digits_start..end], radix)
            .map_err(|_| ExprError::InvalidLiteral(literal.to_string()))?;
        return Ok((Tok::Int(value), end));
    }

    let mut end = start;
    let mut is_float = false;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        is_float |= bytes[end] == b'.';
        end += 1;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        if next_is_digit(bytes, exp_end) {
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            end = exp_end;
            is_float = true;
        }
    }

    let literal = &input[start..end];
    let invalid = || ExprError::InvalidLiteral(literal.to_string());
    let tok = if is_float {
        Tok::Float(literal.parse().map_err(|_| invalid())?)
    } else {
        Tok::Int(literal.parse().map_err(|_| invalid())?)
    };
    Ok((tok, end))
}
