//! GCode Parser
//!
//! Splitting of raw lines into body, comment and terminator, command code
//! detection, and axis value extraction.

pub mod axis;
pub mod lexer;
pub mod line;

pub use axis::{axis_value, has_axis, remove_axis};
pub use lexer::{command_code, normalize_code, tokenize_body, Token, TokenKind};
pub use line::ParsedLine;

/// Parse a single raw line
///
/// This is the main entry point for parsing. The returned view borrows from
/// `raw` and can be turned back into identical text.
pub fn parse_line(raw: &str) -> ParsedLine<'_> {
    ParsedLine::parse(raw)
}
