//! Reversible line splitting
//!
//! A raw line is split into body, comment and terminator. Joining the three
//! pieces back together reproduces the input byte for byte.

use crate::parser::lexer;

/// A raw line split at its comment marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine<'a> {
    /// Text in front of the comment marker
    pub body: &'a str,
    /// Comment including its leading `;`, empty when the line has none
    pub comment: &'a str,
    /// `"\n"`, `"\r\n"` or empty for a final unterminated line
    pub terminator: &'a str,
}

impl<'a> ParsedLine<'a> {
    /// Split a raw line; never fails
    pub fn parse(raw: &'a str) -> Self {
        let (content, terminator) = if let Some(stripped) = raw.strip_suffix("\r\n") {
            (stripped, &raw[stripped.len()..])
        } else if let Some(stripped) = raw.strip_suffix('\n') {
            (stripped, &raw[stripped.len()..])
        } else {
            (raw, "")
        };

        match comment_start(content) {
            Some(idx) => Self {
                body: &content[..idx],
                comment: &content[idx..],
                terminator,
            },
            None => Self {
                body: content,
                comment: "",
                terminator,
            },
        }
    }

    /// Normalized leading command code, e.g. "G1"
    pub fn code(&self) -> Option<String> {
        lexer::command_code(self.body)
    }

    /// Newline to use for injected lines, matching the line's own style
    pub fn newline(&self) -> &'static str {
        if self.terminator == "\r\n" { "\r\n" } else { "\n" }
    }

    /// The original text
    pub fn to_raw(&self) -> String {
        let mut out =
            String::with_capacity(self.body.len() + self.comment.len() + self.terminator.len());
        out.push_str(self.body);
        out.push_str(self.comment);
        out.push_str(self.terminator);
        out
    }

    /// Rebuild the line around injected instructions
    ///
    /// `before` lines precede the body, `after` lines follow it. The original
    /// comment is always placed after every injected instruction; when
    /// instructions follow the body the comment moves to its own line.
    pub fn rebuild(&self, body: &str, before: &[String], after: &[String]) -> String {
        let nl = self.newline();
        let mut out = String::new();

        for instruction in before {
            out.push_str(instruction);
            out.push_str(nl);
        }

        out.push_str(body);

        for instruction in after {
            out.push_str(nl);
            out.push_str(instruction);
        }

        if !after.is_empty() && !self.comment.is_empty() {
            out.push_str(nl);
        }
        out.push_str(self.comment);
        out.push_str(self.terminator);
        out
    }
}

/// Byte offset of the first `;` outside a double-quoted string
fn comment_start(content: &str) -> Option<usize> {
    let mut quoted = false;
    for (idx, ch) in content.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            ';' if !quoted => return Some(idx),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_comment() {
        let line = ParsedLine::parse("G1 X10 ; move to X10\n");
        assert_eq!(line.body, "G1 X10 ");
        assert_eq!(line.comment, "; move to X10");
        assert_eq!(line.terminator, "\n");
    }

    #[test]
    fn test_parse_without_terminator() {
        let line = ParsedLine::parse("G28");
        assert_eq!(line.body, "G28");
        assert_eq!(line.comment, "");
        assert_eq!(line.terminator, "");
    }

    #[test]
    fn test_parse_crlf() {
        let line = ParsedLine::parse("M82 ;absolute\r\n");
        assert_eq!(line.body, "M82 ");
        assert_eq!(line.comment, ";absolute");
        assert_eq!(line.terminator, "\r\n");
        assert_eq!(line.newline(), "\r\n");
    }

    #[test]
    fn test_quoted_semicolon_is_not_a_comment() {
        let line = ParsedLine::parse("M118 \"a;b\" ;note\n");
        assert_eq!(line.body, "M118 \"a;b\" ");
        assert_eq!(line.comment, ";note");
    }

    #[test]
    fn test_round_trip() {
        for raw in [
            "",
            "\n",
            ";LAYER:0\n",
            "G1 X1 Y2 E0.3 ;perimeter;inner\n",
            "  G0 F6000  \r\n",
            "M104 S200",
        ] {
            assert_eq!(ParsedLine::parse(raw).to_raw(), raw);
        }
    }

    #[test]
    fn test_rebuild_without_instructions_is_identity() {
        let raw = "G1 X1 E2 ;wall\n";
        let line = ParsedLine::parse(raw);
        assert_eq!(line.rebuild(line.body, &[], &[]), raw);
    }

    #[test]
    fn test_rebuild_places_comment_last() {
        let line = ParsedLine::parse("G1 E-2 ;retract\n");
        let out = line.rebuild(
            line.body,
            &["M62 P0".to_string()],
            &["G4 P0.0267".to_string()],
        );
        assert_eq!(out, "M62 P0\nG1 E-2 \nG4 P0.0267\n;retract\n");
    }
}
