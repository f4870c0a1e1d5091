//! GCode Lexer
//!
//! Fast, simple tokenization of the command body of a line.
//! Tokens borrow from the input; nothing is allocated per word.

/// Token types in a GCode body
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// Line number like "N120"
    LineNumber,
    /// Command like "G1", "M104"
    Command,
    /// Parameter like "X10", "S255"
    Parameter,
    /// Parenthetical comment
    Comment,
}

/// A token with its text content
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Tokenize the body of a line (the text in front of any `;` comment)
///
/// A word is a letter followed by the number characters after it, so compact
/// lines such as "G1X10Y5" split into three words.
pub fn tokenize_body(body: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut chars = body.char_indices().peekable();

    while let Some((start_idx, ch)) = chars.next() {
        match ch {
            ' ' | '\t' | '\r' | '\n' => continue,

            // A stray semicolon ends the body
            ';' => break,

            '(' => {
                let mut end_idx = body.len();
                for (idx, ch) in chars.by_ref() {
                    if ch == ')' {
                        end_idx = idx + 1;
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Comment,
                    text: &body[start_idx..end_idx],
                });
            }

            c if c.is_ascii_alphabetic() => {
                let mut end_idx = start_idx + 1;

                while let Some(&(idx, next_ch)) = chars.peek() {
                    if next_ch.is_ascii_digit() || matches!(next_ch, '.' | '-' | '+') {
                        end_idx = idx + 1;
                        chars.next();
                    } else {
                        break;
                    }
                }

                let text = &body[start_idx..end_idx];
                let kind = match c.to_ascii_uppercase() {
                    'N' => TokenKind::LineNumber,
                    'G' | 'M' | 'T' => TokenKind::Command,
                    _ => TokenKind::Parameter,
                };
                tokens.push(Token { kind, text });
            }

            // Skip other characters (quoted strings, malformed input)
            _ => continue,
        }
    }

    tokens
}

/// Normalize a command word: uppercase letter, no leading zeros ("g01" -> "G1")
///
/// Returns `None` when the word has no well-formed numeric part.
pub fn normalize_code(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !letter.is_ascii_alphabetic() {
        return None;
    }

    let number = chars.as_str();
    let (major, minor) = match number.split_once('.') {
        Some((major, minor)) => (major, Some(minor)),
        None => (number, None),
    };

    if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let major = match major.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };

    match minor {
        Some(minor) if !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()) => {
            Some(format!("{letter}{major}.{minor}"))
        }
        Some(_) => None,
        None => Some(format!("{letter}{major}")),
    }
}

/// The normalized command code of a body, skipping a leading line number
pub fn command_code(body: &str) -> Option<String> {
    tokenize_body(body)
        .into_iter()
        .find(|t| t.kind != TokenKind::LineNumber && t.kind != TokenKind::Comment)
        .filter(|t| t.kind == TokenKind::Command)
        .and_then(|t| normalize_code(t.text))
}
