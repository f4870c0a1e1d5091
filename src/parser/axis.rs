//! Axis value extraction
//!
//! Letters are located by plain substring search over the body, the same way
//! the slicer plugins this tool replaces did it. A letter inside an unrelated
//! word therefore counts as that axis.

use std::borrow::Cow;

use crate::error::ParseError;

/// Value following the first occurrence of `letter` in `body`
///
/// Whitespace between the letter and its number is skipped. The number ends
/// at the next whitespace.
pub fn axis_value(body: &str, letter: char) -> Result<Option<f64>, ParseError> {
    let Some(idx) = body.find(letter) else {
        return Ok(None);
    };

    let rest = body[idx + letter.len_utf8()..].trim_start();
    let word = rest.split_whitespace().next().unwrap_or("");

    let value: f64 = word.parse().map_err(|_| ParseError::MalformedNumber {
        letter,
        found: word.to_string(),
    })?;

    if !value.is_finite() {
        return Err(ParseError::NonFinite {
            letter,
            found: word.to_string(),
        });
    }

    Ok(Some(value))
}

/// Whether `letter` occurs anywhere in `body`
pub fn has_axis(body: &str, letter: char) -> bool {
    body.contains(letter)
}

/// Remove the first `letter` word and the whitespace after it
pub fn remove_axis(body: &str, letter: char) -> Cow<'_, str> {
    let Some(idx) = body.find(letter) else {
        return Cow::Borrowed(body);
    };

    let before = &body[..idx];
    let rest = body[idx + letter.len_utf8()..].trim_start();
    let after = match rest.find(char::is_whitespace) {
        Some(end) => rest[end..].trim_start(),
        None => "",
    };

    Cow::Owned(format!("{before}{after}"))
}
