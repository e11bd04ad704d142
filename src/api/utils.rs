//! API utility functions
//!
//! Pure, stateless helpers for turning raw path segments into request
//! values. Percent-decoding here is strict: a `%` must be followed by two
//! hex digits and the result must be UTF-8, otherwise the caller answers
//! with 400.

use percent_encoding::percent_decode_str;
use thiserror::Error;

use crate::handlers::Extra;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnescapeError {
    #[error("invalid escape sequence {0:?}")]
    InvalidEscape(String),
    #[error("escaped value is not valid UTF-8")]
    InvalidUtf8,
    #[error("invalid semicolon separator in query")]
    Semicolon,
    #[error("escaped path separator in segment")]
    EscapedSeparator,
}

/// Reverses URL path escaping (`%XX`), leaving `+` untouched
pub fn path_unescape(segment: &str) -> Result<String, UnescapeError> {
    validate_escapes(segment)?;

    percent_decode_str(segment)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| UnescapeError::InvalidUtf8)
}

/// Decodes a media id path segment
///
/// An id is a single segment, so an escaped `/` can never be part of it.
pub fn unescape_id(segment: &str) -> Result<String, UnescapeError> {
    let id = path_unescape(segment)?;
    if id.contains('/') {
        return Err(UnescapeError::EscapedSeparator);
    }
    Ok(id)
}

/// Reverses query escaping, where `+` stands for a space
pub fn query_unescape(value: &str) -> Result<String, UnescapeError> {
    path_unescape(&value.replace('+', " "))
}

/// Parses the extras segment of catalog and subtitle requests
///
/// A trailing `.json` is stripped, then the rest is read as a query string
/// (`genre=Action&skip=100`). Pair order is preserved.
pub fn parse_extras(segment: &str) -> Result<Extra, UnescapeError> {
    let query = segment.strip_suffix(".json").unwrap_or(segment);
    let mut extra = Extra::default();

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        if pair.contains(';') {
            return Err(UnescapeError::Semicolon);
        }

        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        extra.push(query_unescape(key)?, query_unescape(value)?);
    }

    Ok(extra)
}

/// Strips the mandatory `.json` suffix from the last segment of a route
pub fn strip_json_suffix(segment: &str) -> Option<&str> {
    segment.strip_suffix(".json").filter(|rest| !rest.is_empty())
}

fn validate_escapes(segment: &str) -> Result<(), UnescapeError> {
    let bytes = segment.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes.len() >= i + 3
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(UnescapeError::InvalidEscape(
                    String::from_utf8_lossy(&bytes[i..end]).into_owned(),
                ));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    Ok(())
}
