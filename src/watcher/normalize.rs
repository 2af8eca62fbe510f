//! Repair of the escaped JSON fragment carried in an envelope's `message`.
//!
//! The log shipper wraps the snapshot JSON in a string literal and escapes it
//! once more on the way. The steps below undo exactly that, in this order;
//! producers are outside our control so the sequence must not change.

use std::sync::LazyLock;

use regex::bytes::Regex;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Payload is {0} bytes after cleanup, expected at least 2")]
    TooShort(usize),
}

/// A backslash together with the character it escapes, unless that is a quote.
static ESCAPED_NON_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\[^"]"#).expect("valid regex"));
static DOUBLED_ESCAPED_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\"\\""#).expect("valid regex"));
static ESCAPED_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\\""#).expect("valid regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\t\n\x0C\r ]+").expect("valid regex"));

pub fn normalize(message: &[u8]) -> Result<Vec<u8>, NormalizeError> {
    let repaired = ESCAPED_NON_QUOTE.replace_all(message, &b""[..]);
    let repaired = DOUBLED_ESCAPED_QUOTE.replace_all(&repaired, &b"\""[..]);
    let repaired = ESCAPED_QUOTE.replace_all(&repaired, &b"\""[..]);
    let repaired = WHITESPACE.replace_all(&repaired, &b""[..]);

    // Drop the quotes of the string literal that wrapped the fragment
    match repaired.len() {
        len if len < 2 => Err(NormalizeError::TooShort(len)),
        len => Ok(repaired[1..len - 1].to_vec()),
    }
}
