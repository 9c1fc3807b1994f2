//! Input classification for the interactive loop.
//!
//! A trimmed line is one of three things: a location token, a quantity
//! token, or a free-form item code. The reserved words (`exit`, `undo`) are
//! intercepted by the loop before classification and never reach here.

use once_cell::sync::Lazy;
use regex::Regex;

/// Location shape: a letter A-W followed by one or two digits.
static RE_LOCATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-W]\d{1,2}$").unwrap());

/// Quantity shape: one to three digits. Checked only after the location
/// pattern fails, so a value like `A12` stays a location.
static RE_QUANTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Location(&'a str),
    /// Carries the raw digits; the state machine parses them so that a
    /// parse failure is reported as a user error, never counted as zero.
    Quantity(&'a str),
    /// Anything else, including strings that merely resemble partial codes.
    Code(&'a str),
}

pub fn classify(line: &str) -> Token<'_> {
    if RE_LOCATION.is_match(line) {
        Token::Location(line)
    } else if RE_QUANTITY.is_match(line) {
        Token::Quantity(line)
    } else {
        Token::Code(line)
    }
}
