//! Codec error types

use thiserror::Error;

/// Errors from decoding, encoding, rendering or parsing a macro
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Flat value is not a whole number of 3-integer events, or an event
    /// carries fields that cannot round-trip
    #[error("Malformed macro: {0}")]
    MalformedMacro(String),

    /// Event tag (flat form) or kind name (text form) is not KEY_UP, KEY_DOWN or WAIT
    #[error("Unknown event kind: \"{0}\" (expected KEY_UP, KEY_DOWN or WAIT)")]
    UnknownEventKind(String),

    /// Key name or keycode value is not in the keycode table
    #[error("Unknown keycode: \"{0}\"")]
    UnknownKeycode(String),

    /// Event line does not have exactly two whitespace-separated tokens
    #[error("Malformed line: \"{line}\" has {tokens} token(s), expected 2")]
    MalformedLine { line: String, tokens: usize },

    /// WAIT duration is not an integer in 0..=65535 ms
    #[error("Wait duration out of range: \"{0}\" (expected 0-65535 ms)")]
    DurationOutOfRange(String),

    /// WAIT argument is not a plain non-negative integer
    #[error("Invalid wait duration: \"{0}\" (expected milliseconds as a whole number)")]
    InvalidDuration(String),

    /// Stored text is not a bracketed comma-separated list of integers
    #[error("Invalid raw macro_value: \"{0}\"")]
    InvalidRawValue(String),

    /// Error while parsing a specific line of an edited document
    #[error("line {line}: {source}")]
    AtLine {
        line: usize,
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// Strip any line-number wrapper and return the underlying error.
    pub fn root(&self) -> &CodecError {
        match self {
            CodecError::AtLine { source, .. } => source.root(),
            other => other,
        }
    }

    /// 1-based line number in the edited document, if known.
    pub fn line(&self) -> Option<usize> {
        match self {
            CodecError::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}
