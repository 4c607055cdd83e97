//! Error types for the ring/identifier/storage layer.

use failure::Fail;
use std::num::ParseIntError;

/// Errors that can arise from the pure, transport-free parts of a Chord peer:
/// parsing identifiers and reading/writing local storage.
#[derive(Debug, Fail)]
pub enum Error {
    /// A hex identifier literal failed to parse.
    #[fail(display = "invalid identifier literal: {}", _0)]
    InvalidIdentifier(String),
}

impl From<ParseIntError> for Error {
    fn from(e: ParseIntError) -> Error {
        Error::InvalidIdentifier(e.to_string())
    }
}
