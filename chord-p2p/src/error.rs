//! Errors for the wire codec, routing state and peer engine.

use failure::Fail;
use std::io;

#[derive(Debug, Fail)]
pub enum Error {
    /// A transport-level failure: connection refused, reset, or any other
    /// I/O error reading or writing a peer connection.
    #[fail(display = "p2p connection error, {}", _0)]
    Connection(io::Error),
    /// The peer on the other end sent something that doesn't parse as a
    /// request or response per the wire grammar.
    #[fail(display = "p2p bad message")]
    BadMessage,
    /// An outbound request exceeded its deadline.
    #[fail(display = "p2p request timed out")]
    Timeout,
    /// A lower-level identifier/storage error.
    #[fail(display = "chord-core error, {}", _0)]
    Core(chord_core::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        match e.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Error::Timeout,
            _ => Error::Connection(e),
        }
    }
}

impl From<chord_core::Error> for Error {
    fn from(e: chord_core::Error) -> Error {
        Error::Core(e)
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(_: std::num::ParseIntError) -> Error {
        Error::BadMessage
    }
}
