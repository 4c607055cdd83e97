//! Ring arithmetic, identifiers and local storage for a Chord DHT peer.
//!
//! This crate is the transport-free core: the `inside` predicate that is
//! the only place ring wraparound is handled, the `Identifier` newtype built
//! on top of it, and the local key/value `Storage` a peer consults when it
//! is itself responsible for a key. Nothing here knows about sockets, the
//! wire protocol, or peer descriptors; those live in `chord-p2p`.

#[macro_use]
extern crate failure_derive;

pub mod error;
pub mod identifier;
pub mod ring;
pub mod storage;

pub use crate::error::Error;
pub use crate::identifier::{Identifier, M, MAX_KEY};
pub use crate::ring::inside;
pub use crate::storage::Storage;
