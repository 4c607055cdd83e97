//! Wire codec, routing state and peer engine for a Chord DHT peer.
//!
//! This crate carries the parts of the core spec that need a network: the
//! line-oriented wire protocol (`codec`), the pure successor-chain/finger
//! table (`routing`), the join/resolve/get/put/refresh peer engine
//! (`engine`), the outbound RPC helpers it calls (`rpc`), the inbound
//! request dispatcher (`handler`), and the TCP listener (`server`).

#[macro_use]
extern crate failure_derive;

pub mod codec;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod handler;
pub mod routing;
pub mod rpc;
pub mod server;

pub use crate::config::P2PConfig;
pub use crate::descriptor::{Descriptor, Locator, Peer};
pub use crate::engine::{spawn_refresh_loop, PeerEngine};
pub use crate::error::Error;
