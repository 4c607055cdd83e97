//! Configuration for the peer-to-peer server, in the manner of the teacher's
//! `p2p::types::P2PConfig`: fields that the core spec treats as fixed
//! constants are still overridable here, falling back to the constant when
//! the operator leaves the field unset.

use crate::descriptor::Locator;
use chord_core::identifier::{Identifier, M};
use std::time::Duration;

/// Default listening port for peer and client traffic.
pub const DEFAULT_PORT: u16 = 4321;

/// Target length of the successor chain, anticipating future replication.
/// Only the head is consulted by the routing algorithms today.
const CHAIN: usize = 3;

/// How often the finger table is recomputed.
const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Bound on every outbound peer request, so an unreachable peer cannot wedge
/// the refresh loop or an iterative lookup indefinitely. The source imposes
/// no such timeout; this is the SHOULD from the concurrency model.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a single Chord peer process.
#[derive(Debug, Clone)]
pub struct P2PConfig {
    /// Address to bind the listener to.
    pub host: String,
    /// Port to bind the listener to and to advertise in locators.
    pub port: u16,
    /// Locator of an existing peer to join through, if any. Absent means
    /// this peer starts a standalone overlay.
    pub bootstrap: Option<Locator>,
    /// Explicit identifier for this peer. `None` means pick one at random.
    pub key: Option<Identifier>,
    /// Overrides [`CHAIN`].
    pub chain_len: Option<usize>,
    /// Overrides [`REFRESH_INTERVAL`].
    pub refresh_interval: Option<Duration>,
    /// Overrides [`REQUEST_TIMEOUT`].
    pub request_timeout: Option<Duration>,
}

impl Default for P2PConfig {
    fn default() -> P2PConfig {
        P2PConfig {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            bootstrap: None,
            key: None,
            chain_len: None,
            refresh_interval: None,
            request_timeout: None,
        }
    }
}

impl P2PConfig {
    pub fn chain_len(&self) -> usize {
        self.chain_len.unwrap_or(CHAIN)
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval.unwrap_or(REFRESH_INTERVAL)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout.unwrap_or(REQUEST_TIMEOUT)
    }

    /// The identifier this peer will use, picking a random one within the
    /// `M`-bit space if none was configured.
    pub fn resolve_key(&self) -> Identifier {
        self.key.unwrap_or_else(Identifier::random)
    }

    pub fn listen_locator(&self) -> Locator {
        Locator::new(format!("{}:{}", self.host, self.port))
    }
}

/// Sanity bound: `M` must match what the wire codec and finger table assume.
pub const IDENTIFIER_BITS: u32 = M;
