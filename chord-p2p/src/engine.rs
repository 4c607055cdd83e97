//! The peer engine: join protocol, iterative resolver, `get`/`put`
//! dispatch, and periodic finger refresh. This is the component that
//! actually performs network I/O; `RoutingState` stays pure.

use crate::codec::Response;
use crate::config::P2PConfig;
use crate::descriptor::{Descriptor, Locator, Peer};
use crate::error::Error;
use crate::routing::RoutingState;
use crate::rpc;
use chord_core::identifier::{Identifier, M};
use chord_core::storage::Storage;
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread;
use std::thread::JoinHandle;

/// Owns routing state and local storage for one Chord peer, and implements
/// every operation in §4.4–§4.7 of the core spec. Routing state is a single
/// `RwLock`: handlers and the refresh thread take the lock only to read or
/// write the chain/fingers, and release it before any network call, per the
/// "no network I/O under the lock" rule.
pub struct PeerEngine {
    config: P2PConfig,
    self_id: Identifier,
    routing: RwLock<RoutingState>,
    storage: Storage,
}

impl PeerEngine {
    pub fn new(config: P2PConfig) -> PeerEngine {
        let self_id = config.resolve_key();
        info!("peer key: {:x}", self_id.value());
        PeerEngine {
            routing: RwLock::new(RoutingState::standalone(self_id)),
            storage: Storage::new(),
            self_id,
            config,
        }
    }

    pub fn self_id(&self) -> Identifier {
        self.self_id
    }

    pub fn config(&self) -> &P2PConfig {
        &self.config
    }

    /// A snapshot of the current successor chain, e.g. to answer an
    /// `accept` request.
    pub fn chain_snapshot(&self) -> Vec<Peer> {
        self.routing.read().chain().to_vec()
    }

    /// §4.3: one-hop routing question, answered entirely from local state.
    pub fn find_local(&self, key: Identifier) -> Descriptor {
        self.routing.read().find_local(key)
    }

    /// §4.4, steady-state case: seeds the iterative resolver from this
    /// peer's own finger table. `Ok(None)` means this peer is itself
    /// responsible for `key`.
    pub fn find_responsible(&self, key: Identifier) -> Result<Option<Peer>, Error> {
        match self.find_local(key) {
            Descriptor::Local => Ok(None),
            Descriptor::Remote(peer) => self.resolve_from(key, peer.locator).map(Some),
        }
    }

    /// §4.4, join case: seeds the iterative resolver from an explicit
    /// bootstrap locator rather than local state. Always resolves to a
    /// remote peer, since the seed itself is remote.
    pub fn find_responsible_via(&self, key: Identifier, bootstrap: &Locator) -> Result<Peer, Error> {
        self.resolve_from(key, bootstrap.clone())
    }

    fn resolve_from(&self, key: Identifier, start: Locator) -> Result<Peer, Error> {
        let mut locator = start;
        loop {
            let reply = rpc::find(&locator, key, self.config.request_timeout())?;
            match reply {
                Response::Me(id) => return Ok(Peer::new(id, locator)),
                Response::Peer(_, next) => locator = next,
                _ => return Err(Error::BadMessage),
            }
        }
    }

    /// §4.5, joiner side: inserts this peer into the ring reached through
    /// `bootstrap`, seeding the successor chain and populating fingers.
    pub fn connect(&self, bootstrap: &Locator) -> Result<(), Error> {
        info!("connecting to: {}", bootstrap);
        let successor = self.find_responsible_via(self.self_id, bootstrap)?;
        debug!(
            "immediate successor: {:x} at {}",
            successor.id.value(),
            successor.locator
        );

        let reply_chain = rpc::accept(
            &successor.locator,
            self.self_id,
            self.config.port,
            self.config.request_timeout(),
        )?;
        let mut chain = vec![successor];
        chain.extend(reply_chain.into_iter().flatten());
        chain.truncate(self.config.chain_len());
        self.routing.write().set_chain(chain);

        for i in 0..M {
            let start = self.routing.read().finger_start(i);
            let owns = self.routing.read().owns(start);
            if owns {
                self.routing.write().set_finger(i as usize, None);
                continue;
            }
            match self.find_responsible_via(start, bootstrap) {
                Ok(peer) => self.routing.write().set_finger(i as usize, Some(peer)),
                Err(e) => warn!("connect: failed to resolve finger {}: {}", i, e),
            }
        }
        Ok(())
    }

    /// §4.5, accepting side: a peer `new_id`/`new_locator` has asked to join
    /// through us. Returns the chain as it stood *before* the prepend, which
    /// is what the joiner should append to its own.
    ///
    /// Key handoff to the joiner is a documented non-goal (§9): the new
    /// peer's arc is not populated with the keys it now owns.
    pub fn accept(&self, new_id: Identifier, new_locator: Locator) -> Vec<Peer> {
        info!("accepting join from {:x} at {}", new_id.value(), new_locator);
        let new_peer = Peer::new(new_id, new_locator);
        let mut routing = self.routing.write();
        let previous_chain = routing.chain().to_vec();
        routing.prepend_chain(new_peer.clone());
        for i in 0..(M as usize) {
            let start = routing.finger_start(i as u32);
            if routing.finger(i).is_none() && !routing.owns(start) {
                routing.set_finger(i, Some(new_peer.clone()));
            }
        }
        previous_chain
    }

    /// §4.7: resolve the responsible peer and answer from local storage, or
    /// forward the `get`.
    pub fn get(&self, key: Identifier) -> Result<Option<Vec<u8>>, Error> {
        let responsible = self.find_responsible(key)?;
        debug!("peer {:?} responsible for key {:x}", responsible, key.value());
        match responsible {
            None => Ok(self.storage.get(key)),
            Some(peer) => rpc::get(&peer.locator, key, self.config.request_timeout()),
        }
    }

    /// §4.7: resolve the responsible peer and write to local storage, or
    /// forward the `put`.
    pub fn put(&self, key: Identifier, value: Vec<u8>) -> Result<(), Error> {
        let responsible = self.find_responsible(key)?;
        debug!("peer {:?} responsible for key {:x}", responsible, key.value());
        match responsible {
            None => {
                self.storage.put(key, value);
                Ok(())
            }
            Some(peer) => rpc::put(&peer.locator, key, value, self.config.request_timeout()),
        }
    }

    /// §4.6: recomputes every finger slot whose start is not in this peer's
    /// own arc; clears slots whose start now falls inside it. A no-op for a
    /// standalone peer (empty chain).
    pub fn refresh_once(&self) {
        info!("storing {} values", self.storage_len());
        debug!("chain: {:?}", self.routing.read().chain());
        if self.routing.read().chain().is_empty() {
            return;
        }
        debug!("refreshing finger table");
        let mut resolved = 0usize;
        for i in 0..M {
            let start = self.routing.read().finger_start(i);
            let owns = self.routing.read().owns(start);
            if owns {
                self.routing.write().set_finger(i as usize, None);
                continue;
            }
            match self.find_responsible(start) {
                Ok(Some(peer)) => {
                    self.routing.write().set_finger(i as usize, Some(peer));
                    resolved += 1;
                }
                Ok(None) => self.routing.write().set_finger(i as usize, None),
                Err(e) => warn!("refresh: failed to resolve finger {}: {}", i, e),
            }
        }
        debug!("{} fingers established", resolved);
    }

    pub fn storage_len(&self) -> usize {
        self.storage.len()
    }
}

/// Spawns the dedicated maintenance thread that ticks `refresh_once` every
/// `REFRESH_INTERVAL`. Runs serially in a single logical task, as the
/// concurrency model requires.
pub fn spawn_refresh_loop(engine: Arc<PeerEngine>) -> JoinHandle<()> {
    thread::spawn(move || loop {
        thread::sleep(engine.config.refresh_interval());
        engine.refresh_once();
    })
}
