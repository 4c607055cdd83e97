//! The successor chain and finger table one peer owns, and the one-hop
//! routing question they answer. Pure data plus pure functions: no network
//! I/O happens here, so `find_local` can be exercised without any sockets.

use crate::descriptor::{Descriptor, Peer};
use chord_core::identifier::{Identifier, M};
use chord_core::ring::inside;

/// Successor chain plus finger table for one peer. Reads of this state
/// during `find_local` must observe chain head and fingers together; the
/// `PeerEngine` achieves that by holding a single `RwLock<RoutingState>` and
/// never performing network I/O while the lock is held.
pub struct RoutingState {
    self_id: Identifier,
    chain: Vec<Peer>,
    fingers: Vec<Option<Peer>>,
}

impl RoutingState {
    /// A freshly started, standalone peer: empty chain, all fingers empty.
    /// Per I3, such a peer is responsible for every key.
    pub fn standalone(self_id: Identifier) -> RoutingState {
        RoutingState {
            self_id,
            chain: Vec::new(),
            fingers: vec![None; M as usize],
        }
    }

    pub fn self_id(&self) -> Identifier {
        self.self_id
    }

    pub fn chain(&self) -> &[Peer] {
        &self.chain
    }

    pub fn chain_head(&self) -> Option<&Peer> {
        self.chain.first()
    }

    pub fn fingers(&self) -> &[Option<Peer>] {
        &self.fingers
    }

    /// Replaces the successor chain wholesale (used after `connect`).
    pub fn set_chain(&mut self, chain: Vec<Peer>) {
        self.chain = chain;
    }

    /// Prepends a newly joined peer to the chain, making it this peer's new
    /// chain head (§4.5, accept-side step 1).
    pub fn prepend_chain(&mut self, peer: Peer) {
        self.chain.insert(0, peer);
    }

    pub fn set_finger(&mut self, i: usize, peer: Option<Peer>) {
        self.fingers[i] = peer;
    }

    pub fn finger(&self, i: usize) -> Option<&Peer> {
        self.fingers[i].as_ref()
    }

    /// `start_i = (self_id + 2^i) mod MAX_KEY`, the key a finger slot tracks.
    pub fn finger_start(&self, i: u32) -> Identifier {
        self.self_id.finger_start(i)
    }

    /// True iff `key` falls in this peer's own arc — the same test used
    /// both by `find_local`'s first step and by the join/refresh logic that
    /// decides whether a finger slot should stay empty (I2). A standalone
    /// peer (no chain head) owns the whole ring.
    pub fn owns(&self, key: Identifier) -> bool {
        match self.chain_head() {
            None => true,
            Some(head) => inside(key.value(), self.self_id.value(), head.id.value()),
        }
    }

    /// Answers "who is one hop closer to the owner of `key`, from my
    /// knowledge alone" (§4.3). Deterministic and side-effect free.
    pub fn find_local(&self, key: Identifier) -> Descriptor {
        if self.owns(key) {
            return Descriptor::Local;
        }
        for i in 0..(M as usize - 1) {
            let left = match &self.fingers[i] {
                Some(p) => p,
                None => continue, // this peer is responsible for start_i, so it is closer
            };
            let right = match &self.fingers[i + 1] {
                Some(p) => p,
                None => continue,
            };
            if inside(key.value(), left.id.value(), right.id.value()) {
                return Descriptor::Remote(left.clone());
            }
        }
        match &self.fingers[M as usize - 1] {
            None => {
                // Funny corner case: the key lies between self and head in a
                // degenerate configuration where the last finger is unset.
                Descriptor::Remote(
                    self.chain_head()
                        .cloned()
                        .expect("owns() would have returned Local with no chain head"),
                )
            }
            Some(last) => Descriptor::Remote(last.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Locator;

    fn peer(id: u32) -> Peer {
        Peer::new(Identifier::new(id), Locator::new("host:4321"))
    }

    #[test]
    fn standalone_peer_is_responsible_for_every_key() {
        // P3
        let state = RoutingState::standalone(Identifier::new(100));
        for k in [0u32, 1, 100, 1_000_000] {
            assert_eq!(state.find_local(Identifier::new(k)), Descriptor::Local);
        }
    }

    #[test]
    fn key_inside_own_arc_resolves_locally() {
        let mut state = RoutingState::standalone(Identifier::new(10));
        state.set_chain(vec![peer(20)]);
        assert_eq!(state.find_local(Identifier::new(10)), Descriptor::Local);
        assert_eq!(state.find_local(Identifier::new(15)), Descriptor::Local);
        // Key 20 is the chain head itself: inside() is half-open on the
        // right, so it is NOT locally owned; the corner-case fallback
        // returns the chain head, not `Local`.
        assert_eq!(
            state.find_local(Identifier::new(20)),
            Descriptor::Remote(peer(20))
        );
    }

    #[test]
    fn key_outside_own_arc_falls_back_to_chain_head_when_fingers_empty() {
        let mut state = RoutingState::standalone(Identifier::new(10));
        state.set_chain(vec![peer(20)]);
        assert_eq!(
            state.find_local(Identifier::new(25)),
            Descriptor::Remote(peer(20))
        );
    }

    #[test]
    fn finger_bracket_is_preferred_over_chain_head_fallback() {
        let mut state = RoutingState::standalone(Identifier::new(0));
        state.set_chain(vec![peer(5)]);
        state.set_finger(0, Some(peer(100)));
        state.set_finger(1, Some(peer(200)));
        // key 150 falls in [fingers[0].id=100, fingers[1].id=200)
        assert_eq!(
            state.find_local(Identifier::new(150)),
            Descriptor::Remote(peer(100))
        );
    }
}
