//! Bookkeeping of currently reachable peers.

use std::collections::HashMap;

use wearsync_types::{Peer, PeerId};

/// Tracks the peers currently reachable over the session.
///
/// The registry is the single source of truth for peer identity: peers are
/// created on an arrival event, destroyed on departure, and cleared when
/// the session ends. A peer id appears at most once among connected peers
/// at any instant.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: HashMap<PeerId, Peer>,
}

impl PeerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a peer arrival.
    ///
    /// Returns `true` if the peer was not already connected. The transport
    /// delivers each actual connect exactly once, but a re-delivered
    /// arrival must not look like a new peer to callers.
    pub fn on_peer_arrived(&mut self, peer: Peer) -> bool {
        self.peers.insert(peer.id.clone(), peer).is_none()
    }

    /// Record a peer departure. Returns the departed peer, if known.
    pub fn on_peer_departed(&mut self, id: &PeerId) -> Option<Peer> {
        self.peers.remove(id)
    }

    /// Snapshot of the currently connected peers.
    ///
    /// Order is not guaranteed; callers must not assume arrival order.
    pub fn connected_peers(&self) -> Vec<Peer> {
        self.peers.values().cloned().collect()
    }

    /// Whether the given peer is currently connected.
    pub fn is_connected(&self, id: &PeerId) -> bool {
        self.peers.contains_key(id)
    }

    /// Number of connected peers.
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    /// Whether no peers are connected.
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Drop all peers. Called when the session ends - peer identity never
    /// outlives the session that assigned it.
    pub fn clear(&mut self) {
        self.peers.clear();
    }
}
