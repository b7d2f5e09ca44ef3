//! Transport-assigned peer identity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for a reachable peer.
///
/// Assigned by the pairing transport; never minted by this crate's own
/// components. A peer id appears at most once among connected peers at any
/// instant.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(String);

impl PeerId {
    /// Wrap a transport-assigned identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerId({})", self.0)
    }
}

/// A currently reachable peer.
///
/// Owned by the peer registry for the duration of the session; no component
/// may cache one beyond it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    /// Transport-assigned identifier.
    pub id: PeerId,
    /// Human-readable name reported by the transport.
    pub display_name: String,
}

impl Peer {
    /// Create a peer from transport-reported identity.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: PeerId::new(id),
            display_name: display_name.into(),
        }
    }
}
