//! The refresh request: companion asks a primary to publish current data.

use std::sync::Arc;

use tracing::{debug, warn};
use wearsync_types::Peer;

use crate::transport::PairingTransport;

/// The fixed command payload.
///
/// The protocol has exactly one message type; receivers treat any inbound
/// message as a refresh trigger and never inspect this content.
pub const REFRESH_COMMAND: &[u8] = b"send me the data";

/// Sends refresh requests to peers over the session.
pub struct RefreshRequester<T> {
    transport: Arc<T>,
}

impl<T: PairingTransport> RefreshRequester<T> {
    /// Create a requester over a shared transport handle.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Ask one peer to publish current data. Fire-and-forget: a failure is
    /// logged and never retried - the next peer or session event recovers.
    pub async fn request_refresh(&self, peer: &Peer) {
        debug!(peer = %peer.id, "requesting refresh");
        if let Err(e) = self.transport.send_message(&peer.id, REFRESH_COMMAND).await {
            warn!(peer = %peer.id, error = %e, "refresh request failed");
        }
    }
}
