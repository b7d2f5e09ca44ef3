//! Ownership of the one transport session a process holds.

use std::sync::Arc;

use tracing::debug;
use wearsync_types::SessionState;

use crate::transport::{PairingTransport, TransportError};

/// Owns the connection to the pairing transport.
///
/// Holds the authoritative [`SessionState`]; every other component reads
/// it, none mutates it. The session object itself belongs to the sync
/// service - the requester and channel only get a shared read-only handle
/// to the transport.
pub struct TransportSession<T> {
    transport: Arc<T>,
    state: SessionState,
}

impl<T: PairingTransport> TransportSession<T> {
    /// Wrap a transport with a fresh, disconnected session.
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            state: SessionState::Disconnected,
        }
    }

    /// Request a session. Idempotent: a no-op while a request is already
    /// in flight or a session is held.
    ///
    /// Does not wait for confirmation - that arrives later as a transport
    /// event. An error here means the request itself could not be made.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.state.is_active() {
            debug!(state = ?self.state, "connect requested on active session, ignoring");
            return Ok(());
        }

        self.state = SessionState::Connecting;
        match self.transport.connect().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = SessionState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Tear the session down. Idempotent.
    ///
    /// Listeners are detached before the transport disconnect, so no stale
    /// callback fires after this returns.
    pub async fn disconnect(&mut self) -> Result<(), TransportError> {
        if self.state == SessionState::Disconnected {
            return Ok(());
        }

        self.transport.unregister_listeners();
        let result = self.transport.disconnect().await;
        self.state = SessionState::Disconnected;
        result
    }

    /// Transport confirmed the session.
    pub fn on_connected(&mut self) {
        self.state = SessionState::Connected;
    }

    /// Transport suspended the session; it is expected to self-heal.
    pub fn on_suspended(&mut self) {
        self.state = SessionState::Suspended;
    }

    /// Session establishment failed.
    pub fn on_failed(&mut self, reason: String) {
        self.state = SessionState::Failed(reason);
    }

    /// Transport delivered an explicit disconnect.
    pub fn on_disconnected(&mut self) {
        self.state = SessionState::Disconnected;
    }

    /// The readiness signal: current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether the session is confirmed.
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }
}
