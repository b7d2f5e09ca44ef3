//! Mock transport for testing.
//!
//! Captures sent messages and put envelopes, and allows forcing failures,
//! so tests can verify the service's behavior without a host transport.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wearsync_types::{Peer, PeerId};

use super::{PairingTransport, TransportError};

/// Mock transport for testing.
///
/// Clones share state, so a test can hold one handle while the service
/// owns another.
#[derive(Debug, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    connected: bool,
    listeners_registered: bool,
    connect_calls: u32,
    peers: Vec<Peer>,
    sent_messages: Vec<(PeerId, Vec<u8>)>,
    puts: Vec<(String, Vec<u8>)>,
    fail_next_connect: Option<String>,
    fail_next_send: Option<String>,
    fail_next_put: Option<String>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a peer visible to `connected_peers()`.
    pub fn add_peer(&self, peer: Peer) {
        let mut inner = self.inner.lock().unwrap();
        inner.peers.retain(|p| p.id != peer.id);
        inner.peers.push(peer);
    }

    /// Remove a peer from `connected_peers()`.
    pub fn remove_peer(&self, id: &PeerId) {
        let mut inner = self.inner.lock().unwrap();
        inner.peers.retain(|p| &p.id != id);
    }

    /// All messages that were sent, in order.
    pub fn sent_messages(&self) -> Vec<(PeerId, Vec<u8>)> {
        self.inner.lock().unwrap().sent_messages.clone()
    }

    /// All envelope puts, in order.
    pub fn puts(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.lock().unwrap().puts.clone()
    }

    /// The newest surviving envelope for a path, per the transport's
    /// last-write-wins contract.
    pub fn latest_put(&self, path: &str) -> Option<Vec<u8>> {
        self.inner
            .lock()
            .unwrap()
            .puts
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, bytes)| bytes.clone())
    }

    /// Whether message/data listeners are currently attached.
    pub fn listeners_registered(&self) -> bool {
        self.inner.lock().unwrap().listeners_registered
    }

    /// How many times `connect()` was called.
    pub fn connect_calls(&self) -> u32 {
        self.inner.lock().unwrap().connect_calls
    }

    /// Cause the next connect() to fail with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_connect = Some(error.to_string());
    }

    /// Cause the next send_message() to fail with the given error.
    pub fn fail_next_send(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_send = Some(error.to_string());
    }

    /// Cause the next put_data() to fail with the given error.
    pub fn fail_next_put(&self, error: &str) {
        self.inner.lock().unwrap().fail_next_put = Some(error.to_string());
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[async_trait]
impl PairingTransport for MockTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connect_calls += 1;

        if let Some(error) = inner.fail_next_connect.take() {
            return Err(TransportError::ConnectionFailed(error));
        }

        inner.connected = true;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();
        inner.connected = false;
        inner.listeners_registered = false;
        Ok(())
    }

    async fn send_message(&self, to: &PeerId, payload: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_send.take() {
            return Err(TransportError::SendFailed(error));
        }

        inner.sent_messages.push((to.clone(), payload.to_vec()));
        Ok(())
    }

    async fn put_data(&self, path: &str, payload: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if let Some(error) = inner.fail_next_put.take() {
            return Err(TransportError::PutFailed(error));
        }

        inner.puts.push((path.to_string(), payload.to_vec()));
        Ok(())
    }

    async fn connected_peers(&self) -> Result<Vec<Peer>, TransportError> {
        let inner = self.inner.lock().unwrap();

        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        Ok(inner.peers.clone())
    }

    fn register_listeners(&self) {
        self.inner.lock().unwrap().listeners_registered = true;
    }

    fn unregister_listeners(&self) {
        self.inner.lock().unwrap().listeners_registered = false;
    }

    fn is_connected(&self) -> bool {
        self.inner.lock().unwrap().connected
    }
}
