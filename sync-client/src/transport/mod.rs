//! Transport abstraction for the device pairing library.
//!
//! The pairing transport provides session, peer, message, and
//! key/value-observe primitives. It delivers all lifecycle/peer/message/data
//! events on its own dispatch context as a stream of [`TransportEvent`]s;
//! the service consumes that stream from a single task, so event handling
//! is never concurrent.
//!
//! # Design
//!
//! Operations are fire-and-forget from the caller's perspective:
//! `connect()` returns before the session is confirmed (confirmation
//! arrives as [`TransportEvent::Connected`]), and `send_message()` /
//! `put_data()` outcomes are only ever logged.

mod mock;

pub use mock::MockTransport;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use wearsync_types::{Peer, PeerId};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Session request failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation attempted without a session.
    #[error("not connected")]
    NotConnected,

    /// Message send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Envelope put failed.
    #[error("put failed: {0}")]
    PutFailed(String),
}

/// Events delivered by the transport on its dispatch context.
///
/// Within one session, lifecycle events are totally ordered; arrival
/// precedes departure for any given peer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Session confirmed.
    Connected,
    /// Transport temporarily unavailable; expected to self-heal.
    Suspended,
    /// Session establishment failed.
    Failed {
        /// Transport-reported reason.
        reason: String,
    },
    /// Session torn down.
    Disconnected,
    /// A peer became reachable.
    PeerArrived {
        /// The arrived peer.
        peer: Peer,
    },
    /// A peer became unreachable.
    PeerDeparted {
        /// Id of the departed peer.
        id: PeerId,
    },
    /// An inbound message from a peer.
    MessageReceived {
        /// Sender.
        from: PeerId,
        /// Opaque payload.
        payload: Vec<u8>,
    },
    /// An envelope changed at some logical path.
    DataChanged {
        /// The changed path.
        path: String,
        /// Encoded envelope bytes.
        payload: Vec<u8>,
    },
}

/// Receiving half of a transport's event stream.
pub type TransportEvents = mpsc::UnboundedReceiver<TransportEvent>;

/// The device pairing transport.
///
/// Implementations wrap the host's pairing library; [`MockTransport`]
/// implements it in-memory for tests.
#[async_trait]
pub trait PairingTransport: Send + Sync {
    /// Request a session. Returns once the request is submitted; the
    /// confirmation arrives as [`TransportEvent::Connected`].
    async fn connect(&self) -> Result<(), TransportError>;

    /// Tear the session down.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Send an opaque message to one peer.
    async fn send_message(&self, to: &PeerId, payload: &[u8]) -> Result<(), TransportError>;

    /// Write an envelope at the given logical path, creating a strictly
    /// newer version. The transport guarantees at-least-once delivery of
    /// the newest version to all current and future observers.
    async fn put_data(&self, path: &str, payload: &[u8]) -> Result<(), TransportError>;

    /// Snapshot of currently connected peers.
    async fn connected_peers(&self) -> Result<Vec<Peer>, TransportError>;

    /// Attach message/data listeners to the live session.
    fn register_listeners(&self);

    /// Detach message/data listeners. Synchronous, so no stale callback
    /// fires after it returns.
    fn unregister_listeners(&self);

    /// Whether a session is currently held.
    fn is_connected(&self) -> bool;
}
