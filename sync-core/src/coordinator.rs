//! Session/sync coordination state machine - NO I/O, just transitions.
//!
//! The coordinator takes transport and wake events as input and produces a
//! new phase plus a list of actions to execute. The actual I/O (connecting,
//! sending the refresh command, putting envelopes) is performed by
//! sync-client, not by this module. This enables instant unit testing
//! without network mocks.

use wearsync_types::{Peer, PeerId, SyncEnvelope, WeatherRecord, WEATHER_PATH};

use crate::registry::PeerRegistry;

/// Which side of the pairing this process is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRole {
    /// Owns the authoritative weather data; publishes on request.
    Primary,
    /// Has no data source of its own; observes and displays.
    Companion,
}

/// Coordinator phases.
///
/// Distinct from [`wearsync_types::SessionState`]: the session state
/// belongs to the transport session, the phase describes what the
/// coordinator is doing with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// No session. Any wake kicks off a connect.
    #[default]
    Idle,
    /// Session requested, not yet confirmed.
    Connecting,
    /// Session confirmed, listeners registered, data operations allowed.
    Ready,
    /// Session suspended; listeners unregistered, nothing attempted until
    /// the transport reconnects or tears the session down.
    Degraded,
}

/// Events driving the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// External wake: process start or an explicit start signal.
    StartRequested,
    /// Teardown requested by the owner of the service.
    DisconnectRequested,
    /// Transport confirmed the session.
    SessionConnected,
    /// Transport temporarily lost the session; expected to self-heal.
    SessionSuspended,
    /// Session establishment failed.
    SessionFailed {
        /// Transport-reported reason.
        reason: String,
    },
    /// Transport delivered an explicit disconnect.
    SessionDisconnected,
    /// Result of enumerating currently connected peers on entering Ready.
    PeersEnumerated {
        /// Snapshot reported by the transport.
        peers: Vec<Peer>,
    },
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
        /// Raw payload. Deliberately not inspected - see
        /// [`Coordinator::dispatch_message`].
        payload: Vec<u8>,
    },
    /// An envelope changed on the sync channel.
    DataChanged {
        /// Logical path of the changed envelope.
        path: String,
        /// Encoded envelope bytes.
        payload: Vec<u8>,
    },
}

/// Actions to be executed by sync-client.
///
/// These are instructions, not side effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Request a session with the transport.
    Connect,
    /// Tear the session down.
    Disconnect,
    /// Attach message/data listeners to the live session.
    RegisterListeners,
    /// Detach message/data listeners so no stale callback fires.
    UnregisterListeners,
    /// Ask the transport for the currently connected peers; reply with
    /// [`Event::PeersEnumerated`].
    EnumeratePeers,
    /// Send the refresh command to one peer, fire-and-forget.
    RequestRefresh {
        /// The peer to ask for current data.
        peer: Peer,
    },
    /// Query the local store and publish the current record (best effort;
    /// an absent or sentinel record is a silent skip).
    Publish,
    /// Hand a freshly decoded record to the display layer.
    NotifyDisplay {
        /// The decoded record.
        record: WeatherRecord,
    },
}

/// The coordination state machine for one device.
///
/// Owns the phase, the peer registry, and (on the companion) the latest
/// decoded record. All session bookkeeping stays with the transport
/// session; this machine never duplicates it.
#[derive(Debug, Clone)]
pub struct Coordinator {
    role: DeviceRole,
    phase: Phase,
    peers: PeerRegistry,
    latest: Option<WeatherRecord>,
}

impl Coordinator {
    /// Create an idle coordinator for the given role.
    pub fn new(role: DeviceRole) -> Self {
        Self {
            role,
            phase: Phase::Idle,
            peers: PeerRegistry::new(),
            latest: None,
        }
    }

    /// This device's role.
    pub fn role(&self) -> DeviceRole {
        self.role
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The latest decoded record, if any was observed this process.
    pub fn latest_record(&self) -> Option<&WeatherRecord> {
        self.latest.as_ref()
    }

    /// Snapshot of currently connected peers.
    pub fn connected_peers(&self) -> Vec<Peer> {
        self.peers.connected_peers()
    }

    /// Process one event, returning the actions to execute.
    ///
    /// Events arrive on a single dispatch context; the caller must not
    /// deliver them concurrently.
    pub fn on_event(&mut self, event: Event) -> Vec<Action> {
        match (self.phase, event) {
            // Any wake while idle kicks off a session. Peer identity seen
            // before the session exists is not recorded; the Ready-entry
            // enumeration picks it up.
            (
                Phase::Idle,
                Event::StartRequested | Event::PeerArrived { .. } | Event::MessageReceived { .. },
            ) => {
                self.phase = Phase::Connecting;
                vec![Action::Connect]
            }

            (Phase::Connecting, Event::SessionConnected) => self.enter_ready(),
            (Phase::Connecting, Event::SessionFailed { .. }) => {
                // Not retried here: recovery is the next external wake.
                self.enter_idle(vec![])
            }
            (Phase::Connecting, Event::SessionDisconnected) => self.enter_idle(vec![]),
            (Phase::Connecting, Event::DisconnectRequested) => {
                self.enter_idle(vec![Action::Disconnect])
            }

            (Phase::Ready, Event::PeersEnumerated { peers }) => {
                let mut actions = Vec::new();
                for peer in peers {
                    self.peers.on_peer_arrived(peer.clone());
                    // The companion asks every currently connected peer,
                    // covering peers that joined while we had no listeners.
                    if self.role == DeviceRole::Companion {
                        actions.push(Action::RequestRefresh { peer });
                    }
                }
                actions
            }
            (Phase::Ready, Event::PeerArrived { peer }) => {
                if !self.peers.on_peer_arrived(peer.clone()) {
                    return vec![];
                }
                match self.role {
                    DeviceRole::Companion => vec![Action::RequestRefresh { peer }],
                    DeviceRole::Primary => vec![Action::Publish],
                }
            }
            (Phase::Ready, Event::PeerDeparted { id }) => {
                self.peers.on_peer_departed(&id);
                vec![]
            }
            (Phase::Ready, Event::MessageReceived { .. }) => self.dispatch_message(),
            (Phase::Ready, Event::DataChanged { path, payload }) => {
                self.on_data_changed(&path, &payload)
            }
            (Phase::Ready, Event::StartRequested) => match self.role {
                DeviceRole::Primary => vec![Action::Publish],
                DeviceRole::Companion => vec![],
            },
            (Phase::Ready, Event::SessionSuspended) => {
                self.phase = Phase::Degraded;
                vec![Action::UnregisterListeners]
            }
            (Phase::Ready, Event::SessionFailed { .. } | Event::SessionDisconnected) => {
                self.enter_idle(vec![Action::UnregisterListeners])
            }
            (Phase::Ready, Event::DisconnectRequested) => {
                self.enter_idle(vec![Action::UnregisterListeners, Action::Disconnect])
            }

            // The transport reconnected without an explicit disconnect.
            (Phase::Degraded, Event::SessionConnected) => self.enter_ready(),
            (Phase::Degraded, Event::SessionFailed { .. } | Event::SessionDisconnected) => {
                self.enter_idle(vec![])
            }
            (Phase::Degraded, Event::DisconnectRequested) => {
                self.enter_idle(vec![Action::Disconnect])
            }

            // Everything else: no transition, no actions. This includes
            // message/data/peer events delivered after listeners were
            // unregistered - they must have no effect.
            (_, _) => vec![],
        }
    }

    /// Entry actions for Ready: attach listeners, resynchronize the peer
    /// view, and (primary) attempt an immediate publish.
    fn enter_ready(&mut self) -> Vec<Action> {
        self.phase = Phase::Ready;
        let mut actions = vec![Action::RegisterListeners, Action::EnumeratePeers];
        if self.role == DeviceRole::Primary {
            actions.push(Action::Publish);
        }
        actions
    }

    /// Entry to Idle: the session is over, so the peers it assigned are
    /// gone too. The latest record survives for the display layer.
    fn enter_idle(&mut self, actions: Vec<Action>) -> Vec<Action> {
        self.phase = Phase::Idle;
        self.peers.clear();
        actions
    }

    /// The protocol has exactly one message type, so any inbound message
    /// means "a peer wants current data". Payload discrimination starts
    /// here if a second message type is ever added.
    fn dispatch_message(&self) -> Vec<Action> {
        match self.role {
            DeviceRole::Primary => vec![Action::Publish],
            DeviceRole::Companion => vec![],
        }
    }

    /// Companion observe path: filter by path, decode tolerantly, replace
    /// the latest record, notify the display layer. A completely
    /// unparseable envelope is dropped.
    fn on_data_changed(&mut self, path: &str, payload: &[u8]) -> Vec<Action> {
        if self.role != DeviceRole::Companion || path != WEATHER_PATH {
            return vec![];
        }
        match SyncEnvelope::from_bytes(payload) {
            Ok(envelope) => {
                let record = envelope.into_record();
                self.latest = Some(record.clone());
                vec![Action::NotifyDisplay { record }]
            }
            Err(_) => vec![],
        }
    }
}
