//! Transport session lifecycle states.

/// Lifecycle of the one session a process holds with the pairing transport.
///
/// Owned exclusively by the transport session; every other component reads
/// it, none mutates it. `Suspended` is expected to self-heal and is distinct
/// from `Failed`, which relies on the next external wake for recovery.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session with the transport.
    #[default]
    Disconnected,
    /// Session requested, not yet confirmed.
    Connecting,
    /// Session confirmed; data operations are possible.
    Connected,
    /// Transport temporarily unavailable; the session object survives.
    Suspended,
    /// Session establishment failed.
    Failed(String),
}

impl SessionState {
    /// Whether the session is confirmed and usable.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether a connect is already requested or confirmed.
    ///
    /// `connect()` is idempotent: calling it in one of these states is a
    /// no-op.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected | Self::Suspended)
    }
}
