//! Runtime half of the wearsync stack.
//!
//! Owns the transport session, executes the actions decided by
//! `wearsync-core`, and exposes the host-facing surface: construct a
//! [`SyncService`] for your role, hand it the transport event stream, and
//! subscribe to decoded records for the display layer.
//!
//! The transport itself is abstract - hosts implement [`PairingTransport`]
//! over whatever pairing layer the platform provides; [`MockTransport`]
//! covers tests.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod forecast;
pub mod requester;
pub mod service;
pub mod session;
pub mod transport;

pub use channel::{ChannelError, PublishOutcome, SyncChannel};
pub use config::SyncConfig;
pub use forecast::{Forecast, UnitFormatter, WeatherStore};
pub use requester::{RefreshRequester, REFRESH_COMMAND};
pub use service::{Command, ServiceHandle, SyncService};
pub use session::TransportSession;
pub use transport::{
    MockTransport, PairingTransport, TransportError, TransportEvent, TransportEvents,
};
