//! # sync-types
//!
//! Wire format and data model types for wearsync.
//!
//! This crate provides the foundational types shared by both device roles:
//! - [`WeatherRecord`] - the synchronized value
//! - [`SyncEnvelope`] - its wire representation on the sync channel
//! - [`Peer`], [`PeerId`] - transport-assigned peer identity
//! - [`SessionState`] - transport session lifecycle
//! - [`SyncError`] - error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod envelope;
mod error;
mod peer;
mod record;
mod session;

pub use envelope::{SyncEnvelope, WEATHER_PATH};
pub use error::SyncError;
pub use peer::{Peer, PeerId};
pub use record::{WeatherRecord, NO_CONDITION};
pub use session::SessionState;
