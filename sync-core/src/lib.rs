//! # sync-core
//!
//! Pure coordination logic for wearsync (no I/O, instant tests).
//!
//! This crate implements the session/sync state machine and peer
//! bookkeeping without any transport or clock access. The state machine
//! takes events as input and produces a list of actions to execute.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce
//! output without side effects. This enables:
//! - Instant unit tests (no mocks, no async)
//! - Deterministic behavior (same input → same output)
//! - Easy reasoning about state transitions
//!
//! The actual I/O (connecting, messaging, publishing) is performed by
//! `sync-client`, which interprets the actions produced here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinator;
pub mod registry;

pub use coordinator::{Action, Coordinator, DeviceRole, Event, Phase};
pub use registry::PeerRegistry;
