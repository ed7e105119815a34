//! Bridging core between the daemon's asynchronous protocol and the
//! synchronous-looking MPRIS surface.
//!
//! ```text
//! daemon events → PlayerEventAdapter → StateCache → ChangeNotifier → BridgeSignal
//!                                          │
//!                           published snapshot → PropertyExporter
//! control calls → CommandTranslator → daemon requests
//! ```

/// Daemon notification adapter
pub mod adapter;
/// Control-surface command translation
pub mod commands;
/// Daemon-facing trait
pub mod daemon;
/// Bridge error types
pub mod error;
/// Change detection for exported properties
pub mod notifier;
/// Synchronous property queries
pub mod properties;
/// Composition root
pub mod service;
/// Cached player state
pub mod state;

#[cfg(test)]
mod tests;

pub use adapter::{AdapterOutput, PlayerEventAdapter};
pub use commands::{
    CommandHandle, CommandId, CommandOutcome, CommandState, CommandTranslator, CommandVerb,
    PendingCommand,
};
pub use daemon::{Daemon, DaemonError, DaemonEvent, DaemonEventStream};
pub use error::{BridgeError, ErrorKind};
pub use notifier::{BridgeSignal, ChangeNotifier, ChangeSet};
pub use properties::{
    AppIdentity, MprisInterface, NO_TRACK, PlayerCapabilities, PropertyExporter, PropertyMap,
    PropertyValue,
};
pub use service::BridgeService;
pub use state::{PlaybackStatus, PlayerState, StateCache, StateUpdate, TrackMetadata};
