//! xmms2-mpris - MPRIS2 bridge for the XMMS2 music daemon.
//!
//! Connects to a running XMMS2 daemon and exports it on the D-Bus session
//! bus as an `org.mpris.MediaPlayer2` player, so desktop media keys, panel
//! widgets and tools like `playerctl` can see and control it.
//!
//! - [`services::xmms2`] speaks the daemon's IPC protocol
//! - [`services::bridge`] caches daemon state and translates commands
//! - [`mpris`] exports the result on the session bus

/// Command-line arguments.
pub mod cli;

/// Configuration schema and loading.
pub mod config;

/// Core error types and result aliases.
pub mod core;

/// MPRIS D-Bus server.
pub mod mpris;

/// Daemon client and bridging core.
pub mod services;

/// Logging setup.
pub mod tracing_config;

/// Re-exported core types for convenience.
pub use crate::core::{AppError, Result};
