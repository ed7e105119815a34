//! Client for the XMMS2 daemon's IPC protocol.
//!
//! [`Xmms2Client`] speaks the framed binary protocol over the daemon's unix
//! socket and implements [`Daemon`](crate::services::bridge::Daemon) for the
//! bridge.

mod client;
mod daemon;
mod error;
mod message;
pub(crate) mod protocol;
mod value;

pub use client::{BroadcastReceiver, Xmms2Client, socket_path};
pub use error::Xmms2Error;
pub use message::{Message, MessageCodec};
pub use value::Value;
