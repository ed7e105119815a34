//! MPRIS D-Bus server.
//!
//! Exports `org.mpris.MediaPlayer2` and `org.mpris.MediaPlayer2.Player` on
//! the session bus. Property reads go to the bridge's
//! [`PropertyExporter`](crate::services::bridge::PropertyExporter), methods
//! to its [`CommandTranslator`](crate::services::bridge::CommandTranslator).

mod convert;
mod player;
mod root;
mod server;

pub use server::MprisServer;

/// Object path of the exported player
pub const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";

/// Well-known name prefix; the configured suffix is appended
pub const BUS_NAME_PREFIX: &str = "org.mpris.MediaPlayer2";

/// Prefix of per-track object paths
pub const TRACK_PATH_PREFIX: &str = "/org/mpris/MediaPlayer2/Track";
