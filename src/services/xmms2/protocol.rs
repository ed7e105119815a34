//! Wire constants of the XMMS2 IPC protocol.

/// Protocol revision announced in the hello message
pub const PROTOCOL_VERSION: i64 = 24;

/// Size of the fixed message header
pub const HEADER_LEN: usize = 16;

/// Largest payload accepted from the daemon
pub const MAX_PAYLOAD_LEN: usize = 16 * 1024 * 1024;

/// Deepest value nesting accepted from the daemon
pub const MAX_VALUE_DEPTH: usize = 64;

/// Default socket template, `{user}` is replaced by the login name
pub const DEFAULT_IPC_PATH: &str = "unix:///tmp/xmms-ipc-{user}";

/// Environment variable overriding the IPC path
pub const IPC_PATH_ENV: &str = "XMMS_PATH";

/// Object ids addressed by the header's first field
pub mod object {
    pub const SIGNAL: u32 = 0;
    pub const MAIN: u32 = 1;
    pub const PLAYLIST: u32 = 2;
    pub const PLAYBACK: u32 = 4;
    pub const MEDIALIB: u32 = 5;
}

/// Command ids of messages sent by the daemon
pub mod reply {
    pub const REPLY: u32 = 0;
    pub const ERROR: u32 = 1;
}

pub mod main {
    pub const HELLO: u32 = 32;
    pub const QUIT: u32 = 33;
}

pub mod playlist {
    pub const SET_NEXT_REL: u32 = 34;
}

pub mod playback {
    pub const START: u32 = 32;
    pub const STOP: u32 = 33;
    pub const PAUSE: u32 = 34;
    pub const TICKLE: u32 = 35;
    pub const PLAYTIME: u32 = 36;
    pub const SEEK_MS: u32 = 37;
    pub const STATUS: u32 = 39;
    pub const CURRENT_ID: u32 = 40;
    pub const VOLUME_SET: u32 = 41;
    pub const VOLUME_GET: u32 = 42;

    /// Seek relative to the current position
    pub const SEEK_CUR: i64 = 1;

    pub const STATUS_STOP: i64 = 0;
    pub const STATUS_PLAY: i64 = 1;
    pub const STATUS_PAUSE: i64 = 2;
}

pub mod medialib {
    pub const GET_INFO: u32 = 32;
}

pub mod signal {
    pub const BROADCAST: u32 = 33;
}

/// Broadcast ids passed to [`signal::BROADCAST`]
pub mod broadcast {
    pub const PLAYBACK_STATUS: i64 = 2;
    pub const PLAYBACK_VOLUME_CHANGED: i64 = 3;
    pub const PLAYBACK_CURRENT_ID: i64 = 5;
}

/// Type tags of serialized values
pub mod value_type {
    pub const NONE: u32 = 0;
    pub const ERROR: u32 = 1;
    pub const INT64: u32 = 2;
    pub const STRING: u32 = 3;
    pub const COLL: u32 = 4;
    pub const BIN: u32 = 5;
    pub const LIST: u32 = 6;
    pub const DICT: u32 = 7;
}
