use crate::services::bridge::DaemonError;

/// Errors raised by the XMMS2 IPC client
#[derive(thiserror::Error, Debug)]
pub enum Xmms2Error {
    /// The IPC socket could not be opened
    #[error("cannot connect to XMMS2 at {path}: {source}")]
    Connect {
        /// Socket path that was tried
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The IPC path names a transport other than a unix socket
    #[error("unsupported IPC transport in {0:?}")]
    UnsupportedTransport(String),

    /// Reading from or writing to the socket failed
    #[error("XMMS2 socket I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes on the wire do not form a valid message
    #[error("malformed XMMS2 message: {0}")]
    Protocol(String),

    /// The daemon answered with an error reply
    #[error("XMMS2 error: {0}")]
    Server(String),

    /// The reply carried a value of the wrong type
    #[error("expected {expected} in XMMS2 reply, got {found}")]
    UnexpectedValue {
        /// Type the request returns
        expected: &'static str,
        /// Type that arrived
        found: &'static str,
    },

    /// The connection closed before the reply arrived
    #[error("XMMS2 connection closed")]
    Disconnected,
}

impl Xmms2Error {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

impl From<Xmms2Error> for DaemonError {
    fn from(error: Xmms2Error) -> Self {
        match error {
            Xmms2Error::Disconnected => DaemonError::Disconnected,
            other => DaemonError::Request(other.to_string()),
        }
    }
}
