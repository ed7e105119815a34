use super::commands::CommandVerb;

/// Coarse classification of bridge failures.
///
/// Property-query kinds are local and recoverable. `ConnectionLost` is fatal to
/// the whole bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Property query named an interface the bridge does not export
    UnknownInterface,
    /// Property query named a property the interface does not have
    UnknownProperty,
    /// Command argument outside its declared domain
    OutOfRange,
    /// The daemon answered a command with a failure
    DaemonRequestFailed,
    /// The daemon connection went away
    ConnectionLost,
    /// The command was cancelled before the daemon answered
    Abandoned,
}

/// Errors surfaced by the bridge core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// Interface identifier not exported by this bridge
    #[error("object does not implement the {interface} interface")]
    UnknownInterface {
        /// The offending interface identifier
        interface: String,
    },

    /// Property not part of the named interface
    #[error("interface {interface} has no property {property}")]
    UnknownProperty {
        /// Interface that was queried
        interface: String,
        /// The offending property name
        property: String,
    },

    /// Command argument rejected before any daemon request was issued
    #[error("{argument} {value} is outside [{min}, {max}]")]
    OutOfRange {
        /// Name of the rejected argument
        argument: &'static str,
        /// Value supplied by the caller
        value: f64,
        /// Lowest accepted value
        min: f64,
        /// Highest accepted value
        max: f64,
    },

    /// The daemon reported a failure for a command
    #[error("daemon failed to {verb}: {reason}")]
    DaemonRequestFailed {
        /// Command that failed
        verb: CommandVerb,
        /// Failure description reported by the daemon layer
        reason: String,
    },

    /// Connection to the daemon was lost
    #[error("connection to the daemon was lost")]
    ConnectionLost,

    /// Command cancelled by shutdown or dropped by its caller
    #[error("{verb} was abandoned before the daemon answered")]
    Abandoned {
        /// Command that was abandoned
        verb: CommandVerb,
    },
}

impl BridgeError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownInterface { .. } => ErrorKind::UnknownInterface,
            Self::UnknownProperty { .. } => ErrorKind::UnknownProperty,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::DaemonRequestFailed { .. } => ErrorKind::DaemonRequestFailed,
            Self::ConnectionLost => ErrorKind::ConnectionLost,
            Self::Abandoned { .. } => ErrorKind::Abandoned,
        }
    }
}
