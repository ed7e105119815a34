use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::services::common::Property;

use super::{BridgeError, PlaybackStatus, PlayerState, TrackMetadata};

/// Interfaces exported on the MPRIS object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MprisInterface {
    /// `org.mpris.MediaPlayer2`
    Application,
    /// `org.mpris.MediaPlayer2.Player`
    Player,
}

impl MprisInterface {
    /// D-Bus name of the application-level interface
    pub const APPLICATION_NAME: &'static str = "org.mpris.MediaPlayer2";
    /// D-Bus name of the player-level interface
    pub const PLAYER_NAME: &'static str = "org.mpris.MediaPlayer2.Player";

    /// Resolve an interface identifier.
    ///
    /// # Errors
    /// Returns `BridgeError::UnknownInterface` carrying `interface` when it is
    /// not one of the two exported interfaces.
    pub fn parse(interface: &str) -> Result<Self, BridgeError> {
        match interface {
            Self::APPLICATION_NAME => Ok(Self::Application),
            Self::PLAYER_NAME => Ok(Self::Player),
            other => Err(BridgeError::UnknownInterface {
                interface: other.to_string(),
            }),
        }
    }

    /// D-Bus name of this interface
    pub fn name(self) -> &'static str {
        match self {
            Self::Application => Self::APPLICATION_NAME,
            Self::Player => Self::PLAYER_NAME,
        }
    }
}

impl fmt::Display for MprisInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of one exported property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Boolean
    Bool(bool),
    /// Double precision float
    Double(f64),
    /// Signed 64-bit integer
    Int64(i64),
    /// String
    Str(String),
    /// List of strings
    StrList(Vec<String>),
    /// Track metadata record
    Metadata(TrackMetadata),
}

impl PropertyValue {
    /// Boolean payload, if this is a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Float payload, if this is a double
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer payload, if this is an int64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int64(value) => Some(*value),
            _ => None,
        }
    }

    /// String payload, if this is a string
    pub fn into_string(self) -> Option<String> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// List payload, if this is a string list
    pub fn into_str_list(self) -> Option<Vec<String>> {
        match self {
            Self::StrList(value) => Some(value),
            _ => None,
        }
    }

    /// Metadata payload, if this is a metadata record
    pub fn into_metadata(self) -> Option<TrackMetadata> {
        match self {
            Self::Metadata(value) => Some(value),
            _ => None,
        }
    }
}

/// Property name to value, ordered by name
pub type PropertyMap = BTreeMap<&'static str, PropertyValue>;

/// Static description of the application, fixed at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct AppIdentity {
    /// Human-readable player name
    pub identity: String,
    /// Whether `Quit` is honoured
    pub can_quit: bool,
    /// Whether `Raise` is honoured
    pub can_raise: bool,
    /// Whether a TrackList object is exported
    pub has_track_list: bool,
    /// Whether the player is fullscreen
    pub fullscreen: bool,
    /// Whether fullscreen can be toggled
    pub can_set_fullscreen: bool,
    /// URI schemes the daemon can play
    pub supported_uri_schemes: Vec<String>,
    /// MIME types the daemon can play
    pub supported_mime_types: Vec<String>,
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            identity: "Xmms2".to_string(),
            can_quit: true,
            can_raise: false,
            has_track_list: false,
            fullscreen: false,
            can_set_fullscreen: false,
            supported_uri_schemes: vec!["file".into(), "http".into(), "rtsp".into()],
            supported_mime_types: vec!["audio/mpeg".into(), "application/ogg".into()],
        }
    }
}

/// What the bridge lets control surfaces do.
///
/// These describe the bridge, not the daemon's current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerCapabilities {
    /// `Next` is supported
    pub can_go_next: bool,
    /// `Previous` is supported
    pub can_go_previous: bool,
    /// `Play` is supported
    pub can_play: bool,
    /// `Pause` is supported
    pub can_pause: bool,
    /// `Seek` is supported
    pub can_seek: bool,
    /// The player accepts control at all
    pub can_control: bool,
}

impl PlayerCapabilities {
    /// Capabilities implemented by this bridge
    pub const BRIDGE: Self = Self {
        can_go_next: true,
        can_go_previous: true,
        can_play: true,
        can_pause: true,
        can_seek: true,
        can_control: true,
    };
}

/// Track id reported when nothing is loaded
pub const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

const APPLICATION_PROPERTIES: [&str; 8] = [
    "CanQuit",
    "CanRaise",
    "HasTrackList",
    "Fullscreen",
    "CanSetFullscreen",
    "Identity",
    "SupportedUriSchemes",
    "SupportedMimeTypes",
];

/// Slowest playback rate the daemon supports
pub const MINIMUM_RATE: f64 = 1.0;

/// Fastest playback rate the daemon supports
pub const MAXIMUM_RATE: f64 = 1.0;

/// Answers property queries from published state.
///
/// Never talks to the daemon: every read is a clone of the last snapshot the
/// event task published. Fields still unknown are exported as placeholders,
/// see [`signalled_player_properties`].
#[derive(Debug, Clone)]
pub struct PropertyExporter {
    identity: Arc<AppIdentity>,
    capabilities: PlayerCapabilities,
    state: Property<PlayerState>,
}

impl PropertyExporter {
    /// Create an exporter over a published player state
    pub fn new(identity: AppIdentity, state: Property<PlayerState>) -> Self {
        Self {
            identity: Arc::new(identity),
            capabilities: PlayerCapabilities::BRIDGE,
            state,
        }
    }

    /// Read one property.
    ///
    /// # Errors
    /// Returns `BridgeError::UnknownInterface` for an interface other than the
    /// two MPRIS ones and `BridgeError::UnknownProperty` for a name the
    /// interface does not define.
    pub fn get_property(&self, interface: &str, property: &str) -> Result<PropertyValue, BridgeError> {
        let mut properties = self.get_all(interface)?;

        properties
            .remove(property)
            .ok_or_else(|| BridgeError::UnknownProperty {
                interface: interface.to_string(),
                property: property.to_string(),
            })
    }

    /// Read every property of an interface.
    ///
    /// # Errors
    /// Returns `BridgeError::UnknownInterface` for an interface other than the
    /// two MPRIS ones.
    pub fn get_all(&self, interface: &str) -> Result<PropertyMap, BridgeError> {
        match MprisInterface::parse(interface)? {
            MprisInterface::Application => Ok(self.application_properties()),
            MprisInterface::Player => {
                Ok(player_properties(&self.state.get(), self.capabilities, Instant::now()))
            }
        }
    }

    /// Static application-level properties
    pub fn application_properties(&self) -> PropertyMap {
        let identity = &self.identity;
        let values = [
            PropertyValue::Bool(identity.can_quit),
            PropertyValue::Bool(identity.can_raise),
            PropertyValue::Bool(identity.has_track_list),
            PropertyValue::Bool(identity.fullscreen),
            PropertyValue::Bool(identity.can_set_fullscreen),
            PropertyValue::Str(identity.identity.clone()),
            PropertyValue::StrList(identity.supported_uri_schemes.clone()),
            PropertyValue::StrList(identity.supported_mime_types.clone()),
        ];

        APPLICATION_PROPERTIES.into_iter().zip(values).collect()
    }
}

/// Player-level properties derived from `state`.
///
/// `now` is used to extrapolate the position while playing.
pub fn player_properties(
    state: &PlayerState,
    capabilities: PlayerCapabilities,
    now: Instant,
) -> PropertyMap {
    let mut properties = signalled_player_properties(state, capabilities);
    properties.insert("Position", PropertyValue::Int64(exported_position(state, now)));
    properties
}

/// Player-level properties that announce changes through `PropertiesChanged`.
///
/// `Position` is left out; position jumps are announced with `Seeked`.
///
/// MPRIS property types have no "unknown" value, so fields the daemon has not
/// reported yet are exported as fixed placeholders: `Stopped`, volume `1.0`,
/// rate `1.0` and `NO_TRACK` metadata. The cached state keeps them as `None`.
pub fn signalled_player_properties(
    state: &PlayerState,
    capabilities: PlayerCapabilities,
) -> PropertyMap {
    let status = state.status.unwrap_or(PlaybackStatus::Stopped);
    let metadata = state.metadata.clone().unwrap_or_default();

    PropertyMap::from([
        ("PlaybackStatus", PropertyValue::Str(status.as_str().to_string())),
        ("Rate", PropertyValue::Double(state.rate.unwrap_or(MINIMUM_RATE))),
        ("Metadata", PropertyValue::Metadata(metadata)),
        ("Volume", PropertyValue::Double(state.volume.unwrap_or(1.0))),
        ("MinimumRate", PropertyValue::Double(MINIMUM_RATE)),
        ("MaximumRate", PropertyValue::Double(MAXIMUM_RATE)),
        ("CanGoNext", PropertyValue::Bool(capabilities.can_go_next)),
        ("CanGoPrevious", PropertyValue::Bool(capabilities.can_go_previous)),
        ("CanPlay", PropertyValue::Bool(capabilities.can_play)),
        ("CanPause", PropertyValue::Bool(capabilities.can_pause)),
        ("CanSeek", PropertyValue::Bool(capabilities.can_seek)),
        ("CanControl", PropertyValue::Bool(capabilities.can_control)),
    ])
}

/// Position in microseconds, extrapolated from the last observation while playing
fn exported_position(state: &PlayerState, now: Instant) -> i64 {
    let Some(position) = state.position else {
        return 0;
    };

    let elapsed = match (state.status, state.position_as_of) {
        (Some(PlaybackStatus::Playing), Some(as_of)) => {
            let rate = state.rate.unwrap_or(MINIMUM_RATE);
            let secs = now.saturating_duration_since(as_of).as_secs_f64() * rate;
            Duration::try_from_secs_f64(secs).unwrap_or(if secs > 0.0 {
                Duration::MAX
            } else {
                Duration::ZERO
            })
        }
        _ => Duration::ZERO,
    };

    let mut position = position.saturating_add(elapsed);
    if let Some(length) = state.metadata.as_ref().and_then(|m| m.duration) {
        position = position.min(length);
    }

    i64::try_from(position.as_micros()).unwrap_or(i64::MAX)
}
