use std::collections::HashMap;

use zbus::fdo;
use zbus::zvariant::{ObjectPath, OwnedValue, Value};

use super::TRACK_PATH_PREFIX;
use crate::services::bridge::{BridgeError, NO_TRACK, PropertyValue, TrackMetadata};

/// D-Bus value of an exported property
pub(crate) fn to_value(value: PropertyValue) -> Value<'static> {
    match value {
        PropertyValue::Bool(value) => Value::from(value),
        PropertyValue::Double(value) => Value::from(value),
        PropertyValue::Int64(value) => Value::from(value),
        PropertyValue::Str(value) => Value::from(value),
        PropertyValue::StrList(values) => Value::from(values),
        PropertyValue::Metadata(metadata) => Value::from(metadata_dict(&metadata)),
    }
}

/// Object path identifying the track, `NoTrack` when nothing is loaded
pub(crate) fn track_path(metadata: &TrackMetadata) -> ObjectPath<'static> {
    metadata
        .track_id
        .and_then(|id| ObjectPath::try_from(format!("{TRACK_PATH_PREFIX}/{id}")).ok())
        .unwrap_or_else(|| ObjectPath::from_static_str_unchecked(NO_TRACK))
}

/// The `a{sv}` metadata map; absent fields are left out
pub(crate) fn metadata_dict(metadata: &TrackMetadata) -> HashMap<String, Value<'static>> {
    let mut dict = HashMap::new();
    dict.insert("mpris:trackid".to_string(), Value::from(track_path(metadata)));

    if let Some(title) = &metadata.title {
        dict.insert("xesam:title".to_string(), Value::from(title.clone()));
    }
    if let Some(artist) = &metadata.artist {
        dict.insert("xesam:artist".to_string(), Value::from(vec![artist.clone()]));
    }
    if let Some(album) = &metadata.album {
        dict.insert("xesam:album".to_string(), Value::from(album.clone()));
    }
    if let Some(duration) = metadata.duration {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        dict.insert("mpris:length".to_string(), Value::from(micros));
    }
    if let Some(url) = &metadata.url {
        dict.insert("xesam:url".to_string(), Value::from(url.clone()));
    }

    dict
}

/// Owned form of [`metadata_dict`] for property getters
pub(crate) fn owned_metadata(metadata: &TrackMetadata) -> fdo::Result<HashMap<String, OwnedValue>> {
    metadata_dict(metadata)
        .into_iter()
        .map(|(key, value)| {
            OwnedValue::try_from(value)
                .map(|value| (key, value))
                .map_err(|e| fdo::Error::Failed(e.to_string()))
        })
        .collect()
}

/// D-Bus error reported for a bridge failure
pub(crate) fn fdo_error(error: BridgeError) -> fdo::Error {
    let message = error.to_string();
    match error {
        BridgeError::UnknownInterface { .. } => fdo::Error::UnknownInterface(message),
        BridgeError::UnknownProperty { .. } => fdo::Error::UnknownProperty(message),
        BridgeError::OutOfRange { .. } => fdo::Error::InvalidArgs(message),
        BridgeError::ConnectionLost => fdo::Error::Disconnected(message),
        BridgeError::DaemonRequestFailed { .. } | BridgeError::Abandoned { .. } => {
            fdo::Error::Failed(message)
        }
    }
}

/// Unwrap a property value of the expected type
pub(crate) fn expect_type<T>(
    name: &str,
    value: PropertyValue,
    extract: impl FnOnce(PropertyValue) -> Option<T>,
) -> fdo::Result<T> {
    extract(value).ok_or_else(|| fdo::Error::Failed(format!("property {name} has an unexpected type")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::services::bridge::CommandVerb;

    #[test]
    fn track_path_uses_id_or_no_track() {
        let loaded = TrackMetadata {
            track_id: Some(12),
            ..Default::default()
        };

        assert_eq!(track_path(&loaded).as_str(), "/org/mpris/MediaPlayer2/Track/12");
        assert_eq!(track_path(&TrackMetadata::default()).as_str(), NO_TRACK);
    }

    #[test]
    fn metadata_uses_xesam_and_mpris_keys() {
        let metadata = TrackMetadata {
            track_id: Some(3),
            title: Some("Title".to_string()),
            artist: Some("Artist".to_string()),
            album: None,
            duration: Some(Duration::from_millis(1500)),
            url: Some("file:///a.ogg".to_string()),
        };

        let dict = metadata_dict(&metadata);

        assert_eq!(dict.len(), 5);
        assert_eq!(dict["xesam:title"], Value::from("Title"));
        assert_eq!(dict["xesam:artist"], Value::from(vec!["Artist".to_string()]));
        assert_eq!(dict["mpris:length"], Value::from(1_500_000_i64));
        assert_eq!(dict["xesam:url"], Value::from("file:///a.ogg"));
        assert!(!dict.contains_key("xesam:album"));
    }

    #[test]
    fn empty_metadata_carries_only_the_track_id() {
        let dict = owned_metadata(&TrackMetadata::default()).unwrap();

        assert_eq!(dict.len(), 1);
        assert!(dict.contains_key("mpris:trackid"));
    }

    #[test]
    fn bridge_errors_map_to_fdo_errors() {
        let unknown = fdo_error(BridgeError::UnknownInterface {
            interface: "org.bogus".to_string(),
        });
        let range = fdo_error(BridgeError::OutOfRange {
            argument: "volume",
            value: 1.5,
            min: 0.0,
            max: 1.0,
        });
        let abandoned = fdo_error(BridgeError::Abandoned {
            verb: CommandVerb::Play,
        });

        assert!(matches!(unknown, fdo::Error::UnknownInterface(m) if m.contains("org.bogus")));
        assert!(matches!(range, fdo::Error::InvalidArgs(_)));
        assert!(matches!(abandoned, fdo::Error::Failed(_)));
    }
}
