use tracing::trace;

use super::{
    MprisInterface, PlayerCapabilities, PlayerState, PropertyMap, properties,
};

/// Properties that changed in one update
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    /// Interface the properties belong to
    pub interface: MprisInterface,

    /// Changed properties with their new values
    pub changed: PropertyMap,

    /// Properties whose new value is not sent along
    pub invalidated: Vec<&'static str>,
}

/// Outbound notifications for the control-surface transport
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeSignal {
    /// One or more exported properties changed value
    PropertiesChanged(ChangeSet),

    /// Playback jumped to a new position, in microseconds
    Seeked(i64),
}

/// Diffs published player properties against the latest state.
///
/// Each observation is compared with the most recently published set; there
/// is no coalescing across observations.
#[derive(Debug)]
pub struct ChangeNotifier {
    capabilities: PlayerCapabilities,
    published: PropertyMap,
}

impl ChangeNotifier {
    /// Start from the properties `initial` would export
    pub fn new(capabilities: PlayerCapabilities, initial: &PlayerState) -> Self {
        Self {
            capabilities,
            published: properties::signalled_player_properties(initial, capabilities),
        }
    }

    /// Compare `state` against the last published properties.
    ///
    /// Returns the changed properties and makes them the new baseline, or
    /// `None` when nothing visible changed.
    pub fn observe(&mut self, state: &PlayerState) -> Option<ChangeSet> {
        let current = properties::signalled_player_properties(state, self.capabilities);

        let changed: PropertyMap = current
            .iter()
            .filter(|(name, value)| self.published.get(*name) != Some(*value))
            .map(|(name, value)| (*name, value.clone()))
            .collect();

        if changed.is_empty() {
            trace!("update left exported properties unchanged");
            return None;
        }

        self.published = current;

        Some(ChangeSet {
            interface: MprisInterface::Player,
            changed,
            invalidated: Vec::new(),
        })
    }

    /// The last published property set
    pub fn published(&self) -> &PropertyMap {
        &self.published
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::services::bridge::{
        PlaybackStatus, PropertyValue, StateCache, StateUpdate, TrackMetadata,
    };

    fn notifier_and_cache() -> (ChangeNotifier, StateCache) {
        let cache = StateCache::new();
        let notifier = ChangeNotifier::new(PlayerCapabilities::BRIDGE, &cache.read());
        (notifier, cache)
    }

    fn apply(
        notifier: &mut ChangeNotifier,
        cache: &mut StateCache,
        update: StateUpdate,
    ) -> Option<ChangeSet> {
        cache.apply(update);
        notifier.observe(&cache.read())
    }

    #[test]
    fn second_identical_update_yields_no_change_set() {
        let (mut notifier, mut cache) = notifier_and_cache();

        let first = apply(
            &mut notifier,
            &mut cache,
            StateUpdate::StatusChanged(PlaybackStatus::Playing),
        );
        let second = apply(
            &mut notifier,
            &mut cache,
            StateUpdate::StatusChanged(PlaybackStatus::Playing),
        );

        let first = first.unwrap();
        assert_eq!(first.interface, MprisInterface::Player);
        assert_eq!(
            first.changed,
            PropertyMap::from([(
                "PlaybackStatus",
                PropertyValue::Str("Playing".to_string())
            )])
        );
        assert!(first.invalidated.is_empty());
        assert_eq!(second, None);
    }

    #[test]
    fn change_set_holds_only_what_changed() {
        let (mut notifier, mut cache) = notifier_and_cache();
        let metadata = TrackMetadata {
            track_id: Some(3),
            title: Some("A".to_string()),
            ..Default::default()
        };

        let changes = apply(
            &mut notifier,
            &mut cache,
            StateUpdate::TrackChanged(metadata.clone()),
        )
        .unwrap();

        assert_eq!(changes.changed.len(), 1);
        assert_eq!(changes.changed["Metadata"], PropertyValue::Metadata(metadata));
    }

    #[test]
    fn position_updates_are_not_signalled() {
        let (mut notifier, mut cache) = notifier_and_cache();

        let changes = apply(
            &mut notifier,
            &mut cache,
            StateUpdate::PositionObserved {
                position: Duration::from_secs(4),
                observed_at: Instant::now(),
            },
        );

        assert_eq!(changes, None);
    }

    #[test]
    fn update_matching_exported_default_is_silent() {
        let (mut notifier, mut cache) = notifier_and_cache();

        let changes = apply(
            &mut notifier,
            &mut cache,
            StateUpdate::StatusChanged(PlaybackStatus::Stopped),
        );

        assert_eq!(changes, None);
    }

    #[test]
    fn back_to_back_updates_each_diff_against_latest_publish() {
        let (mut notifier, mut cache) = notifier_and_cache();

        let first = apply(&mut notifier, &mut cache, StateUpdate::VolumeChanged(0.2)).unwrap();
        let second = apply(&mut notifier, &mut cache, StateUpdate::VolumeChanged(0.3)).unwrap();
        let back = apply(&mut notifier, &mut cache, StateUpdate::VolumeChanged(0.2)).unwrap();

        assert_eq!(first.changed["Volume"], PropertyValue::Double(0.2));
        assert_eq!(second.changed["Volume"], PropertyValue::Double(0.3));
        assert_eq!(back.changed["Volume"], PropertyValue::Double(0.2));
        assert_eq!(notifier.published()["Volume"], PropertyValue::Double(0.2));
    }
}
