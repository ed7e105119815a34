use std::fmt;
use std::time::{Duration, Instant};

/// Current playback state of the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Daemon is currently playing
    Playing,

    /// Daemon is paused
    Paused,

    /// Daemon is stopped
    Stopped,
}

impl PlaybackStatus {
    /// MPRIS string form of the status
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for PlaybackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata for the current track.
///
/// Only the fields control surfaces understand are kept; anything else the
/// daemon reports is dropped at conversion time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    /// Daemon-side track identifier
    pub track_id: Option<i64>,

    /// Track title
    pub title: Option<String>,

    /// Track artist
    pub artist: Option<String>,

    /// Album name
    pub album: Option<String>,

    /// Track length
    pub duration: Option<Duration>,

    /// Source URI
    pub url: Option<String>,
}

/// Last-known player state.
///
/// `None` means no notification has been observed for that field yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerState {
    /// Playback status
    pub status: Option<PlaybackStatus>,

    /// Current track metadata
    pub metadata: Option<TrackMetadata>,

    /// Last observed position
    pub position: Option<Duration>,

    /// When `position` was observed
    pub position_as_of: Option<Instant>,

    /// Volume in `[0.0, 1.0]`
    pub volume: Option<f64>,

    /// Playback rate
    pub rate: Option<f64>,
}

/// A single mutation of the player state
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    /// Playback status changed
    StatusChanged(PlaybackStatus),

    /// A new track became current
    TrackChanged(TrackMetadata),

    /// Position was read from the daemon
    PositionObserved {
        /// Elapsed time in the current track
        position: Duration,
        /// When the daemon answered
        observed_at: Instant,
    },

    /// Volume changed
    VolumeChanged(f64),

    /// Playback rate changed
    RateChanged(f64),
}

/// Plain-data mirror of the daemon's player state.
///
/// Owned by the bridge's event task; everything else sees published copies.
#[derive(Debug, Default)]
pub struct StateCache {
    state: PlayerState,
}

impl StateCache {
    /// Create a cache where every field is unknown
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state
    pub fn read(&self) -> PlayerState {
        self.state.clone()
    }

    /// Apply an update, returning whether any field changed.
    pub fn apply(&mut self, update: StateUpdate) -> bool {
        let state = &mut self.state;
        match update {
            StateUpdate::StatusChanged(status) => replace(&mut state.status, status),
            StateUpdate::TrackChanged(metadata) => replace(&mut state.metadata, metadata),
            StateUpdate::PositionObserved {
                position,
                observed_at,
            } => {
                let position_changed = replace(&mut state.position, position);
                let as_of_changed = replace(&mut state.position_as_of, observed_at);
                position_changed || as_of_changed
            }
            StateUpdate::VolumeChanged(volume) => replace(&mut state.volume, volume),
            StateUpdate::RateChanged(rate) => replace(&mut state.rate, rate),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    if slot.as_ref() == Some(&value) {
        return false;
    }
    *slot = Some(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str) -> TrackMetadata {
        TrackMetadata {
            track_id: Some(7),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn fresh_cache_reports_every_field_unknown() {
        let cache = StateCache::new();
        let state = cache.read();

        assert_eq!(state.status, None);
        assert_eq!(state.metadata, None);
        assert_eq!(state.position, None);
        assert_eq!(state.position_as_of, None);
        assert_eq!(state.volume, None);
        assert_eq!(state.rate, None);
    }

    #[test]
    fn read_equals_fold_of_applied_updates() {
        let observed_at = Instant::now();
        let updates = vec![
            StateUpdate::StatusChanged(PlaybackStatus::Playing),
            StateUpdate::TrackChanged(track("A")),
            StateUpdate::VolumeChanged(0.4),
            StateUpdate::StatusChanged(PlaybackStatus::Paused),
            StateUpdate::PositionObserved {
                position: Duration::from_secs(12),
                observed_at,
            },
            StateUpdate::TrackChanged(track("B")),
            StateUpdate::RateChanged(1.0),
            StateUpdate::VolumeChanged(0.9),
        ];

        let mut cache = StateCache::new();
        for update in updates {
            cache.apply(update);
        }

        let expected = PlayerState {
            status: Some(PlaybackStatus::Paused),
            metadata: Some(track("B")),
            position: Some(Duration::from_secs(12)),
            position_as_of: Some(observed_at),
            volume: Some(0.9),
            rate: Some(1.0),
        };
        assert_eq!(cache.read(), expected);
    }

    #[test]
    fn repeated_update_reports_no_change() {
        let mut cache = StateCache::new();

        assert!(cache.apply(StateUpdate::StatusChanged(PlaybackStatus::Playing)));
        assert!(!cache.apply(StateUpdate::StatusChanged(PlaybackStatus::Playing)));

        assert!(cache.apply(StateUpdate::TrackChanged(track("A"))));
        assert!(!cache.apply(StateUpdate::TrackChanged(track("A"))));
    }

    #[test]
    fn track_change_replaces_metadata_wholesale() {
        let mut cache = StateCache::new();
        cache.apply(StateUpdate::TrackChanged(TrackMetadata {
            track_id: Some(1),
            title: Some("A".to_string()),
            album: Some("Album".to_string()),
            ..Default::default()
        }));
        cache.apply(StateUpdate::TrackChanged(TrackMetadata {
            track_id: Some(2),
            title: Some("B".to_string()),
            ..Default::default()
        }));

        let metadata = cache.read().metadata.unwrap_or_default();
        assert_eq!(metadata.track_id, Some(2));
        assert_eq!(metadata.album, None);
    }

    #[test]
    fn playback_status_strings_match_mpris() {
        assert_eq!(PlaybackStatus::Playing.as_str(), "Playing");
        assert_eq!(PlaybackStatus::Paused.as_str(), "Paused");
        assert_eq!(PlaybackStatus::Stopped.to_string(), "Stopped");
    }
}
