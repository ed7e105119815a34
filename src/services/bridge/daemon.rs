use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::Stream;

use super::{PlaybackStatus, TrackMetadata};

/// Notifications pushed by the daemon
#[derive(Debug, Clone, PartialEq)]
pub enum DaemonEvent {
    /// Playback status changed
    StatusChanged(PlaybackStatus),

    /// The current track changed
    TrackChanged(TrackMetadata),

    /// Output volume changed, in `[0.0, 1.0]`
    VolumeChanged(f64),

    /// Playback rate changed
    RateChanged(f64),

    /// The daemon connection is gone
    ConnectionLost,
}

/// Stream of daemon notifications
pub type DaemonEventStream = Pin<Box<dyn Stream<Item = DaemonEvent> + Send>>;

/// Errors reported by a daemon implementation
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DaemonError {
    /// The daemon answered with a failure
    #[error("request failed: {0}")]
    Request(String),

    /// The connection closed before an answer arrived
    #[error("daemon connection closed")]
    Disconnected,
}

/// Daemon-facing surface consumed by the bridge.
///
/// Every request is asynchronous; implementations must not block the caller
/// while waiting for the daemon.
#[async_trait]
pub trait Daemon: Send + Sync + 'static {
    /// Subscribe to playback notifications.
    ///
    /// Called once per bridge instance. The stream ends, or yields
    /// [`DaemonEvent::ConnectionLost`], when the daemon goes away.
    ///
    /// # Errors
    /// Returns error if the subscription could not be registered
    async fn subscribe(&self) -> Result<DaemonEventStream, DaemonError>;

    /// Start playback
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn play(&self) -> Result<(), DaemonError>;

    /// Pause playback
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn pause(&self) -> Result<(), DaemonError>;

    /// Stop playback
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn stop(&self) -> Result<(), DaemonError>;

    /// Seek relative to the current position, offset in microseconds
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn seek_relative(&self, offset_us: i64) -> Result<(), DaemonError>;

    /// Move the playlist's next entry relative to the current one
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn set_next_relative(&self, delta: i64) -> Result<(), DaemonError>;

    /// Make the daemon advance to the next entry immediately
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn tickle(&self) -> Result<(), DaemonError>;

    /// Query the current playback status
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn status(&self) -> Result<PlaybackStatus, DaemonError>;

    /// Query the elapsed time of the current track
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn playtime(&self) -> Result<Duration, DaemonError>;

    /// Set the output volume, `level` in `[0.0, 1.0]`
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn set_volume(&self, level: f64) -> Result<(), DaemonError>;

    /// Ask the daemon process to exit
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    async fn quit(&self) -> Result<(), DaemonError>;
}
