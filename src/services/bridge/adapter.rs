use futures::StreamExt;
use tracing::{debug, info, instrument, warn};

use super::properties::{MAXIMUM_RATE, MINIMUM_RATE};
use super::{BridgeError, Daemon, DaemonEvent, DaemonEventStream, StateUpdate};

/// What the event path should do with one daemon notification
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterOutput {
    /// Apply this update to the state cache
    Update(StateUpdate),

    /// The daemon is gone; the bridge must shut down
    ConnectionLost,
}

/// Turns the daemon's notification stream into state-cache updates.
///
/// The adapter does not know why a notification happened; a status change
/// caused by a remote command looks the same as one caused by end of track.
pub struct PlayerEventAdapter {
    events: DaemonEventStream,
    received: u64,
}

impl PlayerEventAdapter {
    /// Subscribe to the daemon's notifications.
    ///
    /// # Errors
    /// Returns `BridgeError::ConnectionLost` if the subscription fails; the
    /// bridge cannot operate without it.
    #[instrument(skip(daemon))]
    pub async fn subscribe(daemon: &dyn Daemon) -> Result<Self, BridgeError> {
        let events = daemon.subscribe().await.map_err(|e| {
            warn!(error = %e, "daemon subscription failed");
            BridgeError::ConnectionLost
        })?;

        info!("subscribed to daemon notifications");

        Ok(Self::from_stream(events))
    }

    /// Wrap an already established notification stream
    pub fn from_stream(events: DaemonEventStream) -> Self {
        Self {
            events,
            received: 0,
        }
    }

    /// Wait for the next notification and translate it.
    ///
    /// The end of the stream is treated as a lost connection.
    pub async fn next(&mut self) -> AdapterOutput {
        match self.events.next().await {
            Some(event) => {
                self.received += 1;
                debug!(received = self.received, ?event, "daemon notification");
                Self::translate(event)
            }
            None => {
                info!("daemon notification stream ended");
                AdapterOutput::ConnectionLost
            }
        }
    }

    /// Map one notification to exactly one output.
    pub fn translate(event: DaemonEvent) -> AdapterOutput {
        match event {
            DaemonEvent::StatusChanged(status) => {
                AdapterOutput::Update(StateUpdate::StatusChanged(status))
            }
            DaemonEvent::TrackChanged(metadata) => {
                AdapterOutput::Update(StateUpdate::TrackChanged(metadata))
            }
            DaemonEvent::VolumeChanged(level) => {
                AdapterOutput::Update(StateUpdate::VolumeChanged(level.clamp(0.0, 1.0)))
            }
            DaemonEvent::RateChanged(rate) => {
                AdapterOutput::Update(StateUpdate::RateChanged(exportable_rate(rate)))
            }
            DaemonEvent::ConnectionLost => AdapterOutput::ConnectionLost,
        }
    }
}

/// Keep the rate inside the advertised `[MinimumRate, MaximumRate]` range
fn exportable_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        debug!("daemon reported NaN rate");
        return MINIMUM_RATE;
    }
    rate.clamp(MINIMUM_RATE, MAXIMUM_RATE)
}
