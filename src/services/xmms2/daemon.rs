use std::collections::BTreeMap;
use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use tracing::{debug, warn};

use super::protocol::{broadcast, main, medialib, object, playback, playlist};
use super::{Value, Xmms2Client, Xmms2Error};
use crate::services::bridge::{
    Daemon, DaemonError, DaemonEvent, DaemonEventStream, PlaybackStatus, TrackMetadata,
};

/// Medialib keys carried over into [`TrackMetadata`]
const KEPT_KEYS: [&str; 5] = ["title", "artist", "album", "duration", "url"];

/// Property source preferred when several report the same key
const SERVER_SOURCE: &str = "server";
const PLUGIN_SOURCE_PREFIX: &str = "plugin/";

enum Incoming {
    Status(Result<Value, Xmms2Error>),
    CurrentId(Result<Value, Xmms2Error>),
    Volume(Result<Value, Xmms2Error>),
    Closed,
}

impl Xmms2Client {
    async fn playback(&self, command: u32, args: Vec<Value>) -> Result<Value, Xmms2Error> {
        self.request(object::PLAYBACK, command, args).await
    }

    /// Id of the current medialib entry, 0 when none is loaded
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    pub async fn current_id(&self) -> Result<i64, Xmms2Error> {
        self.playback(playback::CURRENT_ID, Vec::new()).await?.as_int()
    }

    /// Metadata of medialib entry `id`.
    ///
    /// Entry 0 has no metadata. Lookup failures are logged and yield a
    /// record carrying only the id.
    pub async fn track_metadata(&self, id: i64) -> TrackMetadata {
        if id <= 0 {
            return TrackMetadata::default();
        }

        let info = self
            .request(object::MEDIALIB, medialib::GET_INFO, vec![Value::Int(id)])
            .await;

        match info.and_then(|info| metadata_from_propdict(id, &info)) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(id, error = %e, "could not read track metadata");
                TrackMetadata {
                    track_id: Some(id),
                    ..Default::default()
                }
            }
        }
    }

    /// Output volume in `[0.0, 1.0]`, `None` if the output has no mixer
    ///
    /// # Errors
    /// Returns error if the daemon rejects the request
    pub async fn volume(&self) -> Result<Option<f64>, Xmms2Error> {
        let channels = self.playback(playback::VOLUME_GET, Vec::new()).await?;
        volume_level(&channels)
    }
}

#[async_trait]
impl Daemon for Xmms2Client {
    async fn subscribe(&self) -> Result<DaemonEventStream, DaemonError> {
        let mut status_rx = self.broadcast(broadcast::PLAYBACK_STATUS).await?;
        let mut current_rx = self.broadcast(broadcast::PLAYBACK_CURRENT_ID).await?;
        let mut volume_rx = self.broadcast(broadcast::PLAYBACK_VOLUME_CHANGED).await?;

        let status = Daemon::status(self).await?;
        let current = self.current_id().await.map_err(DaemonError::from)?;
        let track = self.track_metadata(current).await;
        let volume = match self.volume().await {
            Ok(volume) => volume,
            Err(e) => {
                debug!(error = %e, "volume unavailable");
                None
            }
        };

        let client = self.clone();

        Ok(Box::pin(stream! {
            yield DaemonEvent::StatusChanged(status);
            yield DaemonEvent::TrackChanged(track);
            if let Some(volume) = volume {
                yield DaemonEvent::VolumeChanged(volume);
            }

            loop {
                let incoming = tokio::select! {
                    Some(reply) = status_rx.recv() => Incoming::Status(reply),
                    Some(reply) = current_rx.recv() => Incoming::CurrentId(reply),
                    Some(reply) = volume_rx.recv() => Incoming::Volume(reply),
                    else => Incoming::Closed,
                };

                let event = match incoming {
                    Incoming::Status(reply) => reply
                        .and_then(|value| value.as_int())
                        .map(|code| DaemonEvent::StatusChanged(status_from_code(code))),
                    Incoming::CurrentId(reply) => match reply.and_then(|value| value.as_int()) {
                        Ok(id) => Ok(DaemonEvent::TrackChanged(client.track_metadata(id).await)),
                        Err(e) => Err(e),
                    },
                    Incoming::Volume(reply) => reply
                        .and_then(|value| volume_level(&value))
                        .map(|level| DaemonEvent::VolumeChanged(level.unwrap_or(0.0))),
                    Incoming::Closed => {
                        yield DaemonEvent::ConnectionLost;
                        break;
                    }
                };

                match event {
                    Ok(event) => yield event,
                    Err(e) => warn!(error = %e, "ignoring malformed broadcast"),
                }
            }
        }))
    }

    async fn play(&self) -> Result<(), DaemonError> {
        self.playback(playback::START, Vec::new()).await?;
        Ok(())
    }

    async fn pause(&self) -> Result<(), DaemonError> {
        self.playback(playback::PAUSE, Vec::new()).await?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), DaemonError> {
        self.playback(playback::STOP, Vec::new()).await?;
        Ok(())
    }

    async fn seek_relative(&self, offset_us: i64) -> Result<(), DaemonError> {
        let offset_ms = offset_us / 1000;
        self.playback(
            playback::SEEK_MS,
            vec![Value::Int(offset_ms), Value::Int(playback::SEEK_CUR)],
        )
        .await?;
        Ok(())
    }

    async fn set_next_relative(&self, delta: i64) -> Result<(), DaemonError> {
        self.request(object::PLAYLIST, playlist::SET_NEXT_REL, vec![Value::Int(delta)])
            .await?;
        Ok(())
    }

    async fn tickle(&self) -> Result<(), DaemonError> {
        self.playback(playback::TICKLE, Vec::new()).await?;
        Ok(())
    }

    async fn status(&self) -> Result<PlaybackStatus, DaemonError> {
        let code = self.playback(playback::STATUS, Vec::new()).await?.as_int()?;
        Ok(status_from_code(code))
    }

    async fn playtime(&self) -> Result<Duration, DaemonError> {
        let ms = self.playback(playback::PLAYTIME, Vec::new()).await?.as_int()?;
        Ok(Duration::from_millis(u64::try_from(ms).unwrap_or(0)))
    }

    async fn set_volume(&self, level: f64) -> Result<(), DaemonError> {
        let channels = self.playback(playback::VOLUME_GET, Vec::new()).await?;
        let channels = channels.as_dict()?;
        if channels.is_empty() {
            return Err(DaemonError::Request("output has no volume control".to_string()));
        }

        let percent = (level.clamp(0.0, 1.0) * 100.0).round() as i64;
        for channel in channels.keys() {
            self.playback(
                playback::VOLUME_SET,
                vec![Value::String(channel.clone()), Value::Int(percent)],
            )
            .await?;
        }
        Ok(())
    }

    async fn quit(&self) -> Result<(), DaemonError> {
        self.request(object::MAIN, main::QUIT, Vec::new()).await?;
        Ok(())
    }
}

/// Map the daemon's status code; unknown codes read as stopped
pub(crate) fn status_from_code(code: i64) -> PlaybackStatus {
    match code {
        playback::STATUS_PLAY => PlaybackStatus::Playing,
        playback::STATUS_PAUSE => PlaybackStatus::Paused,
        playback::STATUS_STOP => PlaybackStatus::Stopped,
        other => {
            debug!(code = other, "unknown playback status code");
            PlaybackStatus::Stopped
        }
    }
}

/// Loudest channel of a channel → percent dict, scaled to `[0.0, 1.0]`
pub(crate) fn volume_level(channels: &Value) -> Result<Option<f64>, Xmms2Error> {
    let mut loudest: Option<i64> = None;
    for level in channels.as_dict()?.values() {
        let level = level.as_int()?;
        loudest = Some(loudest.map_or(level, |current| current.max(level)));
    }

    Ok(loudest.map(|percent| (percent as f64 / 100.0).clamp(0.0, 1.0)))
}

/// Flatten a medialib propdict (`key → source → value`) into track metadata
pub(crate) fn metadata_from_propdict(id: i64, info: &Value) -> Result<TrackMetadata, Xmms2Error> {
    let info = info.as_dict()?;

    let mut values: BTreeMap<&str, &Value> = BTreeMap::new();
    for key in KEPT_KEYS {
        if let Some(value) = info
            .get(key)
            .and_then(|sources| sources.as_dict().ok())
            .and_then(preferred_source)
        {
            values.insert(key, value);
        }
    }

    let text = |key: &str| {
        values
            .get(key)
            .and_then(|value| value.as_str().ok())
            .map(str::to_string)
    };

    Ok(TrackMetadata {
        track_id: Some(id),
        title: text("title"),
        artist: text("artist"),
        album: text("album"),
        duration: values
            .get("duration")
            .and_then(|value| value.as_int().ok())
            .and_then(|ms| u64::try_from(ms).ok())
            .map(Duration::from_millis),
        url: text("url"),
    })
}

fn preferred_source(sources: &BTreeMap<String, Value>) -> Option<&Value> {
    sources
        .get(SERVER_SOURCE)
        .or_else(|| {
            sources
                .iter()
                .find(|(source, _)| source.starts_with(PLUGIN_SOURCE_PREFIX))
                .map(|(_, value)| value)
        })
        .or_else(|| sources.values().next())
}
