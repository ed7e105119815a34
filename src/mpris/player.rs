use std::collections::HashMap;

use zbus::object_server::SignalEmitter;
use zbus::zvariant::{ObjectPath, OwnedValue};
use zbus::{fdo, interface};

use super::convert::{expect_type, fdo_error, owned_metadata};
use crate::services::bridge::{
    CommandTranslator, MprisInterface, PropertyExporter, PropertyValue,
};

/// `org.mpris.MediaPlayer2.Player` on the exported object
pub(crate) struct Player {
    exporter: PropertyExporter,
    commands: CommandTranslator,
}

impl Player {
    pub(crate) fn new(exporter: PropertyExporter, commands: CommandTranslator) -> Self {
        Self { exporter, commands }
    }

    fn read(&self, name: &str) -> fdo::Result<PropertyValue> {
        self.exporter
            .get_property(MprisInterface::PLAYER_NAME, name)
            .map_err(fdo_error)
    }

    fn flag(&self, name: &str) -> fdo::Result<bool> {
        expect_type(name, self.read(name)?, |value| value.as_bool())
    }

    fn double(&self, name: &str) -> fdo::Result<f64> {
        expect_type(name, self.read(name)?, |value| value.as_f64())
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl Player {
    async fn next(&self) -> fdo::Result<()> {
        self.commands.next().await.map_err(fdo_error)
    }

    async fn previous(&self) -> fdo::Result<()> {
        self.commands.previous().await.map_err(fdo_error)
    }

    async fn pause(&self) -> fdo::Result<()> {
        self.commands.pause().await.map_err(fdo_error)
    }

    async fn play_pause(&self) -> fdo::Result<()> {
        self.commands.play_pause().await.map_err(fdo_error)
    }

    async fn stop(&self) -> fdo::Result<()> {
        self.commands.stop().await.map_err(fdo_error)
    }

    async fn play(&self) -> fdo::Result<()> {
        self.commands.play().await.map_err(fdo_error)
    }

    async fn seek(&self, offset: i64) -> fdo::Result<()> {
        self.commands.seek(offset).await.map_err(fdo_error)
    }

    async fn set_position(&self, track_id: ObjectPath<'_>, position: i64) -> fdo::Result<()> {
        self.commands
            .set_position(track_id.as_str(), position)
            .await
            .map_err(fdo_error)
    }

    async fn open_uri(&self, uri: &str) -> fdo::Result<()> {
        self.commands.open_uri(uri).await.map_err(fdo_error)
    }

    /// Playback jumped; `position` in microseconds
    #[zbus(signal)]
    pub(crate) async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> fdo::Result<String> {
        expect_type(
            "PlaybackStatus",
            self.read("PlaybackStatus")?,
            PropertyValue::into_string,
        )
    }

    #[zbus(property)]
    fn rate(&self) -> fdo::Result<f64> {
        self.double("Rate")
    }

    #[zbus(property)]
    fn metadata(&self) -> fdo::Result<HashMap<String, OwnedValue>> {
        let metadata = expect_type("Metadata", self.read("Metadata")?, PropertyValue::into_metadata)?;
        owned_metadata(&metadata)
    }

    #[zbus(property)]
    fn volume(&self) -> fdo::Result<f64> {
        self.double("Volume")
    }

    #[zbus(property)]
    async fn set_volume(&mut self, volume: f64) -> fdo::Result<()> {
        self.commands
            .set_volume(volume)
            .map_err(fdo_error)?
            .await
            .map_err(fdo_error)
    }

    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> fdo::Result<i64> {
        expect_type("Position", self.read("Position")?, |value| value.as_i64())
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> fdo::Result<f64> {
        self.double("MinimumRate")
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> fdo::Result<f64> {
        self.double("MaximumRate")
    }

    #[zbus(property)]
    fn can_go_next(&self) -> fdo::Result<bool> {
        self.flag("CanGoNext")
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> fdo::Result<bool> {
        self.flag("CanGoPrevious")
    }

    #[zbus(property)]
    fn can_play(&self) -> fdo::Result<bool> {
        self.flag("CanPlay")
    }

    #[zbus(property)]
    fn can_pause(&self) -> fdo::Result<bool> {
        self.flag("CanPause")
    }

    #[zbus(property)]
    fn can_seek(&self) -> fdo::Result<bool> {
        self.flag("CanSeek")
    }

    #[zbus(property)]
    fn can_control(&self) -> fdo::Result<bool> {
        self.flag("CanControl")
    }
}
