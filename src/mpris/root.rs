use tracing::debug;
use zbus::{fdo, interface};

use super::convert::{expect_type, fdo_error};
use crate::services::bridge::{
    CommandTranslator, MprisInterface, PropertyExporter, PropertyValue,
};

/// `org.mpris.MediaPlayer2` on the exported object
pub(crate) struct Root {
    exporter: PropertyExporter,
    commands: CommandTranslator,
}

impl Root {
    pub(crate) fn new(exporter: PropertyExporter, commands: CommandTranslator) -> Self {
        Self { exporter, commands }
    }

    fn read(&self, name: &str) -> fdo::Result<PropertyValue> {
        self.exporter
            .get_property(MprisInterface::APPLICATION_NAME, name)
            .map_err(fdo_error)
    }

    fn flag(&self, name: &str) -> fdo::Result<bool> {
        expect_type(name, self.read(name)?, |value| value.as_bool())
    }

    fn list(&self, name: &str) -> fdo::Result<Vec<String>> {
        expect_type(name, self.read(name)?, PropertyValue::into_str_list)
    }
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl Root {
    async fn raise(&self) -> fdo::Result<()> {
        self.commands.raise().await.map_err(fdo_error)
    }

    async fn quit(&self) -> fdo::Result<()> {
        debug!("quit requested over D-Bus");
        self.commands.quit().await.map_err(fdo_error)
    }

    #[zbus(property)]
    fn can_quit(&self) -> fdo::Result<bool> {
        self.flag("CanQuit")
    }

    #[zbus(property)]
    fn can_raise(&self) -> fdo::Result<bool> {
        self.flag("CanRaise")
    }

    #[zbus(property)]
    fn has_track_list(&self) -> fdo::Result<bool> {
        self.flag("HasTrackList")
    }

    #[zbus(property)]
    fn fullscreen(&self) -> fdo::Result<bool> {
        self.flag("Fullscreen")
    }

    #[zbus(property)]
    fn can_set_fullscreen(&self) -> fdo::Result<bool> {
        self.flag("CanSetFullscreen")
    }

    #[zbus(property)]
    fn identity(&self) -> fdo::Result<String> {
        expect_type("Identity", self.read("Identity")?, PropertyValue::into_string)
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> fdo::Result<Vec<String>> {
        self.list("SupportedUriSchemes")
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> fdo::Result<Vec<String>> {
        self.list("SupportedMimeTypes")
    }
}
