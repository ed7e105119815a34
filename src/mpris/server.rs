use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use zbus::names::BusName;
use zbus::object_server::SignalEmitter;
use zbus::zvariant::Value;
use zbus::{Connection, connection};

use super::convert::to_value;
use super::player::Player;
use super::root::Root;
use super::{BUS_NAME_PREFIX, OBJECT_PATH};
use crate::services::bridge::{BridgeSignal, ChangeSet, CommandTranslator, PropertyExporter};

const PROPERTIES_INTERFACE: &str = "org.freedesktop.DBus.Properties";

/// The player exported on the session bus.
///
/// Owns the bus connection and the task forwarding bridge signals to it.
pub struct MprisServer {
    connection: Connection,
    bus_name: String,
    forwarder: JoinHandle<()>,
}

impl MprisServer {
    /// Claim `org.mpris.MediaPlayer2.<bus_suffix>` and serve the player.
    ///
    /// Signals received on `signals` are emitted until the sender side closes.
    ///
    /// # Errors
    /// Returns error if the session bus is unreachable or the name is invalid
    /// or already taken
    #[instrument(skip(exporter, commands, signals))]
    pub async fn start(
        bus_suffix: &str,
        exporter: PropertyExporter,
        commands: CommandTranslator,
        signals: mpsc::UnboundedReceiver<BridgeSignal>,
    ) -> Result<Self, zbus::Error> {
        let bus_name = format!("{BUS_NAME_PREFIX}.{bus_suffix}");

        let connection = connection::Builder::session()?
            .name(bus_name.clone())?
            .serve_at(OBJECT_PATH, Root::new(exporter.clone(), commands.clone()))?
            .serve_at(OBJECT_PATH, Player::new(exporter, commands))?
            .build()
            .await?;

        info!(%bus_name, "MPRIS player exported");

        let forwarder = tokio::spawn(forward_signals(connection.clone(), signals));

        Ok(Self {
            connection,
            bus_name,
            forwarder,
        })
    }

    /// Well-known name owned on the bus
    pub fn bus_name(&self) -> &str {
        &self.bus_name
    }

    /// Wait until every pending signal has been emitted, then give up the
    /// bus name
    pub async fn finish(self) {
        if let Err(e) = self.forwarder.await {
            warn!(error = %e, "signal forwarder panicked");
        }

        if let Err(e) = self.connection.release_name(self.bus_name.as_str()).await {
            debug!(error = %e, bus_name = %self.bus_name, "could not release bus name");
        }
    }
}

async fn forward_signals(connection: Connection, mut signals: mpsc::UnboundedReceiver<BridgeSignal>) {
    while let Some(signal) = signals.recv().await {
        if let Err(e) = emit(&connection, signal).await {
            warn!(error = %e, "failed to emit signal");
        }
    }

    debug!("bridge signals closed");
}

async fn emit(connection: &Connection, signal: BridgeSignal) -> zbus::Result<()> {
    match signal {
        BridgeSignal::PropertiesChanged(changes) => properties_changed(connection, changes).await,
        BridgeSignal::Seeked(position) => {
            let emitter = SignalEmitter::new(connection, OBJECT_PATH)?;
            Player::seeked(&emitter, position).await
        }
    }
}

async fn properties_changed(connection: &Connection, changes: ChangeSet) -> zbus::Result<()> {
    let changed: HashMap<&str, Value<'static>> = changes
        .changed
        .into_iter()
        .map(|(name, value)| (name, to_value(value)))
        .collect();

    debug!(interface = %changes.interface, properties = ?changed.keys().collect::<Vec<_>>(), "emitting PropertiesChanged");

    connection
        .emit_signal(
            None::<BusName<'_>>,
            OBJECT_PATH,
            PROPERTIES_INTERFACE,
            "PropertiesChanged",
            &(changes.interface.name(), changed, changes.invalidated),
        )
        .await
}
