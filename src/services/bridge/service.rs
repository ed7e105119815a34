use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::services::common::Property;

use super::{
    AdapterOutput, AppIdentity, BridgeError, BridgeSignal, ChangeNotifier, CommandTranslator,
    Daemon, PlayerCapabilities, PlayerEventAdapter, PlayerState, PropertyExporter, StateCache,
    StateUpdate,
};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Results of daemon queries the bridge itself issued
#[derive(Debug)]
pub(crate) enum ServiceInput {
    /// The daemon reported the elapsed time of the current track
    PositionRefreshed {
        /// Bridge instance that asked
        generation: u64,
        /// Reported position
        position: Duration,
        /// When the answer arrived
        observed_at: Instant,
        /// Whether the query followed a seek
        seeked: bool,
    },
}

/// Composition root of the bridge.
///
/// Owns the state cache and the change notifier and is the only place that
/// mutates them: daemon notifications and query results are processed one at
/// a time by [`BridgeService::run`]. Property reads and commands go through
/// the cloneable [`PropertyExporter`] and [`CommandTranslator`].
pub struct BridgeService {
    generation: u64,
    daemon: Arc<dyn Daemon>,
    cache: StateCache,
    notifier: ChangeNotifier,
    snapshot: Property<PlayerState>,
    exporter: PropertyExporter,
    commands: CommandTranslator,
    inputs_tx: mpsc::UnboundedSender<ServiceInput>,
    inputs_rx: mpsc::UnboundedReceiver<ServiceInput>,
    signals_tx: mpsc::UnboundedSender<BridgeSignal>,
    shutdown: CancellationToken,
}

impl BridgeService {
    /// Create a bridge for one daemon connection.
    ///
    /// Returns the service together with the receiving end of its outbound
    /// signals.
    pub fn new(
        daemon: Arc<dyn Daemon>,
        identity: AppIdentity,
    ) -> (Self, mpsc::UnboundedReceiver<BridgeSignal>) {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        let cache = StateCache::new();
        let snapshot = Property::new(cache.read());
        let exporter = PropertyExporter::new(identity, snapshot.clone());
        let notifier = ChangeNotifier::new(PlayerCapabilities::BRIDGE, &cache.read());
        let shutdown = CancellationToken::new();
        let (inputs_tx, inputs_rx) = mpsc::unbounded_channel();
        let (signals_tx, signals_rx) = mpsc::unbounded_channel();
        let commands = CommandTranslator::new(
            Arc::clone(&daemon),
            generation,
            shutdown.clone(),
            inputs_tx.clone(),
        );

        let service = Self {
            generation,
            daemon,
            cache,
            notifier,
            snapshot,
            exporter,
            commands,
            inputs_tx,
            inputs_rx,
            signals_tx,
            shutdown,
        };

        (service, signals_rx)
    }

    /// Generation identifying this bridge instance
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Property reader backed by this bridge's published state
    pub fn exporter(&self) -> PropertyExporter {
        self.exporter.clone()
    }

    /// Command issuer bound to this bridge's daemon
    pub fn commands(&self) -> CommandTranslator {
        self.commands.clone()
    }

    /// Published state snapshots
    pub fn state(&self) -> Property<PlayerState> {
        self.snapshot.clone()
    }

    /// Token that stops [`BridgeService::run`] when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Process daemon notifications until shutdown.
    ///
    /// Outstanding commands are abandoned on the way out, whatever the reason.
    ///
    /// # Errors
    /// Returns `BridgeError::ConnectionLost` when the daemon subscription fails
    /// or the daemon goes away. A cancelled shutdown token ends with `Ok`.
    #[instrument(skip(self), fields(generation = self.generation))]
    pub async fn run(mut self) -> Result<(), BridgeError> {
        let result = match PlayerEventAdapter::subscribe(self.daemon.as_ref()).await {
            Ok(adapter) => self.process_events(adapter).await,
            Err(e) => Err(e),
        };

        self.shutdown.cancel();
        self.commands.abandon_all();

        match &result {
            Ok(()) => info!("bridge stopped"),
            Err(e) => warn!(error = %e, "bridge stopped"),
        }

        result
    }

    async fn process_events(&mut self, mut adapter: PlayerEventAdapter) -> Result<(), BridgeError> {
        loop {
            tokio::select! {
                biased;

                _ = self.shutdown.cancelled() => {
                    info!("shutdown requested");
                    return Ok(());
                }
                output = adapter.next() => match output {
                    AdapterOutput::Update(update) => self.process(update),
                    AdapterOutput::ConnectionLost => return Err(BridgeError::ConnectionLost),
                },
                Some(input) = self.inputs_rx.recv() => self.process_input(input),
            }
        }
    }

    fn process(&mut self, update: StateUpdate) {
        let status_changed = matches!(update, StateUpdate::StatusChanged(_));

        if !self.cache.apply(update) {
            debug!("update did not change cached state");
            return;
        }

        let state = self.cache.read();
        self.snapshot.set(state.clone());

        if let Some(changes) = self.notifier.observe(&state) {
            debug!(changed = ?changes.changed.keys().collect::<Vec<_>>(), "publishing changes");
            let _ = self.signals_tx.send(BridgeSignal::PropertiesChanged(changes));
        }

        if status_changed {
            self.refresh_position();
        }
    }

    fn process_input(&mut self, input: ServiceInput) {
        match input {
            ServiceInput::PositionRefreshed {
                generation,
                position,
                observed_at,
                seeked,
            } => {
                if generation != self.generation {
                    debug!(generation, "discarding position from another bridge instance");
                    return;
                }

                self.process(StateUpdate::PositionObserved {
                    position,
                    observed_at,
                });

                if seeked {
                    let position_us = i64::try_from(position.as_micros()).unwrap_or(i64::MAX);
                    let _ = self.signals_tx.send(BridgeSignal::Seeked(position_us));
                }
            }
        }
    }

    /// Read the position back from the daemon without blocking the event path
    fn refresh_position(&self) {
        let daemon = Arc::clone(&self.daemon);
        let inputs = self.inputs_tx.clone();
        let shutdown = self.shutdown.clone();
        let generation = self.generation;

        tokio::spawn(async move {
            let position = tokio::select! {
                _ = shutdown.cancelled() => return,
                position = daemon.playtime() => position,
            };

            match position {
                Ok(position) => {
                    let _ = inputs.send(ServiceInput::PositionRefreshed {
                        generation,
                        position,
                        observed_at: Instant::now(),
                        seeked: false,
                    });
                }
                Err(e) => debug!(error = %e, "position refresh failed"),
            }
        });
    }
}
