use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::ServiceInput;
use super::{BridgeError, Daemon, DaemonError, PlaybackStatus};

/// Control-surface verbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandVerb {
    /// Start playback
    Play,
    /// Pause playback
    Pause,
    /// Stop playback
    Stop,
    /// Toggle between playing and paused
    PlayPause,
    /// Skip to the next track
    Next,
    /// Go back to the previous track
    Previous,
    /// Seek relative to the current position
    Seek,
    /// Seek to an absolute position
    SetPosition,
    /// Open and play a URI
    OpenUri,
    /// Set the output volume
    SetVolume,
    /// Raise the player's user interface
    Raise,
    /// Make the daemon exit
    Quit,
}

impl CommandVerb {
    /// MPRIS member name of the verb
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Play => "Play",
            Self::Pause => "Pause",
            Self::Stop => "Stop",
            Self::PlayPause => "PlayPause",
            Self::Next => "Next",
            Self::Previous => "Previous",
            Self::Seek => "Seek",
            Self::SetPosition => "SetPosition",
            Self::OpenUri => "OpenUri",
            Self::SetVolume => "SetVolume",
            Self::Raise => "Raise",
            Self::Quit => "Quit",
        }
    }
}

impl fmt::Display for CommandVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation identifier of an issued command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId {
    /// Bridge instance that issued the command
    pub generation: u64,
    /// Position in that instance's issue order
    pub sequence: u64,
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.generation, self.sequence)
    }
}

/// Lifecycle of an issued command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandState {
    /// Request sent, no answer yet
    Issued,
    /// The daemon accepted the request
    Acknowledged,
    /// The daemon rejected the request
    Failed,
    /// Cancelled before the daemon answered
    Abandoned,
}

/// A command awaiting the daemon's answer
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCommand {
    /// Correlation identifier
    pub id: CommandId,
    /// What was asked
    pub verb: CommandVerb,
    /// Where the command is in its lifecycle
    pub state: CommandState,
}

/// Final result of a command
pub type CommandOutcome = Result<(), BridgeError>;

/// Resolves once the daemon has answered the command.
///
/// Dropping the handle only discards the outcome; the request still runs to
/// completion.
#[derive(Debug)]
pub struct CommandHandle {
    id: CommandId,
    verb: CommandVerb,
    outcome: oneshot::Receiver<CommandOutcome>,
}

impl CommandHandle {
    fn resolved(id: CommandId, verb: CommandVerb, outcome: CommandOutcome) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(outcome);
        Self {
            id,
            verb,
            outcome: rx,
        }
    }

    /// Correlation identifier of the command
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// Verb the command carries
    pub fn verb(&self) -> CommandVerb {
        self.verb
    }
}

impl Future for CommandHandle {
    type Output = CommandOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let verb = self.verb;
        Pin::new(&mut self.outcome)
            .poll(cx)
            .map(|outcome| outcome.unwrap_or(Err(BridgeError::Abandoned { verb })))
    }
}

/// Translates control-surface verbs into daemon requests.
///
/// Every call returns immediately with a [`CommandHandle`]; the daemon round
/// trip runs on its own task. Nothing is retried.
#[derive(Clone)]
pub struct CommandTranslator {
    inner: Arc<TranslatorInner>,
}

struct TranslatorInner {
    daemon: Arc<dyn Daemon>,
    generation: u64,
    sequence: AtomicU64,
    pending: Mutex<HashMap<CommandId, PendingCommand>>,
    shutdown: CancellationToken,
    inputs: mpsc::UnboundedSender<ServiceInput>,
}

impl CommandTranslator {
    pub(crate) fn new(
        daemon: Arc<dyn Daemon>,
        generation: u64,
        shutdown: CancellationToken,
        inputs: mpsc::UnboundedSender<ServiceInput>,
    ) -> Self {
        Self {
            inner: Arc::new(TranslatorInner {
                daemon,
                generation,
                sequence: AtomicU64::new(0),
                pending: Mutex::new(HashMap::new()),
                shutdown,
                inputs,
            }),
        }
    }

    /// Start playback
    pub fn play(&self) -> CommandHandle {
        self.issue(CommandVerb::Play, |daemon| async move { daemon.play().await })
    }

    /// Pause playback
    pub fn pause(&self) -> CommandHandle {
        self.issue(CommandVerb::Pause, |daemon| async move { daemon.pause().await })
    }

    /// Stop playback
    pub fn stop(&self) -> CommandHandle {
        self.issue(CommandVerb::Stop, |daemon| async move { daemon.stop().await })
    }

    /// Toggle playback.
    ///
    /// Asks the daemon for its status first and branches on the answer; the
    /// local cache may be stale if another client changed state meanwhile.
    pub fn play_pause(&self) -> CommandHandle {
        self.issue(CommandVerb::PlayPause, |daemon| async move {
            match daemon.status().await? {
                PlaybackStatus::Playing => daemon.pause().await,
                PlaybackStatus::Paused | PlaybackStatus::Stopped => daemon.play().await,
            }
        })
    }

    /// Skip to the next track
    pub fn next(&self) -> CommandHandle {
        self.issue(CommandVerb::Next, |daemon| async move {
            daemon.set_next_relative(1).await?;
            daemon.tickle().await
        })
    }

    /// Go back to the previous track
    pub fn previous(&self) -> CommandHandle {
        self.issue(CommandVerb::Previous, |daemon| async move {
            daemon.set_next_relative(-1).await?;
            daemon.tickle().await
        })
    }

    /// Seek by `offset_us` microseconds relative to the current position.
    ///
    /// Once acknowledged, the new position is read back and fed to the event
    /// path, which announces it with a `Seeked` signal.
    pub fn seek(&self, offset_us: i64) -> CommandHandle {
        let generation = self.inner.generation;
        let inputs = self.inner.inputs.clone();

        self.issue(CommandVerb::Seek, move |daemon| async move {
            daemon.seek_relative(offset_us).await?;

            match daemon.playtime().await {
                Ok(position) => {
                    let _ = inputs.send(ServiceInput::PositionRefreshed {
                        generation,
                        position,
                        observed_at: Instant::now(),
                        seeked: true,
                    });
                }
                Err(e) => warn!(error = %e, "could not read position after seek"),
            }

            Ok(())
        })
    }

    /// Set the output volume.
    ///
    /// # Errors
    /// Returns `BridgeError::OutOfRange` without contacting the daemon when
    /// `level` is outside `[0.0, 1.0]`.
    pub fn set_volume(&self, level: f64) -> Result<CommandHandle, BridgeError> {
        if !(0.0..=1.0).contains(&level) {
            debug!(level, "rejecting volume outside protocol domain");
            return Err(BridgeError::OutOfRange {
                argument: "volume",
                value: level,
                min: 0.0,
                max: 1.0,
            });
        }

        Ok(self.issue(CommandVerb::SetVolume, move |daemon| async move {
            daemon.set_volume(level).await
        }))
    }

    /// Absolute seeking is not supported; accepted and ignored
    pub fn set_position(&self, track_id: &str, position_us: i64) -> CommandHandle {
        debug!(track_id, position_us, "ignoring SetPosition");
        self.accept(CommandVerb::SetPosition)
    }

    /// Opening URIs is not supported; accepted and ignored
    pub fn open_uri(&self, uri: &str) -> CommandHandle {
        debug!(uri, "ignoring OpenUri");
        self.accept(CommandVerb::OpenUri)
    }

    /// The daemon has no window to raise; accepted and ignored
    pub fn raise(&self) -> CommandHandle {
        self.accept(CommandVerb::Raise)
    }

    /// Ask the daemon to exit.
    ///
    /// The bridge follows through the connection-lost path once the daemon
    /// is gone.
    pub fn quit(&self) -> CommandHandle {
        self.issue(CommandVerb::Quit, |daemon| async move { daemon.quit().await })
    }

    /// Commands still waiting for the daemon
    pub fn pending(&self) -> Vec<PendingCommand> {
        let pending = self.inner.lock_pending();
        let mut commands: Vec<PendingCommand> = pending.values().cloned().collect();
        commands.sort_by_key(|command| command.id.sequence);
        commands
    }

    /// Abandon every outstanding command.
    ///
    /// Their handles resolve with `BridgeError::Abandoned` and any answer the
    /// daemon still sends is discarded. Commands issued afterwards are
    /// abandoned immediately.
    pub fn abandon_all(&self) {
        self.inner.shutdown.cancel();

        let abandoned: Vec<PendingCommand> = self.inner.lock_pending().drain().map(|(_, c)| c).collect();
        for command in abandoned {
            info!(id = %command.id, verb = %command.verb, "command abandoned");
        }
    }

    fn accept(&self, verb: CommandVerb) -> CommandHandle {
        CommandHandle::resolved(self.inner.next_id(), verb, Ok(()))
    }

    fn issue<F, Fut>(&self, verb: CommandVerb, request: F) -> CommandHandle
    where
        F: FnOnce(Arc<dyn Daemon>) -> Fut,
        Fut: Future<Output = Result<(), DaemonError>> + Send + 'static,
    {
        let id = self.inner.next_id();

        if self.inner.shutdown.is_cancelled() {
            debug!(%id, %verb, "bridge is shutting down, not issuing");
            return CommandHandle::resolved(id, verb, Err(BridgeError::Abandoned { verb }));
        }

        let (tx, rx) = oneshot::channel();
        self.inner.register(id, verb);

        let request = request(Arc::clone(&self.inner.daemon));
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.drive(id, verb, request, tx).await });

        CommandHandle {
            id,
            verb,
            outcome: rx,
        }
    }
}

impl TranslatorInner {
    fn next_id(&self) -> CommandId {
        CommandId {
            generation: self.generation,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        }
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<CommandId, PendingCommand>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn register(&self, id: CommandId, verb: CommandVerb) {
        debug!(%id, %verb, "command issued");
        self.lock_pending().insert(
            id,
            PendingCommand {
                id,
                verb,
                state: CommandState::Issued,
            },
        );
    }

    async fn drive<Fut>(
        self: Arc<Self>,
        id: CommandId,
        verb: CommandVerb,
        request: Fut,
        reply: oneshot::Sender<CommandOutcome>,
    ) where
        Fut: Future<Output = Result<(), DaemonError>> + Send,
    {
        // An issued request sequence always runs to completion.
        tokio::pin!(request);

        let result = tokio::select! {
            _ = self.shutdown.cancelled() => {
                self.finish(id, verb, CommandState::Abandoned);
                let _ = reply.send(Err(BridgeError::Abandoned { verb }));

                if let Err(e) = request.await {
                    debug!(%id, %verb, error = %e, "abandoned command failed");
                }
                return;
            }
            result = &mut request => result,
        };

        let outcome = result.map_err(|e| BridgeError::DaemonRequestFailed {
            verb,
            reason: e.to_string(),
        });

        let state = match &outcome {
            Ok(()) => CommandState::Acknowledged,
            Err(_) => CommandState::Failed,
        };
        self.finish(id, verb, state);

        if reply.send(outcome).is_err() {
            debug!(%id, %verb, "handle dropped, discarding outcome");
        }
    }

    fn finish(&self, id: CommandId, verb: CommandVerb, state: CommandState) {
        if self.lock_pending().remove(&id).is_none() {
            return;
        }

        match state {
            CommandState::Failed => warn!(%id, %verb, "command failed"),
            _ => debug!(%id, %verb, ?state, "command finished"),
        }
    }
}
