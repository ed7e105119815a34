use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use super::protocol::{PROTOCOL_VERSION, object, signal};
use super::{Message, MessageCodec, Value, Xmms2Error};

type Reply = Result<Value, Xmms2Error>;

/// Replies to one broadcast subscription, in arrival order
pub type BroadcastReceiver = mpsc::UnboundedReceiver<Reply>;

/// Connection to an XMMS2 daemon over its IPC socket.
///
/// Cheap to clone; all clones share one socket. A background task reads
/// replies and routes them by cookie to the request or broadcast that
/// expects them.
#[derive(Clone)]
pub struct Xmms2Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    writer: tokio::sync::Mutex<FramedWrite<OwnedWriteHalf, MessageCodec>>,
    routes: Mutex<Routes>,
    next_cookie: AtomicU32,
    disconnected: CancellationToken,
}

#[derive(Default)]
struct Routes {
    requests: HashMap<u32, oneshot::Sender<Reply>>,
    broadcasts: HashMap<u32, mpsc::UnboundedSender<Reply>>,
}

impl Xmms2Client {
    /// Connect to the daemon at `ipc_path` and introduce ourselves.
    ///
    /// # Errors
    /// Returns error if the path is not a unix socket URL, the socket cannot
    /// be opened, or the daemon rejects the hello
    #[instrument]
    pub async fn connect(ipc_path: &str, client_name: &str) -> Result<Self, Xmms2Error> {
        let path = socket_path(ipc_path)?;
        let stream = UnixStream::connect(&path)
            .await
            .map_err(|source| Xmms2Error::Connect {
                path: path.display().to_string(),
                source,
            })?;

        let client = Self::from_stream(stream);
        client
            .request(
                object::MAIN,
                super::protocol::main::HELLO,
                vec![
                    Value::Int(PROTOCOL_VERSION),
                    Value::String(client_name.to_string()),
                ],
            )
            .await?;

        info!(path = %path.display(), "connected to XMMS2");
        Ok(client)
    }

    /// Wrap an already connected socket without a handshake
    pub(crate) fn from_stream(stream: UnixStream) -> Self {
        let (read_half, write_half) = stream.into_split();

        let inner = Arc::new(ClientInner {
            writer: tokio::sync::Mutex::new(FramedWrite::new(write_half, MessageCodec)),
            routes: Mutex::new(Routes::default()),
            next_cookie: AtomicU32::new(0),
            disconnected: CancellationToken::new(),
        });

        let frames = FramedRead::new(read_half, MessageCodec);
        tokio::spawn(Arc::clone(&inner).read_loop(frames));

        Self { inner }
    }

    /// Send a command and wait for its reply.
    ///
    /// # Errors
    /// Returns `Xmms2Error::Server` for error replies and
    /// `Xmms2Error::Disconnected` if the connection closes first
    pub async fn request(
        &self,
        object: u32,
        command: u32,
        args: Vec<Value>,
    ) -> Result<Value, Xmms2Error> {
        let cookie = self.inner.next_cookie();
        let (tx, rx) = oneshot::channel();
        self.inner.register(|routes| {
            routes.requests.insert(cookie, tx);
        })?;

        trace!(object, command, cookie, "sending request");
        if let Err(e) = self.inner.send(Message::request(object, command, cookie, args)).await {
            self.inner.routes().requests.remove(&cookie);
            return Err(e);
        }

        rx.await.unwrap_or(Err(Xmms2Error::Disconnected))
    }

    /// Subscribe to a broadcast.
    ///
    /// The daemon answers every later occurrence on the same cookie; the
    /// receiver closes when the connection does.
    ///
    /// # Errors
    /// Returns error if the subscription could not be sent
    pub async fn broadcast(&self, id: i64) -> Result<BroadcastReceiver, Xmms2Error> {
        let cookie = self.inner.next_cookie();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.register(|routes| {
            routes.broadcasts.insert(cookie, tx);
        })?;

        debug!(id, cookie, "subscribing to broadcast");
        let message = Message::request(object::SIGNAL, signal::BROADCAST, cookie, vec![Value::Int(id)]);
        if let Err(e) = self.inner.send(message).await {
            self.inner.routes().broadcasts.remove(&cookie);
            return Err(e);
        }

        Ok(rx)
    }

    /// Close the connection, failing everything still waiting
    pub fn close(&self) {
        self.inner.close();
    }
}

impl ClientInner {
    fn next_cookie(&self) -> u32 {
        self.next_cookie.fetch_add(1, Ordering::Relaxed)
    }

    fn routes(&self) -> MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a route unless the connection is already closed
    fn register(&self, add: impl FnOnce(&mut Routes)) -> Result<(), Xmms2Error> {
        let mut routes = self.routes();
        if self.disconnected.is_cancelled() {
            return Err(Xmms2Error::Disconnected);
        }
        add(&mut routes);
        Ok(())
    }

    async fn send(&self, message: Message) -> Result<(), Xmms2Error> {
        self.writer.lock().await.send(message).await
    }

    async fn read_loop(self: Arc<Self>, mut frames: FramedRead<OwnedReadHalf, MessageCodec>) {
        loop {
            tokio::select! {
                _ = self.disconnected.cancelled() => break,
                frame = frames.next() => match frame {
                    Some(Ok(message)) => self.dispatch(message),
                    Some(Err(e)) => {
                        warn!(error = %e, "XMMS2 connection failed");
                        break;
                    }
                    None => {
                        info!("XMMS2 closed the connection");
                        break;
                    }
                },
            }
        }

        self.close();
    }

    fn dispatch(&self, message: Message) {
        let cookie = message.cookie;
        let reply = message.value();
        let mut routes = self.routes();

        if let Some(tx) = routes.requests.remove(&cookie) {
            let _ = tx.send(reply);
            return;
        }

        if let Some(tx) = routes.broadcasts.get(&cookie) {
            if tx.send(reply).is_err() {
                debug!(cookie, "broadcast receiver dropped");
                routes.broadcasts.remove(&cookie);
            }
            return;
        }

        trace!(cookie, "reply for unknown cookie");
    }

    fn close(&self) {
        let mut routes = self.routes();
        self.disconnected.cancel();

        let pending = routes.requests.len();
        routes.requests.clear();
        routes.broadcasts.clear();

        if pending > 0 {
            debug!(pending, "failed outstanding requests on disconnect");
        }
    }
}

/// Socket path of an IPC URL such as `unix:///tmp/xmms-ipc-alice`
///
/// # Errors
/// Returns `Xmms2Error::UnsupportedTransport` for non-unix transports
pub fn socket_path(ipc_path: &str) -> Result<PathBuf, Xmms2Error> {
    if let Some(path) = ipc_path.strip_prefix("unix://") {
        return Ok(PathBuf::from(path));
    }

    if ipc_path.contains("://") {
        return Err(Xmms2Error::UnsupportedTransport(ipc_path.to_string()));
    }

    Ok(PathBuf::from(ipc_path))
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio_util::codec::{Decoder, Encoder};

    use super::*;
    use crate::services::xmms2::protocol::{playback, reply};

    /// Read one request from the daemon end of the socket
    async fn read_request(daemon: &mut UnixStream, buf: &mut BytesMut) -> Message {
        loop {
            if let Some(message) = MessageCodec.decode(buf).unwrap() {
                return message;
            }
            daemon.read_buf(buf).await.unwrap();
        }
    }

    async fn write_reply(daemon: &mut UnixStream, command: u32, cookie: u32, value: Value) {
        let mut payload = BytesMut::new();
        value.encode(&mut payload);
        let message = Message {
            object: object::PLAYBACK,
            command,
            cookie,
            payload: payload.freeze(),
        };

        let mut frame = BytesMut::new();
        MessageCodec.encode(message, &mut frame).unwrap();
        daemon.write_all(&frame).await.unwrap();
    }

    #[test]
    fn socket_path_strips_unix_scheme() {
        assert_eq!(
            socket_path("unix:///tmp/xmms-ipc-alice").unwrap(),
            PathBuf::from("/tmp/xmms-ipc-alice")
        );
        assert_eq!(socket_path("/run/xmms").unwrap(), PathBuf::from("/run/xmms"));
        assert!(matches!(
            socket_path("tcp://127.0.0.1:9667"),
            Err(Xmms2Error::UnsupportedTransport(_))
        ));
    }

    #[tokio::test]
    async fn replies_are_routed_by_cookie() {
        let (ours, mut daemon) = UnixStream::pair().unwrap();
        let client = Xmms2Client::from_stream(ours);

        let status = tokio::spawn({
            let client = client.clone();
            async move { client.request(object::PLAYBACK, playback::STATUS, Vec::new()).await }
        });
        let playtime = tokio::spawn({
            let client = client.clone();
            async move { client.request(object::PLAYBACK, playback::PLAYTIME, Vec::new()).await }
        });

        let mut buf = BytesMut::new();
        let first = read_request(&mut daemon, &mut buf).await;
        let second = read_request(&mut daemon, &mut buf).await;
        let (status_req, playtime_req) = if first.command == playback::STATUS {
            (first, second)
        } else {
            (second, first)
        };

        write_reply(&mut daemon, reply::REPLY, playtime_req.cookie, Value::Int(1500)).await;
        write_reply(&mut daemon, reply::REPLY, status_req.cookie, Value::Int(1)).await;

        assert_eq!(status.await.unwrap().unwrap(), Value::Int(1));
        assert_eq!(playtime.await.unwrap().unwrap(), Value::Int(1500));
    }

    #[tokio::test]
    async fn error_reply_fails_the_request() {
        let (ours, mut daemon) = UnixStream::pair().unwrap();
        let client = Xmms2Client::from_stream(ours);

        let request = tokio::spawn({
            let client = client.clone();
            async move { client.request(object::PLAYBACK, playback::START, Vec::new()).await }
        });

        let mut buf = BytesMut::new();
        let sent = read_request(&mut daemon, &mut buf).await;
        write_reply(
            &mut daemon,
            reply::ERROR,
            sent.cookie,
            Value::Error("playlist empty".to_string()),
        )
        .await;

        assert!(matches!(
            request.await.unwrap(),
            Err(Xmms2Error::Server(reason)) if reason == "playlist empty"
        ));
    }

    #[tokio::test]
    async fn broadcasts_repeat_on_one_cookie() {
        let (ours, mut daemon) = UnixStream::pair().unwrap();
        let client = Xmms2Client::from_stream(ours);

        let mut updates = client.broadcast(2).await.unwrap();
        let mut buf = BytesMut::new();
        let sent = read_request(&mut daemon, &mut buf).await;
        assert_eq!(sent.object, object::SIGNAL);

        write_reply(&mut daemon, reply::REPLY, sent.cookie, Value::Int(1)).await;
        write_reply(&mut daemon, reply::REPLY, sent.cookie, Value::Int(2)).await;

        assert_eq!(updates.recv().await.unwrap().unwrap(), Value::Int(1));
        assert_eq!(updates.recv().await.unwrap().unwrap(), Value::Int(2));
    }

    #[tokio::test]
    async fn eof_fails_pending_requests_and_ends_broadcasts() {
        let (ours, mut daemon) = UnixStream::pair().unwrap();
        let client = Xmms2Client::from_stream(ours);
        let mut updates = client.broadcast(2).await.unwrap();

        let request = tokio::spawn({
            let client = client.clone();
            async move { client.request(object::PLAYBACK, playback::STATUS, Vec::new()).await }
        });

        let mut buf = BytesMut::new();
        read_request(&mut daemon, &mut buf).await;
        read_request(&mut daemon, &mut buf).await;
        drop(daemon);

        assert!(matches!(request.await.unwrap(), Err(Xmms2Error::Disconnected)));
        assert!(updates.recv().await.is_none());
        assert!(client.inner.disconnected.is_cancelled());
        assert!(matches!(
            client.request(object::PLAYBACK, playback::STOP, Vec::new()).await,
            Err(Xmms2Error::Disconnected)
        ));
    }
}
