use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    sync::Mutex,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async_with_config,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::HeaderValue,
        protocol::{CloseFrame, WebSocketConfig, frame::coding::CloseCode},
    },
};
use tracing::{debug, trace};

use crate::{Closure, ConnectionState, Inbound, TransportError};

/// How long a closing connection waits for the peer to shut the transport down.
pub const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Byte stream under a WebSocket opened with [`Connection::connect`].
pub type TcpTransport = MaybeTlsStream<TcpStream>;

/// A connection established over TCP, optionally wrapped in TLS.
pub type TcpConnection = Connection<TcpTransport>;

/// One WebSocket owned by one session.
pub struct Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// `None` once the inbound side has been drained.
    reader: Option<SplitStream<WebSocketStream<S>>>,
    writer: ConnectionWriter<S>,
    state: ConnectionState,
}

impl TcpConnection {
    /// Opens a WebSocket to `endpoint`, sending `headers` with the upgrade request.
    ///
    /// The returned connection is in [`ConnectionState::Handshaking`].
    pub async fn connect<'a>(
        endpoint: &str,
        headers: impl IntoIterator<Item = (&'static str, &'a str)>,
        config: WebSocketConfig,
    ) -> Result<Self, TransportError> {
        let mut request = endpoint.into_client_request()?;
        for (name, value) in headers {
            let value = HeaderValue::from_str(value)
                .map_err(|source| TransportError::InvalidHeader { name, source })?;
            request.headers_mut().insert(name, value);
        }

        let (stream, response) = connect_async_with_config(request, Some(config), false).await?;
        debug!(endpoint, status = %response.status(), "WebSocket connection established");

        let mut connection = Self::new(stream);
        connection.advance(ConnectionState::Handshaking);
        Ok(connection)
    }
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps an already upgraded WebSocket. The connection starts in
    /// [`ConnectionState::Connecting`].
    pub fn new(stream: WebSocketStream<S>) -> Self {
        let (sink, reader) = stream.split();
        Self {
            reader: Some(reader),
            writer: ConnectionWriter::new(sink),
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Moves to `next` if it comes later in the lifecycle. Returns whether the
    /// state changed.
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if next <= self.state {
            trace!(current = %self.state, requested = %next, "Ignoring backward state transition");
            return false;
        }
        trace!(from = %self.state, to = %next, "Connection state changed");
        self.state = next;
        true
    }

    /// A handle for sending on this connection, usable concurrently with reads.
    pub fn writer(&self) -> ConnectionWriter<S> {
        self.writer.clone()
    }

    pub async fn send_binary(&self, payload: Bytes) -> Result<(), TransportError> {
        self.writer.send_binary(payload).await
    }

    /// Waits for the next data or close message, skipping control frames.
    pub async fn receive(&mut self) -> Result<Inbound, TransportError> {
        let reader = self.reader.as_mut().ok_or(TransportError::Closed)?;
        loop {
            match reader.next().await {
                Some(Ok(Message::Binary(payload))) => return Ok(Inbound::Binary(payload)),
                Some(Ok(Message::Text(text))) => return Ok(Inbound::Text(text.to_string())),
                Some(Ok(Message::Close(frame))) => {
                    self.writer.mark_closed().await;
                    let closure = Closure::from(frame);
                    debug!(%closure, "Peer closed the connection");
                    return Ok(Inbound::Closed(closure));
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {
                    trace!("Skipping control frame");
                }
                // The stream ends after this error but the writer stays usable,
                // so the caller can still close with a reason.
                Some(Err(tungstenite::Error::Utf8 { .. })) => {
                    debug!("Received text frame with invalid UTF-8");
                    return Ok(Inbound::InvalidText);
                }
                Some(Err(error)) => {
                    self.writer.mark_closed().await;
                    return Err(error.into());
                }
                None => {
                    self.writer.mark_closed().await;
                    return Err(TransportError::Closed);
                }
            }
        }
    }

    /// Closes the connection and waits until the peer has finished its side,
    /// or [`CLOSE_TIMEOUT`] has passed.
    ///
    /// Sends a close frame unless one was already sent or received, so only
    /// the first close of a connection reaches the peer.
    pub async fn close(&mut self, code: CloseCode, reason: &str) -> Result<(), TransportError> {
        self.advance(ConnectionState::Closing);
        let result = self.writer.close(code, reason).await;
        self.drain().await;
        self.advance(ConnectionState::Closed);
        result.map(|_| ())
    }

    /// Completes a closing handshake started by the peer.
    ///
    /// Reading on flushes the close reply queued by the WebSocket layer; the
    /// call returns once the peer has shut the transport down.
    pub async fn finish(&mut self) {
        self.advance(ConnectionState::Closing);
        self.writer.mark_closed().await;
        self.drain().await;
        self.advance(ConnectionState::Closed);
    }

    async fn drain(&mut self) {
        if let Some(reader) = self.reader.take() {
            discard_inbound(reader).await;
        }
    }
}

impl<S> Drop for Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    fn drop(&mut self) {
        let Some(reader) = self.reader.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(state = %self.state, "Connection dropped outside a runtime, skipping close");
            return;
        };

        debug!(state = %self.state, "Connection dropped while open, closing it");
        let writer = self.writer.clone();
        runtime.spawn(async move {
            if let Err(error) = writer.close(CloseCode::Normal, "").await {
                debug!(%error, "Failed to close dropped connection");
            }
            discard_inbound(reader).await;
        });
    }
}

/// Reads until the peer ends the transport, giving up after [`CLOSE_TIMEOUT`].
async fn discard_inbound<S>(mut reader: SplitStream<WebSocketStream<S>>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let drain = async {
        while let Some(message) = reader.next().await {
            match message {
                Ok(message) => trace!(?message, "Discarding message received while closing"),
                Err(error) => {
                    trace!(%error, "Transport ended while closing");
                    break;
                }
            }
        }
    };
    if tokio::time::timeout(CLOSE_TIMEOUT, drain).await.is_err() {
        debug!(timeout = ?CLOSE_TIMEOUT, "Peer did not finish closing in time, dropping transport");
    }
}

/// Cloneable sending half of a [`Connection`].
///
/// Sends are serialised in the order they acquire the writer, and a close
/// waits for any send already in progress.
pub struct ConnectionWriter<S> {
    inner: Arc<Mutex<WriterInner<S>>>,
}

struct WriterInner<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
    closed: bool,
}

impl<S> Clone for ConnectionWriter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> ConnectionWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn new(sink: SplitSink<WebSocketStream<S>, Message>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WriterInner {
                sink,
                closed: false,
            })),
        }
    }

    pub async fn send_binary(&self, payload: Bytes) -> Result<(), TransportError> {
        self.send(Message::Binary(payload)).await
    }

    pub async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.send(Message::text(text.to_owned())).await
    }

    async fn send(&self, message: Message) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            return Err(TransportError::Closed);
        }
        inner.sink.send(message).await?;
        Ok(())
    }

    /// Sends a close frame if none was sent or received yet.
    ///
    /// Returns `true` if this call sent the close frame.
    pub async fn close(&self, code: CloseCode, reason: &str) -> Result<bool, TransportError> {
        let mut inner = self.inner.lock().await;
        if inner.closed {
            trace!(%code, reason, "Connection already closed, skipping close");
            return Ok(false);
        }
        inner.closed = true;

        let frame = CloseFrame {
            code,
            reason: reason.to_owned().into(),
        };
        match inner.sink.send(Message::Close(Some(frame))).await {
            Ok(()) => {
                debug!(%code, reason, "Sent close frame");
                Ok(true)
            }
            // The peer went away first; there is nobody left to notify.
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                Ok(false)
            }
            Err(error) => Err(error.into()),
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    async fn mark_closed(&self) {
        self.inner.lock().await.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use tokio::io::{AsyncWriteExt, DuplexStream};
    use tokio_tungstenite::tungstenite::protocol::Role;

    use super::*;

    async fn pair() -> (Connection<DuplexStream>, WebSocketStream<DuplexStream>) {
        let (client, server) = tokio::io::duplex(64 * 1024);
        let client = WebSocketStream::from_raw_socket(client, Role::Client, None).await;
        let server = WebSocketStream::from_raw_socket(server, Role::Server, None).await;
        (Connection::new(client), server)
    }

    async fn next_close(server: &mut WebSocketStream<DuplexStream>) -> Option<CloseFrame> {
        loop {
            match server.next().await {
                Some(Ok(Message::Close(frame))) => return frame,
                Some(Ok(_)) => continue,
                other => panic!("expected close frame, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_receive_skips_control_frames() {
        let (mut connection, mut server) = pair().await;
        server.send(Message::Ping(vec![1, 2].into())).await.unwrap();
        server
            .send(Message::Binary(Bytes::from_static(b"payload")))
            .await
            .unwrap();

        assert_eq!(
            connection.receive().await.unwrap(),
            Inbound::Binary(Bytes::from_static(b"payload"))
        );
    }

    #[tokio::test]
    async fn test_receive_reports_peer_closure() {
        let (mut connection, mut server) = pair().await;
        server
            .send(Message::Close(Some(CloseFrame {
                code: CloseCode::Away,
                reason: "bye".to_owned().into(),
            })))
            .await
            .unwrap();

        let inbound = connection.receive().await.unwrap();
        assert_eq!(inbound, Inbound::Closed(Closure::new(CloseCode::Away, "bye")));
        assert!(connection.writer().is_closed().await);
    }

    #[tokio::test]
    async fn test_close_is_sent_only_once() {
        let (connection, mut server) = pair().await;
        let writer = connection.writer();

        assert!(writer.close(CloseCode::Policy, "first").await.unwrap());
        assert!(!writer.close(CloseCode::Normal, "second").await.unwrap());

        let frame = next_close(&mut server).await.unwrap();
        assert_eq!(frame.code, CloseCode::Policy);
        assert_eq!(frame.reason.as_str(), "first");
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (connection, _server) = pair().await;
        let writer = connection.writer();
        writer.close(CloseCode::Normal, "").await.unwrap();

        assert_matches!(
            writer.send_text("late").await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn test_state_never_moves_backwards() {
        let (mut connection, _server) = pair().await;
        assert_eq!(connection.state(), ConnectionState::Connecting);

        assert!(connection.advance(ConnectionState::Streaming));
        assert!(!connection.advance(ConnectionState::Handshaking));
        assert_eq!(connection.state(), ConnectionState::Streaming);
    }

    #[tokio::test]
    async fn test_dropping_open_connection_closes_normally() {
        let (connection, mut server) = pair().await;
        drop(connection);

        let frame = next_close(&mut server).await.unwrap();
        assert_eq!(frame.code, CloseCode::Normal);
    }

    #[tokio::test]
    async fn test_invalid_utf8_text_keeps_writer_open() {
        let (client, mut server) = tokio::io::duplex(64 * 1024);
        // Unmasked final text frame carrying the single byte 0xff.
        server.write_all(&[0x81, 0x01, 0xff]).await.unwrap();
        let client = WebSocketStream::from_raw_socket(client, Role::Client, None).await;
        let mut server = WebSocketStream::from_raw_socket(server, Role::Server, None).await;
        let mut connection = Connection::new(client);

        assert_eq!(connection.receive().await.unwrap(), Inbound::InvalidText);
        assert!(!connection.writer().is_closed().await);

        assert!(
            connection
                .writer()
                .close(CloseCode::Policy, "bad text")
                .await
                .unwrap()
        );
        let frame = next_close(&mut server).await.unwrap();
        assert_eq!(frame.code, CloseCode::Policy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_gives_up_on_unresponsive_peer() {
        let (mut connection, _server) = pair().await;

        connection.close(CloseCode::Normal, "").await.unwrap();
        assert_eq!(connection.state(), ConnectionState::Closed);
    }

    #[test]
    fn test_drop_outside_runtime_skips_close() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let (connection, mut server) = runtime.block_on(pair());
        drop(connection);

        // The transport just ends, without a closing handshake.
        assert_matches!(runtime.block_on(server.next()), Some(Err(_)) | None);
    }
}
