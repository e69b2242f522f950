//! Test helpers for courier crates.
//!
//! [`MockServer`] plays the server side of a parcel collection session from a
//! script, so tests can drive the client through handshakes, deliveries and
//! every way a session can end.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use courier_handshake::{Challenge, ChallengeCodec, MAX_CHALLENGE_SIZE, Response, ResponseCodec};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tokio_tungstenite::{
    WebSocketStream, accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response as UpgradeResponse},
        http::HeaderMap,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};
use tracing::debug;

/// Path the mock server pretends to serve.
pub const COLLECTION_PATH: &str = "/v1/parcel-collection";

/// Installs a test subscriber honouring `RUST_LOG`, defaulting to `debug`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Returns an endpoint on which nothing is listening.
pub async fn unreachable_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}{COLLECTION_PATH}")
}

/// A WebSocket server accepting a single session and running a script on it.
///
/// The script runs on its own task. Panics inside the script are re-raised by
/// [`MockServer::finish`]; the task is aborted if the server is dropped
/// without finishing.
pub struct MockServer {
    endpoint: String,
    connections: Arc<AtomicUsize>,
    request_headers: Arc<Mutex<Option<HeaderMap>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn spawn<F, Fut>(script: F) -> Self
    where
        F: FnOnce(ServerConnection) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("ws://{}{COLLECTION_PATH}", listener.local_addr().unwrap());
        let connections = Arc::new(AtomicUsize::new(0));
        let request_headers = Arc::new(Mutex::new(None));

        let task = tokio::spawn({
            let connections = Arc::clone(&connections);
            let request_headers = Arc::clone(&request_headers);
            async move {
                let (stream, peer) = listener.accept().await.unwrap();
                connections.fetch_add(1, Ordering::SeqCst);
                debug!(%peer, "Mock server accepted connection");

                let mut headers = HeaderMap::new();
                let ws = accept_hdr_async(stream, |request: &Request, response: UpgradeResponse| {
                    headers = request.headers().clone();
                    Ok::<_, ErrorResponse>(response)
                })
                .await
                .unwrap();
                *request_headers.lock() = Some(headers.clone());

                script(ServerConnection { ws, headers }).await;
            }
        });

        Self {
            endpoint,
            connections,
            request_headers,
            task,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Number of connections accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Value of a header from the upgrade request, once a client connected.
    pub fn request_header(&self, name: &str) -> Option<String> {
        self.request_headers
            .lock()
            .as_ref()?
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
    }

    /// Waits for the script to complete, propagating its panics.
    pub async fn finish(mut self) {
        if let Err(error) = (&mut self.task).await {
            if error.is_panic() {
                std::panic::resume_unwind(error.into_panic());
            }
            panic!("mock server task failed: {error}");
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Server side of one session, as seen by a [`MockServer`] script.
pub struct ServerConnection {
    ws: WebSocketStream<TcpStream>,
    headers: HeaderMap,
}

impl ServerConnection {
    pub fn request_header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub async fn send_challenge(&mut self, nonce: &'static [u8]) {
        let payload = ChallengeCodec::new(MAX_CHALLENGE_SIZE)
            .encode(Challenge::new(nonce).unwrap())
            .unwrap();
        self.ws.send(Message::Binary(payload)).await.unwrap();
    }

    /// Waits for the client's handshake response.
    pub async fn receive_response(&mut self) -> Response {
        match self.next_message().await {
            Some(Message::Binary(payload)) => {
                ResponseCodec::new(usize::MAX).decode(&payload).unwrap()
            }
            other => panic!("expected handshake response, got {other:?}"),
        }
    }

    /// Sends a challenge for `nonce` and returns the client's response.
    pub async fn handshake(&mut self, nonce: &'static [u8]) -> Response {
        self.send_challenge(nonce).await;
        self.receive_response().await
    }

    /// Sends a binary message, reporting failures instead of panicking so
    /// scripts can keep sending after the client went away.
    pub async fn send_binary(
        &mut self,
        payload: Bytes,
    ) -> Result<(), tokio_tungstenite::tungstenite::Error> {
        self.ws.send(Message::Binary(payload)).await
    }

    pub async fn send_text(&mut self, text: &str) {
        self.ws.send(Message::text(text.to_owned())).await.unwrap();
    }

    /// Next data or close message, or `None` once the transport has ended.
    pub async fn next_message(&mut self) -> Option<Message> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Ok(message)) => return Some(message),
                Some(Err(error)) => {
                    debug!(%error, "Mock server transport ended");
                    return None;
                }
                None => return None,
            }
        }
    }

    /// Closes the session from the server side and waits for the client's reply.
    pub async fn close(self, code: CloseCode, reason: &str) {
        self.close_with_reply(code, reason).await;
    }

    /// Like [`ServerConnection::close`], returning the close frame the client
    /// answered with.
    pub async fn close_with_reply(mut self, code: CloseCode, reason: &str) -> Option<CloseFrame> {
        let frame = CloseFrame {
            code,
            reason: reason.to_owned().into(),
        };
        let _ = self.ws.close(Some(frame)).await;

        let mut reply = None;
        while let Some(message) = self.next_message().await {
            match message {
                Message::Close(frame) => reply = frame,
                other => debug!(?other, "Mock server ignoring message while closing"),
            }
        }
        reply
    }

    /// Drops the TCP connection without a closing handshake.
    pub fn disconnect(self) {
        drop(self.ws);
    }

    /// Collects acknowledgements until the client closes the connection.
    ///
    /// Returns the acknowledged delivery ids and the client's close frame.
    /// Panics on any other message, or if the transport ends without a close.
    pub async fn acks_until_close(&mut self) -> (Vec<String>, Option<CloseFrame>) {
        let mut acks = Vec::new();
        loop {
            match self.next_message().await {
                Some(Message::Text(delivery_id)) => acks.push(delivery_id.to_string()),
                Some(Message::Close(frame)) => {
                    // Flush the close reply and wait for the client to hang up.
                    while self.next_message().await.is_some() {}
                    return (acks, frame);
                }
                other => panic!("expected ack or close, got {other:?}"),
            }
        }
    }
}
