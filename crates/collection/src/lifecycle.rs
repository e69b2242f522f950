//! Opening and finalizing collection connections.
//!
//! Every way a session can end is funnelled through [`fail`] or
//! [`complete`], which decide whether the client sends its own close frame
//! and translate what happened into a [`CollectionError`].

use courier_handshake::HandshakeError;
use courier_net_codec::CodecError;
use courier_net_ws::{
    CloseCode, Closure, Connection, TcpConnection, TransportError, WebSocketConfig,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::{CollectionError, STREAMING_MODE_HEADER, StreamingMode, metrics::CollectionMetrics};

/// Why a session ended before the server completed it.
#[derive(Debug)]
pub(crate) enum SessionFailure {
    Handshake(HandshakeError),
    InvalidDelivery(CodecError),
    UnexpectedClosure(Closure),
    ConnectionLost(TransportError),
}

/// Outbound close decided for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseAction {
    /// The server already closed or the transport is gone.
    Finish,
    Close(CloseCode, &'static str),
}

impl SessionFailure {
    fn close_action(&self) -> CloseAction {
        match self {
            Self::Handshake(HandshakeError::InvalidChallenge(_)) => {
                CloseAction::Close(CloseCode::Policy, "Invalid handshake challenge")
            }
            Self::Handshake(HandshakeError::Signer(_) | HandshakeError::Encode(_)) => {
                CloseAction::Close(CloseCode::Normal, "")
            }
            Self::Handshake(
                HandshakeError::Closed(_)
                | HandshakeError::Disconnected(_)
                | HandshakeError::Send(_),
            ) => CloseAction::Finish,
            Self::InvalidDelivery(_) => {
                CloseAction::Close(CloseCode::Policy, "Invalid parcel delivery")
            }
            Self::UnexpectedClosure(_) | Self::ConnectionLost(_) => CloseAction::Finish,
        }
    }

    fn into_error(self) -> CollectionError {
        match self {
            Self::Handshake(HandshakeError::Closed(closure)) => CollectionError::server_connection(
                "Server closed the connection during the handshake",
                closure,
            ),
            Self::Handshake(HandshakeError::Disconnected(error)) => {
                CollectionError::server_connection(
                    "Server closed the connection during the handshake",
                    error,
                )
            }
            Self::Handshake(HandshakeError::InvalidChallenge(error)) => {
                CollectionError::invalid_server_message(
                    "Server sent an invalid handshake challenge",
                    error,
                )
            }
            Self::Handshake(HandshakeError::Encode(error)) => {
                CollectionError::server_connection("Failed to encode handshake response", error)
            }
            Self::Handshake(HandshakeError::Send(error)) | Self::ConnectionLost(error) => {
                CollectionError::server_connection("Lost connection to the server", error)
            }
            Self::Handshake(HandshakeError::Signer(error)) => CollectionError::NonceSigner(error),
            Self::InvalidDelivery(error) => {
                CollectionError::invalid_server_message("Received invalid message from server", error)
            }
            Self::UnexpectedClosure(closure) => CollectionError::server_connection(
                format!(
                    "Server closed the connection unexpectedly (code: {}, reason: {})",
                    u16::from(closure.code),
                    closure.reason
                ),
                closure,
            ),
        }
    }
}

/// Opens a connection announcing `mode`, ready for the handshake.
pub(crate) async fn open(
    endpoint: &str,
    mode: StreamingMode,
) -> Result<TcpConnection, CollectionError> {
    debug!(endpoint, %mode, "Connecting to parcel collection endpoint");
    TcpConnection::connect(
        endpoint,
        [(STREAMING_MODE_HEADER, mode.header_value())],
        WebSocketConfig::default(),
    )
    .await
    .map_err(|error| CollectionError::server_connection("Failed to connect to the server", error))
}

/// Finalizes the connection after `failure` and returns the error to report.
///
/// Closes the connection at most once, then waits for the transport to end.
pub(crate) async fn fail<S>(
    connection: &mut Connection<S>,
    failure: SessionFailure,
    metrics: &CollectionMetrics,
) -> CollectionError
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    metrics.inc_session_failures();
    match failure.close_action() {
        CloseAction::Finish => connection.finish().await,
        CloseAction::Close(code, reason) => {
            if let Err(error) = connection.close(code, reason).await {
                debug!(%error, "Failed to close connection");
            }
        }
    }

    let error = failure.into_error();
    warn!(%error, "Parcel collection failed");
    error
}

/// Finalizes a connection the server closed normally.
pub(crate) async fn complete<S>(connection: &mut Connection<S>)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    connection.finish().await;
    debug!("Parcel collection completed");
}
