use courier_net_codec::CodecError;
use courier_net_ws::{Closure, TransportError};
use courier_signer::SignerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("Server closed the connection during the handshake")]
    Closed(#[source] Closure),

    #[error("Server closed the connection during the handshake")]
    Disconnected(#[source] TransportError),

    #[error("Server sent an invalid handshake challenge")]
    InvalidChallenge(#[source] CodecError),

    #[error("Failed to encode handshake response")]
    Encode(#[source] CodecError),

    #[error("Failed to send handshake response")]
    Send(#[source] TransportError),

    #[error(transparent)]
    Signer(#[from] SignerError),
}
