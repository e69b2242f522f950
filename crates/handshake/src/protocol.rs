use courier_net_ws::{Connection, ConnectionState, Inbound};
use courier_signer::SignerSet;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::{
    Challenge, ChallengeCodec, CodecError, HandshakeError, MAX_CHALLENGE_SIZE, Response,
    ResponseCodec,
};

/// Authenticates the client on a freshly opened connection.
///
/// Waits for the server's challenge, signs its nonce with every signer in
/// `signers` and sends back a single response. On success the connection is
/// in [`ConnectionState::Streaming`]. The connection is left open on
/// failure; closing it is up to the caller.
pub async fn perform_handshake<S>(
    connection: &mut Connection<S>,
    signers: &SignerSet,
) -> Result<(), HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    connection.advance(ConnectionState::Handshaking);

    let challenge = receive_challenge(connection).await?;
    debug!(nonce_len = challenge.nonce().len(), "Received handshake challenge");

    let response = Response::new(signers.sign(challenge.nonce())?);
    let payload = ResponseCodec::new(usize::MAX)
        .encode(response)
        .map_err(HandshakeError::Encode)?;
    connection
        .send_binary(payload)
        .await
        .map_err(HandshakeError::Send)?;
    debug!(signatures = signers.len(), "Sent handshake response");

    connection.advance(ConnectionState::Streaming);
    Ok(())
}

async fn receive_challenge<S>(connection: &mut Connection<S>) -> Result<Challenge, HandshakeError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    match connection.receive().await {
        Ok(Inbound::Binary(payload)) => ChallengeCodec::new(MAX_CHALLENGE_SIZE)
            .decode(&payload)
            .map_err(HandshakeError::InvalidChallenge),
        Ok(Inbound::Text(_) | Inbound::InvalidText) => {
            Err(HandshakeError::InvalidChallenge(CodecError::UnexpectedText))
        }
        Ok(Inbound::Closed(closure)) => Err(HandshakeError::Closed(closure)),
        Err(error) => Err(HandshakeError::Disconnected(error)),
    }
}
