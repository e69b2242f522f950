use courier_net_codec::CodecError;
use courier_signer::SignerError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum CollectionError {
    /// No signer was given, or a signer failed to sign the handshake nonce.
    #[error(transparent)]
    NonceSigner(#[from] SignerError),

    /// The server could not be reached or the connection ended abnormally.
    #[error("{message}")]
    ServerConnection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The server sent a message that violates the protocol.
    #[error("{message}")]
    InvalidServerMessage {
        message: String,
        #[source]
        source: CodecError,
    },
}

impl CollectionError {
    pub(crate) fn server_connection(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ServerConnection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn invalid_server_message(message: impl Into<String>, source: CodecError) -> Self {
        Self::InvalidServerMessage {
            message: message.into(),
            source,
        }
    }
}
