use bytes::Bytes;

use crate::{codec::CodecError, proto::handshake as proto};

/// Nonce the server asks the client to sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    nonce: Bytes,
}

impl Challenge {
    /// Fails if `nonce` is empty.
    pub fn new(nonce: impl Into<Bytes>) -> Result<Self, CodecError> {
        let nonce = nonce.into();
        if nonce.is_empty() {
            return Err(CodecError::MissingField("nonce"));
        }
        Ok(Self { nonce })
    }

    pub fn nonce(&self) -> &Bytes {
        &self.nonce
    }
}

impl TryFrom<proto::HandshakeChallenge> for Challenge {
    type Error = CodecError;

    fn try_from(value: proto::HandshakeChallenge) -> Result<Self, Self::Error> {
        Self::new(value.nonce)
    }
}

impl From<Challenge> for proto::HandshakeChallenge {
    fn from(challenge: Challenge) -> Self {
        Self {
            nonce: challenge.nonce.to_vec(),
        }
    }
}
