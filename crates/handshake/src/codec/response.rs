use bytes::Bytes;
use courier_signer::{Certificate, NonceSignature};

use crate::{codec::CodecError, proto::handshake as proto};

/// The client's answer to a [`Challenge`](crate::Challenge): one signature
/// per signer, in signer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    nonce_signatures: Vec<NonceSignature>,
}

impl Response {
    pub fn new(nonce_signatures: Vec<NonceSignature>) -> Self {
        Self { nonce_signatures }
    }

    pub fn nonce_signatures(&self) -> &[NonceSignature] {
        &self.nonce_signatures
    }
}

/// Convert from protobuf NonceSignature, requiring every field to be set.
pub fn nonce_signature_from_proto(
    value: proto::NonceSignature,
) -> Result<NonceSignature, CodecError> {
    if value.nonce.is_empty() {
        return Err(CodecError::MissingField("nonce"));
    }
    if value.signer_certificate.is_empty() {
        return Err(CodecError::MissingField("signer_certificate"));
    }
    if value.signature.is_empty() {
        return Err(CodecError::MissingField("signature"));
    }

    Ok(NonceSignature::new(
        Bytes::from(value.nonce),
        Certificate::new(value.signer_certificate),
        Bytes::from(value.signature),
    ))
}

impl From<NonceSignature> for proto::NonceSignature {
    fn from(signature: NonceSignature) -> Self {
        let (nonce, certificate, signature) = signature.into_parts();
        Self {
            nonce: nonce.to_vec(),
            signer_certificate: certificate.as_bytes().to_vec(),
            signature: signature.to_vec(),
        }
    }
}

impl TryFrom<proto::HandshakeResponse> for Response {
    type Error = CodecError;

    fn try_from(value: proto::HandshakeResponse) -> Result<Self, Self::Error> {
        let nonce_signatures = value
            .nonce_signatures
            .into_iter()
            .map(nonce_signature_from_proto)
            .collect::<Result<_, _>>()?;
        Ok(Self { nonce_signatures })
    }
}

impl From<Response> for proto::HandshakeResponse {
    fn from(response: Response) -> Self {
        Self {
            nonce_signatures: response
                .nonce_signatures
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}
