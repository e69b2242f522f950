use bytes::Bytes;

use crate::Certificate;

/// A signer's signature over a handshake nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceSignature {
    nonce: Bytes,
    signer_certificate: Certificate,
    signature: Bytes,
}

impl NonceSignature {
    pub fn new(nonce: Bytes, signer_certificate: Certificate, signature: Bytes) -> Self {
        Self {
            nonce,
            signer_certificate,
            signature,
        }
    }

    pub fn nonce(&self) -> &Bytes {
        &self.nonce
    }

    pub fn signer_certificate(&self) -> &Certificate {
        &self.signer_certificate
    }

    pub fn signature(&self) -> &Bytes {
        &self.signature
    }

    pub fn into_parts(self) -> (Bytes, Certificate, Bytes) {
        (self.nonce, self.signer_certificate, self.signature)
    }
}

impl<'a> arbitrary::Arbitrary<'a> for NonceSignature {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let nonce_len = u.int_in_range(1..=64)?;
        let nonce = (0..nonce_len)
            .map(|_| u.arbitrary())
            .collect::<arbitrary::Result<Vec<u8>>>()?;
        let signer_certificate = Certificate::arbitrary(u)?;
        let signature: [u8; 65] = u.arbitrary()?;

        Ok(Self {
            nonce: nonce.into(),
            signer_certificate,
            signature: Bytes::copy_from_slice(&signature),
        })
    }
}
