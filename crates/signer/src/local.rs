use alloy_primitives::{Address, Signature};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use bytes::Bytes;
use tracing::trace;

use crate::{Certificate, NonceSignature, NonceSigner, SignerError};

/// Signs nonces with an in-memory secp256k1 key.
///
/// Nonces are signed as EIP-191 personal messages, producing 65-byte
/// `r || s || v` signatures. The certificate is the account address of the
/// key, so a signature can be checked with [`LocalNonceSigner::verify`]
/// without any other material.
#[derive(Debug, Clone)]
pub struct LocalNonceSigner {
    signer: PrivateKeySigner,
    certificate: Certificate,
}

impl LocalNonceSigner {
    pub fn new(signer: PrivateKeySigner) -> Self {
        let certificate = Certificate::from(signer.address());
        Self {
            signer,
            certificate,
        }
    }

    /// Creates a signer with a freshly generated key.
    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Checks that `signature` was produced over its nonce by the key whose
    /// address is its certificate.
    pub fn verify(signature: &NonceSignature) -> bool {
        let raw: &[u8] = signature.signature();
        let Ok(parsed) = Signature::try_from(raw) else {
            return false;
        };
        match parsed.recover_address_from_msg(signature.nonce()) {
            Ok(address) => address.as_slice() == signature.signer_certificate().as_bytes(),
            Err(_) => false,
        }
    }
}

impl From<PrivateKeySigner> for LocalNonceSigner {
    fn from(signer: PrivateKeySigner) -> Self {
        Self::new(signer)
    }
}

impl NonceSigner for LocalNonceSigner {
    fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    fn sign(&self, nonce: &[u8]) -> Result<Bytes, SignerError> {
        let signature = self
            .signer
            .sign_message_sync(nonce)
            .map_err(|e| SignerError::signing(&self.certificate, e))?;
        trace!(signer = %self.certificate, "Signed nonce");
        Ok(Bytes::copy_from_slice(&signature.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_certificate_is_address() {
        let signer = LocalNonceSigner::random();
        assert_eq!(signer.certificate().as_bytes(), signer.address().as_slice());
    }

    #[test]
    fn test_signature_is_65_bytes() {
        let signer = LocalNonceSigner::random();
        let signature = signer.sign(b"nonce").unwrap();
        assert_eq!(signature.len(), 65);
    }

    #[test]
    fn test_verify_rejects_other_signer_certificate() {
        let signer = LocalNonceSigner::random();
        let other = LocalNonceSigner::random();
        let nonce = Bytes::from_static(b"nonce");

        let signature = signer.sign(&nonce).unwrap();
        let forged = NonceSignature::new(nonce, other.certificate().clone(), signature);
        assert!(!LocalNonceSigner::verify(&forged));
    }

    #[test]
    fn test_verify_rejects_garbage_signature() {
        let signer = LocalNonceSigner::random();
        let garbage = NonceSignature::new(
            Bytes::from_static(b"nonce"),
            signer.certificate().clone(),
            Bytes::from_static(&[0u8; 12]),
        );
        assert!(!LocalNonceSigner::verify(&garbage));
    }

    proptest! {
        #[test]
        fn test_signature_verifies_over_any_nonce(nonce in proptest::collection::vec(any::<u8>(), 1..128)) {
            let signer = LocalNonceSigner::random();
            let nonce = Bytes::from(nonce);
            let signature = signer.sign(&nonce).unwrap();

            let signed = NonceSignature::new(nonce.clone(), signer.certificate().clone(), signature);
            prop_assert!(LocalNonceSigner::verify(&signed));

            let mut tampered = nonce.to_vec();
            tampered.push(0);
            let (_, certificate, signature) = signed.into_parts();
            let tampered = NonceSignature::new(tampered.into(), certificate, signature);
            prop_assert!(!LocalNonceSigner::verify(&tampered));
        }
    }
}
