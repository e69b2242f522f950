use std::{fmt, sync::Arc};

use bytes::Bytes;
use tracing::debug;

use crate::{NonceSignature, NonceSigner, SignerError};

/// The ordered, non-empty list of signers authenticating one session.
#[derive(Clone)]
pub struct SignerSet {
    signers: Arc<[Arc<dyn NonceSigner>]>,
}

impl SignerSet {
    /// Fails with [`SignerError::Empty`] if `signers` is empty.
    pub fn new(signers: Vec<Arc<dyn NonceSigner>>) -> Result<Self, SignerError> {
        if signers.is_empty() {
            return Err(SignerError::Empty);
        }
        Ok(Self {
            signers: signers.into(),
        })
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Signs `nonce` with every signer, in order.
    ///
    /// The i-th signature belongs to the i-th signer. The first signer
    /// failure aborts the whole operation.
    pub fn sign(&self, nonce: &Bytes) -> Result<Vec<NonceSignature>, SignerError> {
        let signatures = self
            .signers
            .iter()
            .map(|signer| {
                let signature = signer.sign(nonce)?;
                Ok(NonceSignature::new(
                    nonce.clone(),
                    signer.certificate().clone(),
                    signature,
                ))
            })
            .collect::<Result<Vec<_>, SignerError>>()?;
        debug!(signers = signatures.len(), "Signed handshake nonce");
        Ok(signatures)
    }
}

impl fmt::Debug for SignerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.signers.iter().map(|signer| signer.certificate()))
            .finish()
    }
}
