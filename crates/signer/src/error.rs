use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("At least one nonce signer must be specified")]
    Empty,

    #[error("Failed to sign nonce with signer {certificate}")]
    Signing {
        certificate: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SignerError {
    /// Wraps a failure reported by the signer holding `certificate`.
    pub fn signing(
        certificate: impl ToString,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Signing {
            certificate: certificate.to_string(),
            source: source.into(),
        }
    }
}
