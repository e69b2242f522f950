//! Nonce signers for parcel collection.
//!
//! A client authenticates a collection session by signing the nonce the
//! server sends in its handshake challenge with one or more signers. Each
//! signer is identified to the server by an opaque [`Certificate`].

use auto_impl::auto_impl;
use bytes::Bytes;

mod certificate;
pub use certificate::Certificate;
mod error;
pub use error::SignerError;
mod local;
pub use local::LocalNonceSigner;
mod set;
pub use set::SignerSet;
mod signature;
pub use signature::NonceSignature;

/// Capability to sign handshake nonces.
///
/// Implementations must be usable from any thread; a signer may be shared by
/// several sessions at once.
#[auto_impl(&, Arc, Box)]
pub trait NonceSigner: Send + Sync {
    /// Identifies this signer to the server.
    fn certificate(&self) -> &Certificate;

    /// Returns the signature of `nonce`.
    fn sign(&self, nonce: &[u8]) -> Result<Bytes, SignerError>;
}
