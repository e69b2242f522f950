//! Handshake of the parcel collection protocol.
//!
//! The server opens every session with a [`Challenge`] carrying a nonce. The
//! client signs the nonce with each of its nonce signers and answers with a
//! single [`Response`]. No parcel is delivered before the response is sent.

pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/proto/mod.rs"));
}
mod error;
pub use error::HandshakeError;
mod protocol;
pub use protocol::perform_handshake;
mod codec;
pub use codec::*;

/// Largest challenge accepted from a server.
pub const MAX_CHALLENGE_SIZE: usize = 64 * 1024;
