use courier_net_codec::{ProtocolCodec, Tagged};

mod challenge;
mod response;
pub use challenge::Challenge;
pub use courier_net_codec::CodecError;
pub use response::{Response, nonce_signature_from_proto};

use crate::proto::handshake::{HandshakeChallenge, HandshakeResponse};

impl Tagged for HandshakeChallenge {
    const TAG: u8 = 1;
}

impl Tagged for HandshakeResponse {
    const TAG: u8 = 2;
}

/// Codec for the challenge the server opens the handshake with.
pub type ChallengeCodec = ProtocolCodec<HandshakeChallenge, Challenge, CodecError>;

/// Codec for the client's signed response.
pub type ResponseCodec = ProtocolCodec<HandshakeResponse, Response, CodecError>;
