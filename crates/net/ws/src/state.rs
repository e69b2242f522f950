/// Lifecycle of a session's connection.
///
/// States only move forward. A state may be skipped (a failed handshake
/// goes straight from `Handshaking` to `Closing`) but is never revisited.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Connecting,
    Handshaking,
    Streaming,
    Closing,
    Closed,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        *self < Self::Closing
    }
}
