use std::fmt;

use bytes::Bytes;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, frame::coding::CloseCode};

/// A message received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Binary(Bytes),
    Text(String),
    /// A text frame whose payload is not valid UTF-8.
    InvalidText,
    /// The peer started the closing handshake.
    Closed(Closure),
}

/// Code and reason of a closing handshake.
///
/// A close frame without a body is reported with [`CloseCode::Status`]
/// (1005, "no status received").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closure {
    pub code: CloseCode,
    pub reason: String,
}

impl Closure {
    pub fn new(code: CloseCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Whether the peer finished the session on purpose.
    pub fn is_normal(&self) -> bool {
        matches!(self.code, CloseCode::Normal | CloseCode::Status)
    }
}

impl From<Option<CloseFrame>> for Closure {
    fn from(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self::new(frame.code, frame.reason.to_string()),
            None => Self::new(CloseCode::Status, String::new()),
        }
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code: {}, reason: {}", self.code, self.reason)
    }
}

/// Reported as the cause of failures triggered by the peer closing.
impl std::error::Error for Closure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_close_frame_is_normal() {
        let closure = Closure::from(None);
        assert_eq!(closure.code, CloseCode::Status);
        assert!(closure.is_normal());
    }

    #[test]
    fn test_error_close_code_is_not_normal() {
        let closure = Closure::from(Some(CloseFrame {
            code: CloseCode::Error,
            reason: "boom".to_owned().into(),
        }));
        assert!(!closure.is_normal());
        assert_eq!(closure.to_string(), "code: 1011, reason: boom");
    }
}
