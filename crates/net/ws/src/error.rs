use thiserror::Error;
use tokio_tungstenite::tungstenite::{self, http::header::InvalidHeaderValue};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Invalid value for header {name}")]
    InvalidHeader {
        name: &'static str,
        #[source]
        source: InvalidHeaderValue,
    },

    #[error("Connection closed")]
    Closed,
}
