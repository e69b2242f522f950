//! WebSocket transport for courier sessions.
//!
//! A [`Connection`] owns one WebSocket for the lifetime of a session. Reads
//! happen through the connection itself, while writes go through a cloneable
//! [`ConnectionWriter`] so that acknowledgements can be sent while the
//! session is waiting for the next inbound message.
//!
//! The connection is closed at most once: the first close wins and every
//! later attempt is a no-op. Dropping a connection that is still open closes
//! it with a normal close code from a background task. Waiting for the peer to
//! finish a closing handshake is bounded by [`CLOSE_TIMEOUT`].

mod connection;
mod error;
mod message;
mod state;

pub use connection::{CLOSE_TIMEOUT, Connection, ConnectionWriter, TcpConnection, TcpTransport};
pub use error::TransportError;
pub use message::{Closure, Inbound};
pub use state::ConnectionState;

pub use tokio_tungstenite::tungstenite::protocol::{WebSocketConfig, frame::coding::CloseCode};
