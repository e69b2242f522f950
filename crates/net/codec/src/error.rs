use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Empty message")]
    Empty,

    #[error("Message of {actual} bytes exceeds the limit of {limit} bytes")]
    MessageTooLarge { limit: usize, actual: usize },

    #[error("Unexpected message tag: expected {expected}, received {actual}")]
    UnexpectedTag { expected: u8, actual: u8 },

    #[error("Unexpected text message")]
    UnexpectedText,

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Protobuf error: {0}")]
    Protobuf(#[from] quick_protobuf::Error),
}
