/// Request header announcing the streaming mode of a session.
pub const STREAMING_MODE_HEADER: &str = "x-relaynet-streaming-mode";

/// What the server does once it has delivered every parcel it holds.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum StreamingMode {
    /// Keep the session open and push parcels as they arrive.
    #[default]
    KeepAlive,
    /// Close the session after the last queued parcel.
    CloseUponCompletion,
}

impl StreamingMode {
    /// Value sent in the [`STREAMING_MODE_HEADER`] request header.
    pub fn header_value(&self) -> &'static str {
        match self {
            Self::KeepAlive => "keep-alive",
            Self::CloseUponCompletion => "close-upon-completion",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_default_is_keep_alive() {
        assert_eq!(StreamingMode::default(), StreamingMode::KeepAlive);
        assert_eq!(StreamingMode::default().header_value(), "keep-alive");
    }

    #[test]
    fn test_header_value_matches_display() {
        for mode in [StreamingMode::KeepAlive, StreamingMode::CloseUponCompletion] {
            assert_eq!(mode.to_string(), mode.header_value());
            assert_eq!(StreamingMode::from_str(mode.header_value()).unwrap(), mode);
        }
    }
}
