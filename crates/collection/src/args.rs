//! Parcel collection CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::{CollectionConfig, DEFAULT_MAX_MESSAGE_SIZE};

/// Endpoint used when none is configured.
pub const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:276/v1/parcel-collection";

/// Parcel collection configuration.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[command(next_help_heading = "Parcel collection")]
pub struct CollectionArgs {
    /// WebSocket URL of the parcel collection endpoint.
    #[arg(long = "collection.endpoint", value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Largest parcel delivery accepted from the server, in bytes.
    #[arg(
        long = "collection.max-message-size",
        value_name = "BYTES",
        default_value_t = DEFAULT_MAX_MESSAGE_SIZE
    )]
    pub max_message_size: usize,
}

impl Default for CollectionArgs {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl CollectionConfig for CollectionArgs {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        collection: CollectionArgs,
    }

    #[test]
    fn test_cli_defaults() {
        let cli = TestCli::try_parse_from(["courier"]).unwrap();
        assert_eq!(cli.collection, CollectionArgs::default());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = TestCli::try_parse_from([
            "courier",
            "--collection.endpoint",
            "wss://gateway.example/v1/parcel-collection",
            "--collection.max-message-size",
            "1024",
        ])
        .unwrap();
        assert_eq!(cli.collection.endpoint, "wss://gateway.example/v1/parcel-collection");
        assert_eq!(cli.collection.max_message_size, 1024);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let args: CollectionArgs = toml::from_str(r#"endpoint = "ws://10.0.0.1:276/v1/parcel-collection""#).unwrap();
        assert_eq!(args.endpoint, "ws://10.0.0.1:276/v1/parcel-collection");
        assert_eq!(args.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
    }
}
