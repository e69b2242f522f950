//! Parcel collection client.
//!
//! [`ParcelCollectionClient::collect_parcels`] opens a WebSocket session with
//! the configured endpoint, authenticates with the given nonce signers and
//! yields the parcels the server pushes as a [`ParcelCollectionStream`].
//! Each parcel can be acknowledged once, telling the server it need not be
//! delivered again.
//!
//! ```no_run
//! # async fn run() -> Result<(), courier_collection::CollectionError> {
//! use std::sync::Arc;
//!
//! use courier_collection::{CollectionArgs, ParcelCollectionClient, StreamingMode};
//! use courier_signer::LocalNonceSigner;
//! use futures::TryStreamExt;
//!
//! let client = ParcelCollectionClient::new(&CollectionArgs::default());
//! let mut parcels =
//!     client.collect_parcels(vec![Arc::new(LocalNonceSigner::random())], StreamingMode::CloseUponCompletion)?;
//! while let Some(collection) = parcels.try_next().await? {
//!     // Store the parcel before acknowledging it.
//!     collection.ack().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod proto {
    include!(concat!(env!("OUT_DIR"), "/proto/mod.rs"));
}

mod args;
pub use args::{CollectionArgs, DEFAULT_ENDPOINT};
mod client;
pub use client::{ParcelCollectionClient, ParcelCollectionStream};
mod delivery;
pub use delivery::{DEFAULT_MAX_MESSAGE_SIZE, DeliveryCodec, ParcelDelivery};
mod error;
pub use error::CollectionError;
mod event;
pub use event::ParcelCollection;
mod lifecycle;
mod metrics;
mod mode;
pub use mode::{STREAMING_MODE_HEADER, StreamingMode};
mod session;

/// Configuration consumed by [`ParcelCollectionClient`].
///
/// Lets the client stay independent of how the configuration is loaded.
pub trait CollectionConfig: Send + Sync + 'static {
    /// WebSocket URL of the parcel collection endpoint.
    fn endpoint(&self) -> &str;

    /// Largest parcel delivery accepted from the server, in bytes.
    fn max_message_size(&self) -> usize;
}
