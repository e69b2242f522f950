use std::sync::Arc;

use courier_net_codec::CodecError;
use courier_net_ws::{Connection, Inbound};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use crate::{
    CollectionError, DeliveryCodec, ParcelCollection,
    event::Acknowledgements,
    lifecycle::{self, SessionFailure},
    metrics::CollectionMetrics,
};

/// Turns the inbound messages of an authenticated connection into parcels.
pub(crate) struct StreamingSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    connection: Connection<S>,
    codec: DeliveryCodec,
    acks: Arc<Acknowledgements<S>>,
    metrics: CollectionMetrics,
}

impl<S> StreamingSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub(crate) fn new(
        connection: Connection<S>,
        max_message_size: usize,
        metrics: CollectionMetrics,
    ) -> Self {
        let acks = Arc::new(Acknowledgements::new(connection.writer(), metrics.clone()));
        Self {
            connection,
            codec: DeliveryCodec::new(max_message_size),
            acks,
            metrics,
        }
    }

    /// Reads the next inbound message.
    ///
    /// Returns `None` once the server has closed the session normally. An
    /// error ends the session as well; either way the connection has been
    /// finalized by the time this returns anything but a parcel.
    pub(crate) async fn next(&mut self) -> Option<Result<ParcelCollection<S>, CollectionError>> {
        let failure = match self.connection.receive().await {
            Ok(Inbound::Binary(payload)) => match self.codec.decode(&payload) {
                Ok(delivery) => {
                    let (delivery_id, parcel) = delivery.into_parts();
                    debug!(%delivery_id, size = parcel.len(), "Received parcel");
                    self.metrics.inc_parcels_received();
                    return Some(Ok(ParcelCollection::new(
                        delivery_id,
                        parcel,
                        Arc::clone(&self.acks),
                    )));
                }
                Err(error) => SessionFailure::InvalidDelivery(error),
            },
            Ok(Inbound::Text(_) | Inbound::InvalidText) => {
                SessionFailure::InvalidDelivery(CodecError::UnexpectedText)
            }
            Ok(Inbound::Closed(closure)) if closure.is_normal() => {
                trace!(%closure, "Server completed the session");
                lifecycle::complete(&mut self.connection).await;
                return None;
            }
            Ok(Inbound::Closed(closure)) => SessionFailure::UnexpectedClosure(closure),
            Err(error) => SessionFailure::ConnectionLost(error),
        };

        Some(Err(
            lifecycle::fail(&mut self.connection, failure, &self.metrics).await,
        ))
    }
}
