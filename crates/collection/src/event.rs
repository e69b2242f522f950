use std::{collections::HashSet, fmt, sync::Arc};

use bytes::Bytes;
use courier_net_ws::{ConnectionWriter, TcpTransport, TransportError};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

use crate::{CollectionError, metrics::CollectionMetrics};

/// A parcel received during a collection session.
///
/// Call [`ParcelCollection::ack`] once the parcel has been safely stored, so
/// the server does not deliver it again. Dropping the event without
/// acknowledging it is allowed.
pub struct ParcelCollection<S = TcpTransport> {
    delivery_id: String,
    parcel: Bytes,
    acks: Arc<Acknowledgements<S>>,
}

impl<S> ParcelCollection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(delivery_id: String, parcel: Bytes, acks: Arc<Acknowledgements<S>>) -> Self {
        Self {
            delivery_id,
            parcel,
            acks,
        }
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    pub fn parcel(&self) -> &Bytes {
        &self.parcel
    }

    /// Acknowledges the delivery to the server.
    ///
    /// Only the first call sends an acknowledgement; later calls for the same
    /// delivery return `Ok(())` without sending anything. Fails if the session
    /// is already closed.
    pub async fn ack(&self) -> Result<(), CollectionError> {
        self.acks.acknowledge(&self.delivery_id).await
    }
}

impl<S> fmt::Debug for ParcelCollection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParcelCollection")
            .field("delivery_id", &self.delivery_id)
            .field("parcel_len", &self.parcel.len())
            .finish_non_exhaustive()
    }
}

/// Delivery ids acknowledged in one session, and the writer acks go out on.
pub(crate) struct Acknowledgements<S> {
    writer: ConnectionWriter<S>,
    acknowledged: Mutex<HashSet<String>>,
    metrics: CollectionMetrics,
}

impl<S> Acknowledgements<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub(crate) fn new(writer: ConnectionWriter<S>, metrics: CollectionMetrics) -> Self {
        Self {
            writer,
            acknowledged: Mutex::new(HashSet::new()),
            metrics,
        }
    }

    async fn acknowledge(&self, delivery_id: &str) -> Result<(), CollectionError> {
        if !self.reserve(delivery_id) {
            trace!(delivery_id, "Delivery already acknowledged");
            return Ok(());
        }

        match self.writer.send_text(delivery_id).await {
            Ok(()) => {
                debug!(delivery_id, "Acknowledged delivery");
                self.metrics.inc_acks_sent();
                Ok(())
            }
            Err(error) => {
                self.release(delivery_id);
                let message = match &error {
                    TransportError::Closed => "Cannot acknowledge delivery after the connection closed",
                    _ => "Failed to acknowledge delivery",
                };
                Err(CollectionError::server_connection(message, error))
            }
        }
    }

    /// Returns `false` if `delivery_id` was acknowledged already.
    fn reserve(&self, delivery_id: &str) -> bool {
        self.acknowledged.lock().insert(delivery_id.to_owned())
    }

    fn release(&self, delivery_id: &str) {
        self.acknowledged.lock().remove(delivery_id);
    }
}
