//! Parcel collection metrics

use metrics::Counter;

/// Parcel collection metrics
#[derive(Clone, Debug)]
pub(crate) struct CollectionMetrics {
    /// Number of sessions started
    sessions_total: Counter,
    /// Number of sessions that ended with an error
    session_failures_total: Counter,
    /// Number of parcels yielded to the caller
    parcels_received_total: Counter,
    /// Number of acknowledgements sent to the server
    acks_sent_total: Counter,
}

impl Default for CollectionMetrics {
    fn default() -> Self {
        Self {
            sessions_total: metrics::counter!("courier.collection.sessions_total"),
            session_failures_total: metrics::counter!(
                "courier.collection.session_failures_total"
            ),
            parcels_received_total: metrics::counter!(
                "courier.collection.parcels_received_total"
            ),
            acks_sent_total: metrics::counter!("courier.collection.acks_sent_total"),
        }
    }
}

impl CollectionMetrics {
    pub(crate) fn inc_sessions(&self) {
        self.sessions_total.increment(1);
    }

    pub(crate) fn inc_session_failures(&self) {
        self.session_failures_total.increment(1);
    }

    pub(crate) fn inc_parcels_received(&self) {
        self.parcels_received_total.increment(1);
    }

    pub(crate) fn inc_acks_sent(&self) {
        self.acks_sent_total.increment(1);
    }
}
