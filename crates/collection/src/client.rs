use std::sync::Arc;

use courier_handshake::perform_handshake;
use courier_net_ws::TcpTransport;
use courier_signer::{NonceSigner, SignerSet};
use futures::{StreamExt, stream::BoxStream};
use tracing::debug;

use crate::{
    CollectionConfig, CollectionError, ParcelCollection, StreamingMode,
    lifecycle::{self, SessionFailure},
    metrics::CollectionMetrics,
    session::StreamingSession,
};

/// Lazily produced parcels of one collection session.
///
/// The session ends when the stream yields `None` or an error. Dropping the
/// stream earlier closes the connection normally.
pub type ParcelCollectionStream = BoxStream<'static, Result<ParcelCollection, CollectionError>>;

/// Client for a parcel collection endpoint.
#[derive(Debug, Clone)]
pub struct ParcelCollectionClient {
    endpoint: String,
    max_message_size: usize,
    metrics: CollectionMetrics,
}

impl ParcelCollectionClient {
    pub fn new(config: &impl CollectionConfig) -> Self {
        Self {
            endpoint: config.endpoint().to_owned(),
            max_message_size: config.max_message_size(),
            metrics: CollectionMetrics::default(),
        }
    }

    /// Starts a collection session authenticated by `signers`.
    ///
    /// Fails right away if `signers` is empty. Otherwise nothing happens until
    /// the returned stream is first polled: the connection is opened and the
    /// handshake performed then, and each later poll reads at most one
    /// message from the server.
    pub fn collect_parcels(
        &self,
        signers: Vec<Arc<dyn NonceSigner>>,
        mode: StreamingMode,
    ) -> Result<ParcelCollectionStream, CollectionError> {
        let signers = SignerSet::new(signers)?;
        let pending = PendingSession {
            endpoint: self.endpoint.clone(),
            max_message_size: self.max_message_size,
            signers,
            mode,
            metrics: self.metrics.clone(),
        };

        Ok(futures::stream::unfold(SessionState::Pending(pending), advance).boxed())
    }
}

struct PendingSession {
    endpoint: String,
    max_message_size: usize,
    signers: SignerSet,
    mode: StreamingMode,
    metrics: CollectionMetrics,
}

enum SessionState {
    Pending(PendingSession),
    Streaming(StreamingSession<TcpTransport>),
    Done,
}

async fn advance(
    state: SessionState,
) -> Option<(Result<ParcelCollection, CollectionError>, SessionState)> {
    let mut session = match state {
        SessionState::Pending(pending) => match start(pending).await {
            Ok(session) => session,
            Err(error) => return Some((Err(error), SessionState::Done)),
        },
        SessionState::Streaming(session) => session,
        SessionState::Done => return None,
    };

    match session.next().await {
        Some(Ok(parcel)) => Some((Ok(parcel), SessionState::Streaming(session))),
        Some(Err(error)) => Some((Err(error), SessionState::Done)),
        None => None,
    }
}

/// Connects and authenticates, yielding a session ready to stream parcels.
async fn start(pending: PendingSession) -> Result<StreamingSession<TcpTransport>, CollectionError> {
    let PendingSession {
        endpoint,
        max_message_size,
        signers,
        mode,
        metrics,
    } = pending;

    metrics.inc_sessions();
    let mut connection = match lifecycle::open(&endpoint, mode).await {
        Ok(connection) => connection,
        Err(error) => {
            metrics.inc_session_failures();
            return Err(error);
        }
    };

    if let Err(error) = perform_handshake(&mut connection, &signers).await {
        return Err(lifecycle::fail(&mut connection, SessionFailure::Handshake(error), &metrics).await);
    }
    debug!(%endpoint, signers = signers.len(), "Parcel collection session authenticated");

    Ok(StreamingSession::new(connection, max_message_size, metrics))
}
