#![allow(dead_code)]

use std::sync::Arc;

use bytes::Bytes;
use courier_collection::{
    CollectionArgs, DEFAULT_MAX_MESSAGE_SIZE, DeliveryCodec, ParcelCollectionClient,
    ParcelDelivery,
};
use courier_signer::{LocalNonceSigner, NonceSigner};
use courier_test_utils::MockServer;

pub fn client(server: &MockServer) -> ParcelCollectionClient {
    ParcelCollectionClient::new(&CollectionArgs {
        endpoint: server.endpoint().to_owned(),
        ..Default::default()
    })
}

pub fn signer() -> Vec<Arc<dyn NonceSigner>> {
    vec![Arc::new(LocalNonceSigner::random())]
}

/// Local signers together with the same signers as the client takes them.
pub fn signers(count: usize) -> (Vec<Arc<LocalNonceSigner>>, Vec<Arc<dyn NonceSigner>>) {
    let locals: Vec<_> = (0..count)
        .map(|_| Arc::new(LocalNonceSigner::random()))
        .collect();
    let dyns = locals
        .iter()
        .map(|signer| Arc::clone(signer) as Arc<dyn NonceSigner>)
        .collect();
    (locals, dyns)
}

pub fn delivery(delivery_id: &str, parcel: &[u8]) -> Bytes {
    DeliveryCodec::new(DEFAULT_MAX_MESSAGE_SIZE)
        .encode(ParcelDelivery::new(delivery_id, parcel.to_vec()).unwrap())
        .unwrap()
}
