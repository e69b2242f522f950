use bytes::Bytes;
use courier_net_codec::{CodecError, ProtocolCodec, Tagged};

use crate::proto::collection as proto;

/// Largest parcel delivery accepted by default.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;

/// Codec for parcels pushed by the server.
pub type DeliveryCodec = ProtocolCodec<proto::ParcelDelivery, ParcelDelivery, CodecError>;

impl Tagged for proto::ParcelDelivery {
    const TAG: u8 = 3;
}

/// A parcel as pushed by the server, before it is handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParcelDelivery {
    delivery_id: String,
    parcel: Bytes,
}

impl ParcelDelivery {
    /// Fails if `delivery_id` is empty, as such a delivery could never be
    /// acknowledged.
    pub fn new(delivery_id: impl Into<String>, parcel: impl Into<Bytes>) -> Result<Self, CodecError> {
        let delivery_id = delivery_id.into();
        if delivery_id.is_empty() {
            return Err(CodecError::MissingField("delivery_id"));
        }
        Ok(Self {
            delivery_id,
            parcel: parcel.into(),
        })
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    pub fn parcel(&self) -> &Bytes {
        &self.parcel
    }

    pub fn into_parts(self) -> (String, Bytes) {
        (self.delivery_id, self.parcel)
    }
}

impl TryFrom<proto::ParcelDelivery> for ParcelDelivery {
    type Error = CodecError;

    fn try_from(value: proto::ParcelDelivery) -> Result<Self, Self::Error> {
        Self::new(value.delivery_id, value.parcel)
    }
}

impl From<ParcelDelivery> for proto::ParcelDelivery {
    fn from(delivery: ParcelDelivery) -> Self {
        Self {
            delivery_id: delivery.delivery_id,
            parcel: delivery.parcel.to_vec(),
        }
    }
}
