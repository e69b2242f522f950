use std::fmt;

use alloy_primitives::{Address, hex};
use bytes::Bytes;

/// Opaque bytes identifying a nonce signer to the server.
///
/// The server decides how to interpret them. Certificates of
/// [`LocalNonceSigner`](crate::LocalNonceSigner) are the 20-byte account
/// address of the signing key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Certificate(Bytes);

impl Certificate {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<Address> for Certificate {
    fn from(address: Address) -> Self {
        Self(Bytes::copy_from_slice(address.as_slice()))
    }
}

impl From<Bytes> for Certificate {
    fn from(bytes: Bytes) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Certificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl<'a> arbitrary::Arbitrary<'a> for Certificate {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        // Never empty, so that arbitrary certificates survive decoding.
        let len = u.int_in_range(1..=64)?;
        let bytes = (0..len)
            .map(|_| u.arbitrary())
            .collect::<arbitrary::Result<Vec<u8>>>()?;
        Ok(Self::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_certificate_is_twenty_bytes() {
        let address = Address::repeat_byte(0xab);
        let certificate = Certificate::from(address);

        assert_eq!(certificate.as_bytes(), address.as_slice());
        assert_eq!(certificate.to_string(), format!("0x{}", "ab".repeat(20)));
    }
}
