//! Message codec shared by the courier wire protocols.
//!
//! Every binary message on the wire is a single tag byte identifying the
//! message type, followed by the protobuf encoding of that message. The tag
//! lets the receiving side reject a well-formed message of the wrong type,
//! which plain protobuf decoding would otherwise accept.

use std::{fmt, marker::PhantomData};

use bytes::Bytes;
use quick_protobuf::{BytesReader, BytesWriter, MessageRead, MessageWrite, Writer};

mod error;
pub use error::CodecError;

/// A protobuf message type with a fixed wire tag.
pub trait Tagged {
    /// Tag byte written in front of the protobuf body.
    const TAG: u8;
}

/// Converts between a domain type `Protocol` and its protobuf form `Proto`.
///
/// Decoding validates the tag and the size limit before parsing, then runs
/// the domain conversion (`TryFrom<Proto>`), so domain invariants such as
/// required fields are enforced at the codec boundary.
pub struct ProtocolCodec<Proto, Protocol, E> {
    max_message_size: usize,
    _marker: PhantomData<fn() -> (Proto, Protocol, E)>,
}

impl<Proto, Protocol, E> ProtocolCodec<Proto, Protocol, E> {
    pub const fn new(max_message_size: usize) -> Self {
        Self {
            max_message_size,
            _marker: PhantomData,
        }
    }

    pub const fn max_message_size(&self) -> usize {
        self.max_message_size
    }
}

impl<Proto, Protocol, E> Clone for ProtocolCodec<Proto, Protocol, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Proto, Protocol, E> Copy for ProtocolCodec<Proto, Protocol, E> {}

impl<Proto, Protocol, E> fmt::Debug for ProtocolCodec<Proto, Protocol, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProtocolCodec")
            .field("max_message_size", &self.max_message_size)
            .finish()
    }
}

impl<Proto, Protocol, E> ProtocolCodec<Proto, Protocol, E>
where
    Proto: MessageWrite + Tagged,
    Protocol: Into<Proto>,
    CodecError: Into<E>,
{
    pub fn encode(&self, item: Protocol) -> Result<Bytes, E> {
        let proto: Proto = item.into();
        let mut buf = vec![0u8; 1 + proto.get_size()];
        if let Some((tag, body)) = buf.split_first_mut() {
            *tag = Proto::TAG;
            let mut writer = Writer::new(BytesWriter::new(body));
            if let Err(e) = proto.write_message(&mut writer) {
                return Err(CodecError::from(e).into());
            }
        }
        Ok(Bytes::from(buf))
    }
}

impl<Proto, Protocol, PE, E> ProtocolCodec<Proto, Protocol, E>
where
    Proto: for<'a> MessageRead<'a> + Tagged,
    Protocol: TryFrom<Proto, Error = PE>,
    PE: Into<E>,
    CodecError: Into<E>,
{
    pub fn decode(&self, src: &[u8]) -> Result<Protocol, E> {
        if src.len() > self.max_message_size {
            return Err(CodecError::MessageTooLarge {
                limit: self.max_message_size,
                actual: src.len(),
            }
            .into());
        }

        let Some((&tag, body)) = src.split_first() else {
            return Err(CodecError::Empty.into());
        };
        if tag != Proto::TAG {
            return Err(CodecError::UnexpectedTag {
                expected: Proto::TAG,
                actual: tag,
            }
            .into());
        }

        let mut reader = BytesReader::from_bytes(body);
        match Proto::from_reader(&mut reader, body) {
            Ok(proto) => Protocol::try_from(proto).map_err(Into::into),
            Err(e) => Err(CodecError::from(e).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use quick_protobuf::{sizeofs::sizeof_len, WriterBackend};

    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Note {
        text: String,
    }

    impl Tagged for Note {
        const TAG: u8 = 0x42;
    }

    impl<'a> MessageRead<'a> for Note {
        fn from_reader(r: &mut BytesReader, bytes: &'a [u8]) -> quick_protobuf::Result<Self> {
            let mut msg = Self::default();
            while !r.is_eof() {
                match r.next_tag(bytes) {
                    Ok(10) => msg.text = r.read_string(bytes)?.to_owned(),
                    Ok(t) => {
                        r.read_unknown(bytes, t)?;
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(msg)
        }
    }

    impl MessageWrite for Note {
        fn get_size(&self) -> usize {
            if self.text.is_empty() {
                0
            } else {
                1 + sizeof_len(self.text.len())
            }
        }

        fn write_message<W: WriterBackend>(&self, w: &mut Writer<W>) -> quick_protobuf::Result<()> {
            if !self.text.is_empty() {
                w.write_with_tag(10, |w| w.write_string(&self.text))?;
            }
            Ok(())
        }
    }

    /// Domain form that refuses empty text.
    #[derive(Debug, Clone, PartialEq)]
    struct Text(String);

    impl TryFrom<Note> for Text {
        type Error = CodecError;

        fn try_from(value: Note) -> Result<Self, Self::Error> {
            if value.text.is_empty() {
                return Err(CodecError::MissingField("text"));
            }
            Ok(Self(value.text))
        }
    }

    impl From<Text> for Note {
        fn from(value: Text) -> Self {
            Note { text: value.0 }
        }
    }

    type TextCodec = ProtocolCodec<Note, Text, CodecError>;

    #[test]
    fn test_encode_prefixes_tag() {
        let encoded = TextCodec::new(64).encode(Text("hi".into())).unwrap();
        assert_eq!(&encoded[..], &[0x42, 10, 2, b'h', b'i']);
    }

    #[test]
    fn test_decode_rejects_empty_input() {
        assert_matches!(TextCodec::new(64).decode(&[]), Err(CodecError::Empty));
    }

    #[test]
    fn test_decode_rejects_wrong_tag() {
        let result = TextCodec::new(64).decode(&[0x07, 10, 1, b'x']);
        assert_matches!(
            result,
            Err(CodecError::UnexpectedTag {
                expected: 0x42,
                actual: 0x07
            })
        );
    }

    #[test]
    fn test_decode_rejects_oversized_message() {
        let encoded = TextCodec::new(1024).encode(Text("x".repeat(100))).unwrap();
        assert_matches!(
            TextCodec::new(16).decode(&encoded),
            Err(CodecError::MessageTooLarge { limit: 16, .. })
        );
    }

    #[test]
    fn test_decode_runs_domain_validation() {
        assert_matches!(
            TextCodec::new(64).decode(&[0x42]),
            Err(CodecError::MissingField("text"))
        );
    }

    #[test]
    fn test_decode_rejects_invalid_wire_type() {
        assert_matches!(
            TextCodec::new(64).decode(&[0x42, 0x0f]),
            Err(CodecError::Protobuf(_))
        );
    }

    proptest! {
        #[test]
        fn test_text_roundtrip(text in "[a-z]{1,64}") {
            let codec = TextCodec::new(128);
            let encoded = codec.encode(Text(text.clone())).unwrap();
            prop_assert_eq!(codec.decode(&encoded).unwrap(), Text(text));
        }
    }
}
