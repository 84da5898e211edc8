//! The [`TcpCodec`], a tokio codec decoding the UA-TCP framing into
//! handshake messages and raw chunks.

use std::io::Cursor;

use bytes::BytesMut;
use log::error;
use tokio_util::codec::Decoder;
use uaserve_types::{DecodingOptions, Error, SimpleBinaryDecodable};

use super::{
    message_chunk::MessageChunk,
    tcp_types::{
        AcknowledgeMessage, ErrorMessage, HelloMessage, MessageHeader, MessageType,
        MESSAGE_HEADER_LEN,
    },
};

/// One decoded frame off the wire.
#[derive(Debug)]
pub enum Message {
    /// Client hello.
    Hello(HelloMessage),
    /// Server acknowledge.
    Acknowledge(AcknowledgeMessage),
    /// Error notification.
    Error(ErrorMessage),
    /// A chunk of a service message.
    Chunk(MessageChunk),
}

/// Decodes the UA-TCP stream into [`Message`] values.
pub struct TcpCodec {
    decoding_options: DecodingOptions,
}

impl TcpCodec {
    /// Create a codec with the given decoding limits.
    pub fn new(decoding_options: DecodingOptions) -> TcpCodec {
        TcpCodec { decoding_options }
    }
}

impl Decoder for TcpCodec {
    type Item = Message;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if buf.len() < MESSAGE_HEADER_LEN {
            return Ok(None);
        }

        let header = {
            let mut stream = Cursor::new(&buf[..MESSAGE_HEADER_LEN]);
            MessageHeader::decode(&mut stream, &self.decoding_options)
                .map_err(std::io::Error::from)?
        };

        if header.message_type == MessageType::Invalid {
            return Err(std::io::Error::other(
                "Message type is not recognized, possible corruption",
            ));
        }

        let message_size = header.message_size as usize;
        if self.decoding_options.max_message_size > 0
            && message_size > self.decoding_options.max_message_size
        {
            error!(
                "Message size {} exceeds the negotiated limit {}",
                message_size, self.decoding_options.max_message_size
            );
            return Err(Error::new(
                uaserve_types::StatusCode::BadTcpMessageTooLarge,
                "Message size exceeds negotiated limit",
            )
            .into());
        }
        if message_size < MESSAGE_HEADER_LEN {
            return Err(std::io::Error::other("Message size is impossibly small"));
        }

        if buf.len() < message_size {
            // Not enough data yet; reserve what we know is coming.
            buf.reserve(message_size - buf.len());
            return Ok(None);
        }

        let frame = buf.split_to(message_size);
        let mut stream = Cursor::new(&frame[..]);
        let message = match header.message_type {
            MessageType::Hello => Message::Hello(
                HelloMessage::decode(&mut stream, &self.decoding_options)
                    .map_err(std::io::Error::from)?,
            ),
            MessageType::Acknowledge => Message::Acknowledge(
                AcknowledgeMessage::decode(&mut stream, &self.decoding_options)
                    .map_err(std::io::Error::from)?,
            ),
            MessageType::Error => Message::Error(
                ErrorMessage::decode(&mut stream, &self.decoding_options)
                    .map_err(std::io::Error::from)?,
            ),
            MessageType::Chunk => Message::Chunk(MessageChunk {
                data: frame.to_vec(),
            }),
            MessageType::Invalid => unreachable!(),
        };
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::{Message, TcpCodec};
    use crate::comms::tcp_types::HelloMessage;
    use bytes::BytesMut;
    use tokio_util::codec::Decoder;
    use uaserve_types::{DecodingOptions, SimpleBinaryEncodable};

    #[test]
    fn partial_then_complete_frame() {
        let mut codec = TcpCodec::new(DecodingOptions::default());
        let hello = HelloMessage::new("opc.tcp://localhost:4840", 65536, 65536, 0, 0);
        let bytes = hello.encode_to_vec();

        let mut buf = BytesMut::new();
        buf.extend_from_slice(&bytes[..10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());

        buf.extend_from_slice(&bytes[10..]);
        match codec.decode(&mut buf).unwrap() {
            Some(Message::Hello(decoded)) => assert_eq!(decoded, hello),
            other => panic!("Expected hello, got {other:?}"),
        }
        assert!(buf.is_empty());
    }
}
