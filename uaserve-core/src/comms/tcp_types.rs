//! The connection establishment messages of UA-TCP: Hello, Acknowledge and
//! Error, plus the raw message header shared by all frames.

use std::io::{Cursor, Read, Write};

use log::error;
use uaserve_types::{
    process_decode_io_result, process_encode_io_result, read_u32, read_u8, status_code::StatusCode,
    string::UAString, write_u32, write_u8, DecodingOptions, EncodingResult, Error,
    SimpleBinaryDecodable, SimpleBinaryEncodable,
};

/// Minimum size in bytes a client and server shall support for buffers.
pub const MIN_CHUNK_SIZE: usize = 8196;

/// Size in bytes of the raw message header.
pub const MESSAGE_HEADER_LEN: usize = 8;

/// ASCII tag of a Hello message.
pub const HELLO_MESSAGE: &[u8] = b"HEL";
/// ASCII tag of an Acknowledge message.
pub const ACKNOWLEDGE_MESSAGE: &[u8] = b"ACK";
/// ASCII tag of an Error message.
pub const ERROR_MESSAGE: &[u8] = b"ERR";
/// ASCII tag of a regular service message chunk.
pub const CHUNK_MESSAGE: &[u8] = b"MSG";
/// ASCII tag of an OpenSecureChannel chunk.
pub const OPEN_SECURE_CHANNEL_MESSAGE: &[u8] = b"OPN";
/// ASCII tag of a CloseSecureChannel chunk.
pub const CLOSE_SECURE_CHANNEL_MESSAGE: &[u8] = b"CLO";

/// Chunk type byte of an intermediate chunk.
pub const CHUNK_INTERMEDIATE: u8 = b'C';
/// Chunk type byte of a final chunk.
pub const CHUNK_FINAL: u8 = b'F';
/// Chunk type byte of a final chunk that aborts the message.
pub const CHUNK_FINAL_ERROR: u8 = b'A';

/// The kind of a raw UA-TCP message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageType {
    /// Invalid message type.
    Invalid,
    /// Client hello.
    Hello,
    /// Server acknowledge.
    Acknowledge,
    /// Error notification, sent before closing.
    Error,
    /// A chunk of a service message (MSG, OPN or CLO).
    Chunk,
}

/// The raw 8-byte header every UA-TCP frame starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    /// The kind of message.
    pub message_type: MessageType,
    /// Size of the whole message in bytes, including this header.
    pub message_size: u32,
}

impl SimpleBinaryEncodable for MessageHeader {
    fn byte_len(&self) -> usize {
        MESSAGE_HEADER_LEN
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        let result = match self.message_type {
            MessageType::Hello => stream.write_all(HELLO_MESSAGE),
            MessageType::Acknowledge => stream.write_all(ACKNOWLEDGE_MESSAGE),
            MessageType::Error => stream.write_all(ERROR_MESSAGE),
            _ => {
                return Err(Error::encoding("Invalid message type"));
            }
        };
        process_encode_io_result(result)?;
        // Handshake messages are single frames, always final.
        write_u8(stream, CHUNK_FINAL)?;
        write_u32(stream, self.message_size)
    }
}

impl SimpleBinaryDecodable for MessageHeader {
    fn decode<S: Read + ?Sized>(stream: &mut S, _: &DecodingOptions) -> EncodingResult<Self> {
        let mut message_type = [0u8; 4];
        process_decode_io_result(stream.read_exact(&mut message_type))?;
        let message_size = read_u32(stream)?;
        Ok(MessageHeader {
            message_type: MessageHeader::message_type(&message_type),
            message_size,
        })
    }
}

impl MessageHeader {
    /// Create a header of the given type; size must be filled in later.
    pub fn new(message_type: MessageType) -> MessageHeader {
        MessageHeader {
            message_type,
            message_size: 0,
        }
    }

    /// Classify the message from the first four bytes of the frame: the
    /// three byte ASCII tag and the chunk type byte.
    pub fn message_type(t: &[u8]) -> MessageType {
        if t.len() != 4 {
            return MessageType::Invalid;
        }
        let tag = &t[0..3];
        match tag {
            HELLO_MESSAGE => MessageType::Hello,
            ACKNOWLEDGE_MESSAGE => MessageType::Acknowledge,
            ERROR_MESSAGE => MessageType::Error,
            CHUNK_MESSAGE | OPEN_SECURE_CHANNEL_MESSAGE | CLOSE_SECURE_CHANNEL_MESSAGE => {
                match t[3] {
                    CHUNK_INTERMEDIATE | CHUNK_FINAL | CHUNK_FINAL_ERROR => MessageType::Chunk,
                    _ => {
                        error!("Invalid chunk type byte {}", t[3]);
                        MessageType::Invalid
                    }
                }
            }
            _ => {
                error!("Invalid message tag {:?}", tag);
                MessageType::Invalid
            }
        }
    }
}

/// Client hello, the first message on a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct HelloMessage {
    /// The raw message header.
    pub message_header: MessageHeader,
    /// Protocol version the client supports.
    pub protocol_version: u32,
    /// Largest chunk the client can receive.
    pub receive_buffer_size: u32,
    /// Largest chunk the client will send.
    pub send_buffer_size: u32,
    /// Largest message the client accepts, 0 for no limit.
    pub max_message_size: u32,
    /// Maximum number of chunks per message the client accepts, 0 for no
    /// limit.
    pub max_chunk_count: u32,
    /// The URL of the endpoint the client wants to talk to.
    pub endpoint_url: UAString,
}

impl SimpleBinaryEncodable for HelloMessage {
    fn byte_len(&self) -> usize {
        MESSAGE_HEADER_LEN + 20 + self.endpoint_url.byte_len()
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        self.message_header.encode(stream)?;
        write_u32(stream, self.protocol_version)?;
        write_u32(stream, self.receive_buffer_size)?;
        write_u32(stream, self.send_buffer_size)?;
        write_u32(stream, self.max_message_size)?;
        write_u32(stream, self.max_chunk_count)?;
        self.endpoint_url.encode(stream)
    }
}

impl SimpleBinaryDecodable for HelloMessage {
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Self> {
        let message_header = MessageHeader::decode(stream, decoding_options)?;
        let protocol_version = read_u32(stream)?;
        let receive_buffer_size = read_u32(stream)?;
        let send_buffer_size = read_u32(stream)?;
        let max_message_size = read_u32(stream)?;
        let max_chunk_count = read_u32(stream)?;
        let endpoint_url = UAString::decode(stream, decoding_options)?;
        // Part 6: the endpoint url in a hello shall not exceed 4096 bytes
        if endpoint_url.len() > 4096 {
            return Err(Error::decoding("Endpoint url exceeds 4096 bytes"));
        }
        Ok(HelloMessage {
            message_header,
            protocol_version,
            receive_buffer_size,
            send_buffer_size,
            max_message_size,
            max_chunk_count,
            endpoint_url,
        })
    }
}

impl HelloMessage {
    /// Create a hello message for `endpoint_url` with the given limits.
    pub fn new(
        endpoint_url: &str,
        send_buffer_size: usize,
        receive_buffer_size: usize,
        max_message_size: usize,
        max_chunk_count: usize,
    ) -> HelloMessage {
        let mut msg = HelloMessage {
            message_header: MessageHeader::new(MessageType::Hello),
            protocol_version: crate::PROTOCOL_VERSION,
            receive_buffer_size: receive_buffer_size as u32,
            send_buffer_size: send_buffer_size as u32,
            max_message_size: max_message_size as u32,
            max_chunk_count: max_chunk_count as u32,
            endpoint_url: UAString::from(endpoint_url),
        };
        msg.message_header.message_size = msg.byte_len() as u32;
        msg
    }

    /// Buffer sizes must be at least 8196 bytes per part 6.
    pub fn is_valid_buffer_sizes(&self) -> bool {
        self.receive_buffer_size as usize >= MIN_CHUNK_SIZE
            && self.send_buffer_size as usize >= MIN_CHUNK_SIZE
    }
}

/// Server acknowledge, the reply to a hello.
#[derive(Debug, Clone, PartialEq)]
pub struct AcknowledgeMessage {
    /// The raw message header.
    pub message_header: MessageHeader,
    /// Protocol version the server supports.
    pub protocol_version: u32,
    /// Largest chunk the server can receive.
    pub receive_buffer_size: u32,
    /// Largest chunk the server will send.
    pub send_buffer_size: u32,
    /// Largest message the server accepts, 0 for no limit.
    pub max_message_size: u32,
    /// Maximum number of chunks per message, 0 for no limit.
    pub max_chunk_count: u32,
}

impl SimpleBinaryEncodable for AcknowledgeMessage {
    fn byte_len(&self) -> usize {
        MESSAGE_HEADER_LEN + 20
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        self.message_header.encode(stream)?;
        write_u32(stream, self.protocol_version)?;
        write_u32(stream, self.receive_buffer_size)?;
        write_u32(stream, self.send_buffer_size)?;
        write_u32(stream, self.max_message_size)?;
        write_u32(stream, self.max_chunk_count)
    }
}

impl SimpleBinaryDecodable for AcknowledgeMessage {
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Self> {
        let message_header = MessageHeader::decode(stream, decoding_options)?;
        let protocol_version = read_u32(stream)?;
        let receive_buffer_size = read_u32(stream)?;
        let send_buffer_size = read_u32(stream)?;
        let max_message_size = read_u32(stream)?;
        let max_chunk_count = read_u32(stream)?;
        Ok(AcknowledgeMessage {
            message_header,
            protocol_version,
            receive_buffer_size,
            send_buffer_size,
            max_message_size,
            max_chunk_count,
        })
    }
}

impl AcknowledgeMessage {
    /// Create an acknowledge carrying the revised limits.
    pub fn new(
        protocol_version: u32,
        receive_buffer_size: u32,
        send_buffer_size: u32,
        max_message_size: u32,
        max_chunk_count: u32,
    ) -> AcknowledgeMessage {
        let mut ack = AcknowledgeMessage {
            message_header: MessageHeader::new(MessageType::Acknowledge),
            protocol_version,
            receive_buffer_size,
            send_buffer_size,
            max_message_size,
            max_chunk_count,
        };
        ack.message_header.message_size = ack.byte_len() as u32;
        ack
    }
}

/// Error message, sent before the transport closes on a fatal error.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorMessage {
    /// The raw message header.
    pub message_header: MessageHeader,
    /// The error as a numeric status code.
    pub error: u32,
    /// Human readable reason, at most 4096 bytes.
    pub reason: UAString,
}

impl SimpleBinaryEncodable for ErrorMessage {
    fn byte_len(&self) -> usize {
        MESSAGE_HEADER_LEN + 4 + self.reason.byte_len()
    }

    fn encode<S: Write + ?Sized>(&self, stream: &mut S) -> EncodingResult<()> {
        self.message_header.encode(stream)?;
        write_u32(stream, self.error)?;
        self.reason.encode(stream)
    }
}

impl SimpleBinaryDecodable for ErrorMessage {
    fn decode<S: Read + ?Sized>(
        stream: &mut S,
        decoding_options: &DecodingOptions,
    ) -> EncodingResult<Self> {
        let message_header = MessageHeader::decode(stream, decoding_options)?;
        let error = read_u32(stream)?;
        let reason = UAString::decode(stream, decoding_options)?;
        Ok(ErrorMessage {
            message_header,
            error,
            reason,
        })
    }
}

impl ErrorMessage {
    /// Create an error message from a status code and a reason.
    pub fn new(status_code: StatusCode, reason: &str) -> ErrorMessage {
        let mut error = ErrorMessage {
            message_header: MessageHeader::new(MessageType::Error),
            error: status_code.bits(),
            reason: UAString::from(reason),
        };
        error.message_header.message_size = error.byte_len() as u32;
        error
    }

    /// The status code of the error.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from(self.error)
    }
}

/// Serialize a handshake message into a fresh buffer.
pub fn encode_to_buf(msg: &impl SimpleBinaryEncodable) -> EncodingResult<Vec<u8>> {
    let mut stream = Cursor::new(Vec::with_capacity(msg.byte_len()));
    msg.encode(&mut stream)?;
    Ok(stream.into_inner())
}

#[cfg(test)]
mod tests {
    use super::{AcknowledgeMessage, HelloMessage, MessageType};
    use uaserve_types::{DecodingOptions, SimpleBinaryDecodable, SimpleBinaryEncodable};

    #[test]
    fn hello_round_trip() {
        let hello = HelloMessage::new("opc.tcp://localhost:4840", 65536, 65536, 0, 0);
        assert!(hello.is_valid_buffer_sizes());
        let buf = hello.encode_to_vec();
        assert_eq!(buf.len(), hello.message_header.message_size as usize);
        // HEL + F
        assert_eq!(&buf[0..4], b"HELF");

        let mut stream = buf.as_slice();
        let decoded = HelloMessage::decode(&mut stream, &DecodingOptions::default()).unwrap();
        assert_eq!(decoded, hello);
        assert_eq!(decoded.message_header.message_type, MessageType::Hello);
    }

    #[test]
    fn ack_round_trip() {
        let ack = AcknowledgeMessage::new(0, 65536, 65536, 0, 0);
        let buf = ack.encode_to_vec();
        let mut stream = buf.as_slice();
        let decoded = AcknowledgeMessage::decode(&mut stream, &DecodingOptions::default()).unwrap();
        assert_eq!(decoded, ack);
    }
}
