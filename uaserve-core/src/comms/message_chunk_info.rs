//! The [`ChunkInfo`] type, the decoded layout of one message chunk.

use std::io::Cursor;

use uaserve_types::{DecodingOptions, EncodingResult, SimpleBinaryDecodable};

use super::{
    message_chunk::{MessageChunk, MessageChunkHeader},
    secure_channel::SecureChannel,
    security_header::{SecurityHeader, SequenceHeader},
};

/// The decoded headers of a chunk and the position of its body.
#[derive(Debug, Clone)]
pub struct ChunkInfo {
    /// The fixed chunk header.
    pub message_header: MessageChunkHeader,
    /// The security header, symmetric or asymmetric.
    pub security_header: SecurityHeader,
    /// The sequence header.
    pub sequence_header: SequenceHeader,
    /// Byte offset of the message body within the chunk data.
    pub body_offset: usize,
    /// Length in bytes of the message body, excluding padding and
    /// signature.
    pub body_length: usize,
}

impl ChunkInfo {
    /// Parse the layout of `chunk` in the context of `secure_channel`.
    pub fn new(chunk: &MessageChunk, secure_channel: &SecureChannel) -> EncodingResult<ChunkInfo> {
        let decoding_options = secure_channel.decoding_options();
        Self::new_with_options(chunk, &decoding_options, secure_channel)
    }

    fn new_with_options(
        chunk: &MessageChunk,
        decoding_options: &DecodingOptions,
        secure_channel: &SecureChannel,
    ) -> EncodingResult<ChunkInfo> {
        let mut stream = Cursor::new(&chunk.data);

        let message_header = MessageChunkHeader::decode(&mut stream, decoding_options)?;
        let security_header = SecurityHeader::decode_from_stream(
            &mut stream,
            message_header.message_type.is_open_secure_channel(),
            decoding_options,
        )?;
        let sequence_header = SequenceHeader::decode(&mut stream, decoding_options)?;

        let body_offset = stream.position() as usize;

        // Everything after the headers and before padding and signature is
        // message body. Without encryption there is no padding.
        let signature_size = secure_channel.signature_size(&security_header);
        let body_length = chunk.data.len() - body_offset - signature_size;

        Ok(ChunkInfo {
            message_header,
            security_header,
            sequence_header,
            body_offset,
            body_length,
        })
    }
}
