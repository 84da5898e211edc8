//! The [`Chunker`], which turns messages into chunk series and chunk series
//! back into messages.

use std::io::{Read, Write};

use crate::{
    comms::{
        message_chunk::{MessageChunk, MessageIsFinalType},
        secure_channel::SecureChannel,
    },
    Message,
};

use log::{debug, trace};
use uaserve_types::{
    node_id::NodeId, status_code::StatusCode, BinaryDecodable, BinaryEncodable, EncodingResult,
    Error,
};

use super::message_chunk::MessageChunkType;

/// Read implementation over a sequence of message chunks, stepping into the
/// next chunk when the previous one is exhausted. Avoids allocating one
/// contiguous buffer for the reassembled message.
struct ReceiveStream<'a, T> {
    buffer: &'a [u8],
    channel: &'a SecureChannel,
    items: T,
    num_items: usize,
    pos: usize,
    index: usize,
}

impl<'a, T: Iterator<Item = &'a MessageChunk>> ReceiveStream<'a, T> {
    pub fn new(channel: &'a SecureChannel, mut items: T, num_items: usize) -> Result<Self, Error> {
        let Some(chunk) = items.next() else {
            return Err(Error::new(
                StatusCode::BadUnexpectedError,
                "Stream contained no chunks",
            ));
        };

        let chunk_info = chunk.chunk_info(channel)?;
        let expected_is_final = if num_items == 1 {
            MessageIsFinalType::Final
        } else {
            MessageIsFinalType::Intermediate
        };
        if chunk_info.message_header.is_final != expected_is_final {
            return Err(Error::new(
                StatusCode::BadDecodingError,
                "Last chunk not marked as final",
            ));
        }

        let body_start = chunk_info.body_offset;
        let body_end = body_start + chunk_info.body_length;
        Ok(Self {
            buffer: &chunk.data[body_start..body_end],
            channel,
            items,
            pos: 0,
            num_items,
            index: 0,
        })
    }
}

impl<'a, T: Iterator<Item = &'a MessageChunk>> Read for ReceiveStream<'a, T> {
    fn read(&mut self, mut buf: &mut [u8]) -> std::io::Result<usize> {
        if self.buffer.len() == self.pos {
            let Some(chunk) = self.items.next() else {
                return Ok(0);
            };
            self.index += 1;
            let chunk_info = chunk.chunk_info(self.channel)?;
            let expected_is_final = if self.index == self.num_items - 1 {
                MessageIsFinalType::Final
            } else {
                MessageIsFinalType::Intermediate
            };
            if chunk_info.message_header.is_final != expected_is_final {
                return Err(StatusCode::BadDecodingError.into());
            }

            let body_start = chunk_info.body_offset;
            let body_end = body_start + chunk_info.body_length;
            self.buffer = &chunk.data[body_start..body_end];
            self.pos = 0;
        }
        let written = buf.write(&self.buffer[self.pos..])?;
        self.pos += written;
        Ok(written)
    }
}

/// Write implementation that slices an outgoing message into chunks as it
/// is encoded.
struct ChunkingStream<'a> {
    secure_channel: &'a SecureChannel,
    chunks: Vec<MessageChunk>,
    expected_chunk_count: usize,
    max_body_per_chunk: usize,
    next_buf: Vec<u8>,
    buf_position: usize,
    is_closed: bool,
    sequence_number: u32,
    request_id: u32,
    message_size: usize,
    message_type: MessageChunkType,
}

impl<'a> ChunkingStream<'a> {
    pub fn new(
        message_type: MessageChunkType,
        secure_channel: &'a SecureChannel,
        max_chunk_size: usize,
        message_size: usize,
        request_id: u32,
        request_handle: u32,
        sequence_number: u32,
    ) -> Result<Self, Error> {
        let (expected_chunk_count, max_body_per_chunk, next_buf_size) = if max_chunk_size > 0 {
            let max_body_per_chunk = MessageChunk::body_size_from_message_size(
                message_type,
                secure_channel,
                max_chunk_size,
            )
            .map_err(|_| {
                Error::new(
                    StatusCode::BadTcpInternalError,
                    format!(
                        "body_size_from_message_size error for max_chunk_size = {}",
                        max_chunk_size
                    ),
                )
                .with_context(
                    Some(request_id),
                    (request_handle > 0).then_some(request_handle),
                )
            })?;
            let expected_chunk_count = message_size / max_body_per_chunk + 1;
            let next_buf_size = if expected_chunk_count == 1 {
                message_size
            } else {
                max_body_per_chunk
            };
            (expected_chunk_count, max_body_per_chunk, next_buf_size)
        } else {
            (1, 0, message_size)
        };

        Ok(Self {
            secure_channel,
            chunks: Vec::with_capacity(expected_chunk_count),
            expected_chunk_count,
            max_body_per_chunk,
            next_buf: vec![0; next_buf_size],
            buf_position: 0,
            is_closed: false,
            sequence_number,
            request_id,
            message_type,
            message_size,
        })
    }

    fn flush_chunk(&mut self) -> EncodingResult<()> {
        if self.is_closed {
            return Ok(());
        }

        let buf = std::mem::take(&mut self.next_buf);
        let is_final = if self.chunks.len() == self.expected_chunk_count - 1 {
            self.is_closed = true;
            MessageIsFinalType::Final
        } else {
            MessageIsFinalType::Intermediate
        };

        let chunk = MessageChunk::new(
            self.sequence_number + self.chunks.len() as u32,
            self.request_id,
            self.message_type,
            is_final,
            self.secure_channel,
            &buf,
        )?;
        self.chunks.push(chunk);

        if !self.is_closed {
            let next_buf_size = if self.chunks.len() == self.expected_chunk_count - 1 {
                self.message_size % self.max_body_per_chunk
            } else {
                self.max_body_per_chunk
            };
            self.next_buf = vec![0; next_buf_size];
            self.buf_position = 0;
        }

        Ok(())
    }

    fn finish(self) -> EncodingResult<Vec<MessageChunk>> {
        if !self.is_closed {
            return Err(Error::encoding(
                "Message did not encode to the expected size",
            ));
        }
        Ok(self.chunks)
    }
}

impl Write for ChunkingStream<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.is_closed {
            return Ok(0);
        }

        let to_read = buf.len().min(self.next_buf.len() - self.buf_position);
        self.next_buf[self.buf_position..(self.buf_position + to_read)]
            .copy_from_slice(&buf[..to_read]);
        self.buf_position += to_read;
        if self.buf_position == self.next_buf.len() {
            self.flush_chunk()?;
        }

        Ok(to_read)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_chunk()?;
        Ok(())
    }
}

/// Turns messages into chunks and chunks into messages.
pub struct Chunker;

impl Chunker {
    /// Ensure all supplied chunks belong to this channel and carry
    /// contiguous sequence numbers starting at or after
    /// `starting_sequence_number`, all with the same request id.
    ///
    /// Returns the last sequence number in the series.
    pub fn validate_chunks(
        starting_sequence_number: u32,
        secure_channel: &SecureChannel,
        chunks: &[MessageChunk],
    ) -> Result<u32, Error> {
        let first_sequence_number = {
            let chunk_info = chunks[0].chunk_info(secure_channel)?;
            chunk_info.sequence_header.sequence_number
        };
        trace!("Received chunk with sequence number {first_sequence_number}");
        if first_sequence_number < starting_sequence_number {
            return Err(Error::new(
                StatusCode::BadSequenceNumberInvalid,
                format!(
                    "First sequence number of {} is less than last value {}",
                    first_sequence_number, starting_sequence_number
                ),
            ));
        }

        let secure_channel_id = secure_channel.secure_channel_id();
        let mut expected_request_id: u32 = 0;
        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_info = chunk.chunk_info(secure_channel)?;

            if secure_channel_id != 0
                && chunk_info.message_header.secure_channel_id != secure_channel_id
            {
                return Err(Error::new(
                    StatusCode::BadSecureChannelIdInvalid,
                    format!(
                        "Secure channel id {} does not match expected id {}",
                        chunk_info.message_header.secure_channel_id, secure_channel_id
                    ),
                ));
            }

            let sequence_number = chunk_info.sequence_header.sequence_number;
            let expected_sequence_number = first_sequence_number + i as u32;
            if sequence_number != expected_sequence_number {
                return Err(Error::new(
                    StatusCode::BadSequenceNumberInvalid,
                    format!(
                        "Chunk sequence number of {} is not the expected value of {}, idx {}",
                        sequence_number, expected_sequence_number, i
                    ),
                ));
            }

            if i == 0 {
                expected_request_id = chunk_info.sequence_header.request_id;
            } else if chunk_info.sequence_header.request_id != expected_request_id {
                return Err(Error::new(
                    StatusCode::BadSequenceNumberInvalid,
                    format!(
                        "Chunk with sequence number {} has request id {} instead of the expected {}, idx {}",
                        sequence_number, chunk_info.sequence_header.request_id, expected_request_id, i
                    ),
                ));
            }
        }
        Ok(first_sequence_number + chunks.len() as u32 - 1)
    }

    /// Encode a message into a series of chunks, starting at
    /// `sequence_number`.
    ///
    /// `max_message_size` and `max_chunk_size` are in bytes, 0 for no
    /// limit.
    pub fn encode(
        sequence_number: u32,
        request_id: u32,
        max_message_size: usize,
        max_chunk_size: usize,
        secure_channel: &SecureChannel,
        supported_message: &impl Message,
    ) -> std::result::Result<Vec<MessageChunk>, Error> {
        let ctx_r = secure_channel.context();
        let ctx = ctx_r.context();

        let ctx_id = Some(request_id);
        let handle = supported_message.request_handle();
        let ctx_handle = (handle > 0).then_some(handle);

        // This is as good a place as any to enforce the negotiated message
        // size before spending time encoding.
        let mut message_size = supported_message.byte_len(&ctx);
        if max_message_size > 0 && message_size > max_message_size {
            return Err(Error::new(
                if secure_channel.is_client_role() {
                    StatusCode::BadRequestTooLarge
                } else {
                    StatusCode::BadResponseTooLarge
                },
                format!(
                    "Max message size is {} and message {} exceeds that",
                    max_message_size, message_size
                ),
            )
            .with_context(ctx_id, ctx_handle));
        }

        let node_id = supported_message.type_id();
        message_size += node_id.byte_len(&ctx);

        let message_type = supported_message.message_type();

        let mut stream = ChunkingStream::new(
            message_type,
            secure_channel,
            max_chunk_size,
            message_size,
            request_id,
            handle,
            sequence_number,
        )?;

        node_id.encode(&mut stream, &ctx)?;
        supported_message
            .encode(&mut stream, &ctx)
            .map_err(|e| e.with_context(ctx_id, ctx_handle))?;

        stream.flush()?;

        stream.finish()
    }

    /// Decode a series of chunks into a message of type `T`.
    pub fn decode<T: Message>(
        chunks: &[MessageChunk],
        secure_channel: &SecureChannel,
        expected_node_id: Option<NodeId>,
    ) -> std::result::Result<T, Error> {
        for (i, chunk) in chunks.iter().enumerate() {
            let chunk_info = chunk.chunk_info(secure_channel)?;
            let expected_is_final = if i == chunks.len() - 1 {
                MessageIsFinalType::Final
            } else {
                MessageIsFinalType::Intermediate
            };
            if chunk_info.message_header.is_final != expected_is_final {
                return Err(Error::decoding(
                    "Last message in sequence is not marked as final",
                ));
            }
        }

        let mut stream = ReceiveStream::new(secure_channel, chunks.iter(), chunks.len())?;

        let ctx_r = secure_channel.context();
        let ctx = ctx_r.context();

        // The message body is prefixed by the node id of its encoding.
        let node_id = NodeId::decode(&mut stream, &ctx)?;
        if let Some(id) = expected_node_id {
            if node_id != id {
                return Err(Error::decoding(format!(
                    "The message ID {node_id} is not the expected value {id}"
                )));
            }
        }
        let Ok(object_id) = node_id.as_object_id() else {
            // Not a numeric id in namespace 0. The request header follows
            // the type id, so try to recover the handle for a fault reply.
            let mut err = Error::new(
                StatusCode::BadServiceUnsupported,
                format!("The message id {node_id} is not an object id"),
            );
            if let Ok(header) = uaserve_types::RequestHeader::decode(&mut stream, &ctx) {
                err = err.with_request_handle(header.request_handle);
            }
            return Err(err);
        };

        match T::decode_by_object_id(&mut stream, object_id, &ctx) {
            Ok(decoded_message) => Ok(decoded_message),
            Err(err) => {
                debug!("Cannot decode message {:?}, err = {:?}", object_id, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Chunker;
    use crate::comms::secure_channel::{Role, SecureChannel};
    use crate::{RequestMessage, ResponseMessage};
    use uaserve_types::{
        DecodingOptions, GetEndpointsRequest, ReadResponse, RequestHeader, ResponseHeader,
    };

    fn test_channel() -> SecureChannel {
        let mut channel = SecureChannel::new(Role::Server, DecodingOptions::default());
        channel.set_secure_channel_id(1);
        channel.issue_token(1);
        channel
    }

    #[test]
    fn single_chunk_round_trip() {
        let channel = test_channel();
        let request: RequestMessage = GetEndpointsRequest {
            request_header: RequestHeader::new(uaserve_types::NodeId::null(), 7),
            endpoint_url: "opc.tcp://localhost:4840".into(),
            locale_ids: None,
            profile_uris: None,
        }
        .into();

        let chunks = Chunker::encode(1, 10, 0, 0, &channel, &request).unwrap();
        assert_eq!(chunks.len(), 1);

        let decoded: RequestMessage = Chunker::decode(&chunks, &channel, None).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn multi_chunk_round_trip() {
        let channel = test_channel();
        // A response large enough to need several chunks at the minimum
        // chunk size.
        let results: Vec<uaserve_types::DataValue> = (0..4096)
            .map(|i| uaserve_types::DataValue::new_now(i as i32))
            .collect();
        let response: ResponseMessage = ReadResponse {
            response_header: ResponseHeader::new_service_result(
                99,
                uaserve_types::StatusCode::Good,
            ),
            results: Some(results),
            diagnostic_infos: None,
        }
        .into();

        let chunks = Chunker::encode(1, 10, 0, 8196, &channel, &response).unwrap();
        assert!(chunks.len() > 1);

        let last = Chunker::validate_chunks(1, &channel, &chunks).unwrap();
        assert_eq!(last, chunks.len() as u32);

        let decoded: ResponseMessage = Chunker::decode(&chunks, &channel, None).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn out_of_order_chunks_rejected() {
        let channel = test_channel();
        let results: Vec<uaserve_types::DataValue> = (0..4096)
            .map(|i| uaserve_types::DataValue::new_now(i as i32))
            .collect();
        let response: ResponseMessage = ReadResponse {
            response_header: ResponseHeader::new_service_result(
                99,
                uaserve_types::StatusCode::Good,
            ),
            results: Some(results),
            diagnostic_infos: None,
        }
        .into();

        let mut chunks = Chunker::encode(1, 10, 0, 8196, &channel, &response).unwrap();
        chunks.swap(0, 1);
        assert!(Chunker::validate_chunks(1, &channel, &chunks).is_err());
    }
}
