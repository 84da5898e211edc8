//! The [`SendBuffer`], an outgoing queue of encoded chunks drained into the
//! socket.

use std::collections::VecDeque;
use std::io::Cursor;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use uaserve_types::{EncodingResult, Error, SimpleBinaryEncodable};

use crate::messages::{Message, ResponseMessage};

use super::{
    chunker::Chunker,
    message_chunk::MessageChunk,
    secure_channel::SecureChannel,
    tcp_types::ErrorMessage,
};

/// Outgoing buffer: messages are encoded into chunks which are queued here
/// and written to the stream as it accepts them.
pub struct SendBuffer {
    /// The send buffer, the chunk currently being written.
    buffer: Cursor<Vec<u8>>,
    /// Queued chunks awaiting serialization into the buffer.
    chunks: VecDeque<MessageChunk>,
    /// The negotiated maximum size of a single chunk.
    pub send_buffer_size: usize,
    /// The negotiated maximum size of a whole message, 0 for no limit.
    pub max_message_size: usize,
    /// The negotiated maximum number of chunks per message, 0 for no limit.
    pub max_chunk_count: usize,
}

impl SendBuffer {
    /// Create a buffer with the negotiated limits.
    pub fn new(
        send_buffer_size: usize,
        max_message_size: usize,
        max_chunk_count: usize,
    ) -> Self {
        Self {
            buffer: Cursor::new(Vec::with_capacity(send_buffer_size)),
            chunks: VecDeque::with_capacity(16),
            send_buffer_size,
            max_message_size,
            max_chunk_count,
        }
    }

    /// Revise the limits after handshake negotiation.
    pub fn revise(
        &mut self,
        send_buffer_size: usize,
        max_message_size: usize,
        max_chunk_count: usize,
    ) {
        self.send_buffer_size = send_buffer_size;
        self.max_message_size = max_message_size;
        self.max_chunk_count = max_chunk_count;
    }

    /// Encode `message` into chunks and queue them.
    pub fn write(
        &mut self,
        request_id: u32,
        message: ResponseMessage,
        secure_channel: &mut SecureChannel,
    ) -> EncodingResult<u32> {
        let sequence_number = secure_channel.next_send_sequence_number();
        let chunks = Chunker::encode(
            sequence_number,
            request_id,
            self.max_message_size,
            self.send_buffer_size,
            secure_channel,
            &message,
        )?;
        if self.max_chunk_count > 0 && chunks.len() > self.max_chunk_count {
            return Err(Error::encoding(format!(
                "Message requires {} chunks, exceeding the negotiated limit of {}",
                chunks.len(),
                self.max_chunk_count
            ))
            .with_context(
                Some(request_id),
                Some(message.request_handle()),
            ));
        }
        // Chunker::encode consumed one sequence number per chunk.
        for _ in 1..chunks.len() {
            secure_channel.next_send_sequence_number();
        }
        self.chunks.extend(chunks);
        Ok(request_id)
    }

    /// Queue a transport level error message, sent as a raw frame.
    pub fn write_error(&mut self, message: ErrorMessage) {
        // An error frame is not a chunk, but it shares the queue so that
        // ordering against pending responses is preserved.
        self.chunks.push_back(MessageChunk {
            data: message.encode_to_vec(),
        });
    }

    /// `true` if a queued chunk can be moved into the write buffer.
    pub fn should_encode_chunks(&self) -> bool {
        !self.chunks.is_empty() && !self.can_read()
    }

    /// Move the next queued chunk into the write buffer.
    pub fn encode_next_chunk(&mut self) -> EncodingResult<()> {
        if let Some(chunk) = self.chunks.pop_front() {
            self.buffer = Cursor::new(chunk.data);
        }
        Ok(())
    }

    /// `true` if the write buffer holds bytes to send.
    pub fn can_read(&self) -> bool {
        (self.buffer.position() as usize) < self.buffer.get_ref().len()
    }

    /// Write the buffered bytes into `write`.
    pub async fn read_into_async<W: AsyncWrite + Unpin>(
        &mut self,
        write: &mut W,
    ) -> std::io::Result<()> {
        let pos = self.buffer.position() as usize;
        let data = &self.buffer.get_ref()[pos..];
        let written = write.write(data).await?;
        self.buffer.set_position((pos + written) as u64);
        Ok(())
    }
}
