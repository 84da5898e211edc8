//! Server transport for opc.tcp: the HEL/ACK handshake and the polling
//! loop turning chunks into requests and responses into chunks.

use std::sync::Arc;

use log::error;
use uaserve_core::{
    comms::{
        buffer::SendBuffer,
        chunker::Chunker,
        message_chunk::{MessageChunk, MessageIsFinalType},
        secure_channel::SecureChannel,
        tcp_codec::{Message, TcpCodec},
        tcp_types::{encode_to_buf, AcknowledgeMessage, ErrorMessage},
    },
    RequestMessage, ResponseMessage, PROTOCOL_VERSION,
};

use crate::info::ServerInfo;
use uaserve_types::{DecodingOptions, Error, ResponseHeader, ServiceFault, StatusCode};

use futures::StreamExt;
use tokio::{
    io::{AsyncWriteExt, ReadHalf, WriteHalf},
    net::TcpStream,
    time::{Duration, Instant},
};
use tokio_util::{codec::FramedRead, sync::CancellationToken};

/// Transport level configuration derived from the server limits.
#[derive(Debug, Clone)]
pub(crate) struct TransportConfig {
    pub send_buffer_size: usize,
    pub receive_buffer_size: usize,
    pub max_message_size: usize,
    pub max_chunk_count: usize,
    pub hello_timeout: Duration,
}

/// A fully reassembled request from the client.
#[derive(Debug)]
pub(crate) struct Request {
    pub message: RequestMessage,
    pub request_id: u32,
}

/// Result of polling the transport once.
#[derive(Debug)]
pub(crate) enum TransportPollResult {
    OutgoingMessageSent,
    IncomingChunk,
    IncomingMessage(Request),
    Error(StatusCode),
    RecoverableError(StatusCode, u32, u32),
    Closed,
}

enum TransportState {
    Running,
    Closing,
}

/// The transport of one connection after the handshake.
pub(crate) struct TcpTransport {
    read: FramedRead<ReadHalf<TcpStream>, TcpCodec>,
    write: WriteHalf<TcpStream>,
    send_buffer: SendBuffer,
    state: TransportState,
    pending_chunks: Vec<MessageChunk>,
    /// Last sequence number received from the client. The client's first
    /// value is accepted as the starting point.
    last_received_sequence_number: Option<u32>,
}

fn min_zero_infinite(server: u32, client: u32) -> u32 {
    if client == 0 {
        server
    } else if server == 0 {
        client
    } else {
        client.min(server)
    }
}

/// Performs the HEL/ACK handshake on a fresh connection, producing a
/// [`TcpTransport`].
pub(crate) struct TcpConnector {
    read: FramedRead<ReadHalf<TcpStream>, TcpCodec>,
    write: WriteHalf<TcpStream>,
    deadline: Instant,
    config: TransportConfig,
    decoding_options: DecodingOptions,
}

impl TcpConnector {
    pub fn new(
        stream: TcpStream,
        config: TransportConfig,
        decoding_options: DecodingOptions,
    ) -> Self {
        let (read, write) = tokio::io::split(stream);
        let read = FramedRead::new(read, TcpCodec::new(decoding_options.clone()));
        TcpConnector {
            read,
            write,
            deadline: Instant::now() + config.hello_timeout,
            config,
            decoding_options,
        }
    }

    /// Run the handshake: wait for a hello, validate it, send the
    /// acknowledge with the negotiated limits.
    pub async fn connect(
        mut self,
        info: Arc<ServerInfo>,
        token: CancellationToken,
    ) -> Result<TcpTransport, StatusCode> {
        let err = tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => {
                ErrorMessage::new(StatusCode::BadTimeout, "Timeout waiting for HELLO")
            }
            _ = token.cancelled() => {
                ErrorMessage::new(StatusCode::BadServerHalted, "Server closed")
            }
            r = self.connect_inner(info) => {
                match r {
                    Ok(buffer) => return Ok(TcpTransport::new(self.read, self.write, buffer)),
                    Err(e) => e,
                }
            }
        };

        // Try to tell the peer why, but the socket may already be gone.
        if let Ok(buf) = encode_to_buf(&err) {
            let _ = self.write.write_all(&buf).await;
        }
        Err(err.status_code())
    }

    async fn connect_inner(&mut self, info: Arc<ServerInfo>) -> Result<SendBuffer, ErrorMessage> {
        let hello = match self.read.next().await {
            Some(Ok(Message::Hello(hello))) => Ok(hello),
            Some(Ok(bad_msg)) => Err(ErrorMessage::new(
                StatusCode::BadCommunicationError,
                &format!("Expected a hello message, got {:?} instead", bad_msg),
            )),
            Some(Err(communication_err)) => Err(ErrorMessage::new(
                StatusCode::BadCommunicationError,
                &format!(
                    "Communication error while waiting for Hello message: {}",
                    communication_err
                ),
            )),
            None => Err(ErrorMessage::new(
                StatusCode::BadCommunicationError,
                "Stream closed",
            )),
        }?;

        if !info.endpoint_exists(hello.endpoint_url.as_ref()) {
            return Err(ErrorMessage::new(
                StatusCode::BadTcpEndpointUrlInvalid,
                "HELLO endpoint url is invalid",
            ));
        }
        if !hello.is_valid_buffer_sizes() {
            return Err(ErrorMessage::new(
                StatusCode::BadCommunicationError,
                "HELLO buffer sizes are invalid",
            ));
        }
        if hello.protocol_version > PROTOCOL_VERSION {
            return Err(ErrorMessage::new(
                StatusCode::BadProtocolVersionUnsupported,
                "Client protocol version is unsupported",
            ));
        }

        let mut buffer = SendBuffer::new(
            self.config.send_buffer_size,
            self.config.max_message_size,
            self.config.max_chunk_count,
        );

        // Each direction takes the smaller of the two offered values;
        // zero means no limit on either side.
        let acknowledge = AcknowledgeMessage::new(
            PROTOCOL_VERSION,
            (self.config.receive_buffer_size as u32).min(hello.send_buffer_size),
            (self.config.send_buffer_size as u32).min(hello.receive_buffer_size),
            min_zero_infinite(
                self.decoding_options.max_message_size as u32,
                hello.max_message_size,
            ),
            min_zero_infinite(
                self.decoding_options.max_chunk_count as u32,
                hello.max_chunk_count,
            ),
        );
        buffer.revise(
            acknowledge.send_buffer_size as usize,
            acknowledge.max_message_size as usize,
            acknowledge.max_chunk_count as usize,
        );

        let buf = encode_to_buf(&acknowledge)
            .map_err(|e| ErrorMessage::new(e.into(), "Failed to encode ack"))?;
        self.write.write_all(&buf).await.map_err(|e| {
            ErrorMessage::new(
                StatusCode::BadCommunicationError,
                &format!("Failed to send ack: {e}"),
            )
        })?;

        Ok(buffer)
    }
}

impl TcpTransport {
    pub fn new(
        read: FramedRead<ReadHalf<TcpStream>, TcpCodec>,
        write: WriteHalf<TcpStream>,
        send_buffer: SendBuffer,
    ) -> Self {
        Self {
            read,
            write,
            state: TransportState::Running,
            pending_chunks: Vec::new(),
            last_received_sequence_number: None,
            send_buffer,
        }
    }

    /// Set the transport to closing; once the queued messages are flushed
    /// the connection ends.
    pub fn set_closing(&mut self) {
        self.state = TransportState::Closing;
    }

    pub fn is_closing(&self) -> bool {
        matches!(self.state, TransportState::Closing)
    }

    /// Queue a transport level error frame.
    pub fn enqueue_error(&mut self, message: ErrorMessage) {
        self.send_buffer.write_error(message);
    }

    /// Queue a service response for sending.
    pub fn enqueue_message_for_send(
        &mut self,
        channel: &mut SecureChannel,
        message: ResponseMessage,
        request_id: u32,
    ) -> Result<(), StatusCode> {
        match self.send_buffer.write(request_id, message, channel) {
            Ok(_) => Ok(()),
            Err(e) => {
                log::warn!("Failed to encode outgoing message: {e:?}");
                // When enough context is known, downgrade to a service
                // fault on the failed request instead of killing the
                // connection.
                if let Some((request_id, request_handle)) = e.full_context() {
                    self.send_buffer.write(
                        request_id,
                        ResponseMessage::ServiceFault(Box::new(ServiceFault {
                            response_header: ResponseHeader::new_service_result(
                                request_handle,
                                e.into(),
                            ),
                        })),
                        channel,
                    )?;
                    Ok(())
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Poll the transport: write queued bytes and read incoming frames.
    pub async fn poll(&mut self, channel: &mut SecureChannel) -> TransportPollResult {
        // Move the next queued chunk into the write buffer if it is free.
        if self.send_buffer.should_encode_chunks() {
            if let Err(e) = self.send_buffer.encode_next_chunk() {
                return TransportPollResult::Error(e.status());
            }
        }

        // If there is something to write, write it while also listening
        // for incoming messages. Otherwise just read.
        if self.send_buffer.can_read() {
            tokio::select! {
                r = self.send_buffer.read_into_async(&mut self.write) => {
                    if let Err(e) = r {
                        error!("write bytes task failed: {}", e);
                        return TransportPollResult::Closed;
                    }
                    TransportPollResult::OutgoingMessageSent
                }
                incoming = self.read.next() => {
                    self.handle_incoming_message(incoming, channel)
                }
            }
        } else {
            if self.is_closing() {
                return TransportPollResult::Closed;
            }
            let incoming = self.read.next().await;
            self.handle_incoming_message(incoming, channel)
        }
    }

    fn handle_incoming_message(
        &mut self,
        incoming: Option<Result<Message, std::io::Error>>,
        channel: &mut SecureChannel,
    ) -> TransportPollResult {
        let Some(incoming) = incoming else {
            return TransportPollResult::Closed;
        };
        match incoming {
            Ok(message) => match self.process_message(message, channel) {
                Ok(None) => TransportPollResult::IncomingChunk,
                Ok(Some(message)) => {
                    self.pending_chunks.clear();
                    TransportPollResult::IncomingMessage(message)
                }
                Err(e) => {
                    self.pending_chunks.clear();
                    if let Some((id, handle)) = e.full_context() {
                        TransportPollResult::RecoverableError(e.status(), id, handle)
                    } else {
                        TransportPollResult::Error(e.status())
                    }
                }
            },
            Err(err) => {
                error!("Error reading from stream {:?}", err);
                TransportPollResult::Error(StatusCode::BadConnectionClosed)
            }
        }
    }

    fn process_message(
        &mut self,
        message: Message,
        channel: &mut SecureChannel,
    ) -> Result<Option<Request>, Error> {
        match message {
            Message::Chunk(chunk) => {
                let header = chunk.message_header(&channel.decoding_options())?;

                if header.is_final == MessageIsFinalType::FinalError {
                    // The client abandoned the message.
                    self.pending_chunks.clear();
                    Ok(None)
                } else {
                    let chunk = channel.verify_and_remove_security(&chunk.data)?;

                    if self.send_buffer.max_chunk_count > 0
                        && self.pending_chunks.len() == self.send_buffer.max_chunk_count
                    {
                        return Err(Error::new(
                            StatusCode::BadTcpMessageTooLarge,
                            format!(
                                "Message has more than {} chunks, exceeding negotiated limits",
                                self.send_buffer.max_chunk_count
                            ),
                        ));
                    }
                    self.pending_chunks.push(chunk);

                    if header.is_final == MessageIsFinalType::Intermediate {
                        return Ok(None);
                    }

                    let chunk_info = self.pending_chunks[0].chunk_info(channel)?;

                    // The client's first sequence number is accepted as
                    // the starting point, afterwards they must increment.
                    let starting = self
                        .last_received_sequence_number
                        .map(|i| i + 1)
                        .unwrap_or(chunk_info.sequence_header.sequence_number);
                    self.last_received_sequence_number = Some(
                        Chunker::validate_chunks(starting, channel, &self.pending_chunks)
                            .map_err(|e| {
                                Error::new(StatusCode::BadSecurityChecksFailed, e.to_string())
                            })?,
                    );

                    let request = Chunker::decode(&self.pending_chunks, channel, None)
                        .map_err(|e| e.with_request_id(chunk_info.sequence_header.request_id))?;
                    Ok(Some(Request {
                        request_id: chunk_info.sequence_header.request_id,
                        message: request,
                    }))
                }
            }
            unexpected => Err(Error::new(
                StatusCode::BadUnexpectedError,
                format!("Received unexpected message: {:?}", unexpected),
            )),
        }
    }
}
