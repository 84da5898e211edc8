//! Test harness: spin up a server on an arbitrary port and talk to it
//! with a raw chunk level client.

use std::sync::Arc;

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::FramedRead;

use uaserve::core::comms::chunker::Chunker;
use uaserve::core::comms::secure_channel::{Role, SecureChannel};
use uaserve::core::comms::tcp_codec::{Message, TcpCodec};
use uaserve::core::comms::tcp_types::{encode_to_buf, HelloMessage};
use uaserve::core::comms::message_chunk::MessageIsFinalType;
use uaserve::core::{Message as _, RequestMessage, ResponseMessage};
use uaserve::server::{AuthManager, ServerBuilder, ServerHandle};
use uaserve::types::{
    ByteString, DecodingOptions, ExtensionObject, MessageSecurityMode, NodeId,
    OpenSecureChannelRequest, RequestHeader, SecurityTokenRequestType,
};

/// A running test server.
pub struct TestServer {
    pub handle: ServerHandle,
    pub addr: std::net::SocketAddr,
    pub endpoint_url: String,
}

/// Start a server bound to an arbitrary free port.
pub async fn start_server(authenticator: Option<Arc<dyn AuthManager>>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut builder = ServerBuilder::new().application("uaserve test", "urn:uaserve:test");
    builder.config().tcp_config.host = addr.ip().to_string();
    builder.config().tcp_config.port = addr.port();
    if let Some(authenticator) = authenticator {
        builder = builder.authenticator(authenticator);
    }
    let (server, handle) = builder.build().unwrap();
    tokio::spawn(server.run_with(listener));

    TestServer {
        handle,
        addr,
        endpoint_url: format!("opc.tcp://127.0.0.1:{}/", addr.port()),
    }
}

/// A chunk level OPC UA client: just enough protocol to exercise the
/// server end to end.
pub struct RawClient {
    read: FramedRead<ReadHalf<TcpStream>, TcpCodec>,
    write: WriteHalf<TcpStream>,
    channel: SecureChannel,
    next_request_id: u32,
    next_request_handle: u32,
    /// The authentication token issued by CreateSession.
    pub auth_token: NodeId,
    pub endpoint_url: String,
}

impl RawClient {
    /// Connect and run the HEL/ACK handshake.
    pub async fn connect(server: &TestServer) -> RawClient {
        let stream = TcpStream::connect(server.addr).await.unwrap();
        let (read, write) = tokio::io::split(stream);
        let mut client = RawClient {
            read: FramedRead::new(read, TcpCodec::new(DecodingOptions::default())),
            write,
            channel: SecureChannel::new(Role::Client, DecodingOptions::default()),
            next_request_id: 1,
            next_request_handle: 1,
            auth_token: NodeId::null(),
            endpoint_url: server.endpoint_url.clone(),
        };

        let hello = HelloMessage::new(&client.endpoint_url, 65536, 65536, 0, 0);
        client
            .write
            .write_all(&encode_to_buf(&hello).unwrap())
            .await
            .unwrap();
        match client.read.next().await {
            Some(Ok(Message::Acknowledge(ack))) => {
                assert!(ack.receive_buffer_size >= 8196);
            }
            other => panic!("Expected acknowledge, got {other:?}"),
        }
        client
    }

    /// Open the secure channel, returning the issued token values
    /// `(channel_id, token_id, revised_lifetime, server_nonce)`.
    pub async fn open_secure_channel(&mut self) -> (u32, u32, u32, ByteString) {
        let request: RequestMessage = OpenSecureChannelRequest {
            request_header: self.request_header(),
            client_protocol_version: 0,
            request_type: SecurityTokenRequestType::Issue,
            security_mode: MessageSecurityMode::None,
            client_nonce: ByteString::from(vec![1u8; 32]),
            requested_lifetime: 3_600_000,
        }
        .into();
        let response = self.send(request).await;
        let ResponseMessage::OpenSecureChannel(response) = response else {
            panic!("Expected open secure channel response, got {response:?}");
        };
        let token = &response.security_token;
        self.channel.set_secure_channel_id(token.channel_id);
        self.channel.issue_token(token.token_id);
        (
            token.channel_id,
            token.token_id,
            token.revised_lifetime,
            response.server_nonce.clone(),
        )
    }

    /// A fresh request header carrying the session auth token.
    pub fn request_header(&mut self) -> RequestHeader {
        let handle = self.next_request_handle;
        self.next_request_handle += 1;
        RequestHeader::new(self.auth_token.clone(), handle)
    }

    /// Send a request without waiting for its response. Returns the
    /// request handle for matching.
    pub async fn send_nowait(&mut self, message: RequestMessage) -> u32 {
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let handle = message.request_handle();
        let sequence_number = self.channel.next_send_sequence_number();
        let chunks = Chunker::encode(sequence_number, request_id, 0, 65536, &self.channel, &message)
            .unwrap();
        for _ in 1..chunks.len() {
            self.channel.next_send_sequence_number();
        }
        for chunk in chunks {
            self.write.write_all(&chunk.data).await.unwrap();
        }
        handle
    }

    /// Receive the next response message, reassembling chunks.
    pub async fn recv(&mut self) -> ResponseMessage {
        let mut chunks = Vec::new();
        loop {
            match self.read.next().await {
                Some(Ok(Message::Chunk(chunk))) => {
                    let header = chunk
                        .message_header(&DecodingOptions::default())
                        .unwrap();
                    chunks.push(chunk);
                    if header.is_final == MessageIsFinalType::Final {
                        break;
                    }
                }
                Some(Ok(Message::Error(e))) => {
                    panic!("Server sent transport error: {}", e.status_code());
                }
                other => panic!("Unexpected frame: {other:?}"),
            }
        }
        Chunker::decode(&chunks, &self.channel, None).unwrap()
    }

    /// Send a request and wait for its response.
    pub async fn send(&mut self, message: RequestMessage) -> ResponseMessage {
        self.send_nowait(message).await;
        self.recv().await
    }

    /// CreateSession with the given timeout, storing the auth token.
    pub async fn create_session(&mut self, timeout_ms: f64) -> NodeId {
        let request: RequestMessage = uaserve::types::CreateSessionRequest {
            request_header: self.request_header(),
            endpoint_url: self.endpoint_url.as_str().into(),
            session_name: "test".into(),
            client_nonce: ByteString::from(vec![2u8; 32]),
            requested_session_timeout: timeout_ms,
            ..Default::default()
        }
        .into();
        let response = self.send(request).await;
        let ResponseMessage::CreateSession(response) = response else {
            panic!("Expected create session response, got {response:?}");
        };
        self.auth_token = response.authentication_token.clone();
        response.session_id.clone()
    }

    /// ActivateSession with an anonymous identity.
    pub async fn activate_session(&mut self) {
        let request: RequestMessage = uaserve::types::ActivateSessionRequest {
            request_header: self.request_header(),
            user_identity_token: ExtensionObject::null(),
            ..Default::default()
        }
        .into();
        let response = self.send(request).await;
        let ResponseMessage::ActivateSession(_) = response else {
            panic!("Expected activate session response, got {response:?}");
        };
    }

    /// Read one attribute of one node.
    pub async fn read_value(&mut self, node_id: NodeId) -> uaserve::types::DataValue {
        let request: RequestMessage = uaserve::types::ReadRequest {
            request_header: self.request_header(),
            max_age: 0.0,
            timestamps_to_return: uaserve::types::TimestampsToReturn::Both,
            nodes_to_read: Some(vec![uaserve::types::ReadValueId {
                node_id,
                attribute_id: uaserve::types::AttributeId::Value as u32,
                ..Default::default()
            }]),
        }
        .into();
        match self.send(request).await {
            ResponseMessage::Read(mut response) => response.results.take().unwrap().remove(0),
            other => panic!("Expected read response, got {other:?}"),
        }
    }

    /// Read, expecting a service level fault.
    pub async fn read_expect_fault(&mut self, node_id: NodeId) -> uaserve::types::StatusCode {
        let request: RequestMessage = uaserve::types::ReadRequest {
            request_header: self.request_header(),
            max_age: 0.0,
            timestamps_to_return: uaserve::types::TimestampsToReturn::Both,
            nodes_to_read: Some(vec![uaserve::types::ReadValueId {
                node_id,
                attribute_id: uaserve::types::AttributeId::Value as u32,
                ..Default::default()
            }]),
        }
        .into();
        match self.send(request).await {
            ResponseMessage::ServiceFault(fault) => fault.response_header.service_result,
            other => panic!("Expected service fault, got {other:?}"),
        }
    }

    /// Write one value to the Value attribute of a node, returning the
    /// per-item status.
    pub async fn write_value(
        &mut self,
        node_id: NodeId,
        value: impl Into<uaserve::types::Variant>,
    ) -> uaserve::types::StatusCode {
        let request: RequestMessage = uaserve::types::WriteRequest {
            request_header: self.request_header(),
            nodes_to_write: Some(vec![uaserve::types::WriteValue {
                node_id,
                attribute_id: uaserve::types::AttributeId::Value as u32,
                index_range: Default::default(),
                value: uaserve::types::DataValue::new_now(value),
            }]),
        }
        .into();
        match self.send(request).await {
            ResponseMessage::Write(response) => response.results.unwrap()[0],
            other => panic!("Expected write response, got {other:?}"),
        }
    }
}
